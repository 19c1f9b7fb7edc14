//! Pure request builders and response parsers for each SiteWhere endpoint.
//!
//! # Design
//! Each remote operation is a `build_*` function producing a relative
//! `HttpRequest` and a `parse_*` function consuming an `HttpResponse`.
//! Neither touches the network or the session. Tokens and query strings are
//! inserted verbatim; the caller is responsible for encoding them.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    DeviceAlert, DeviceAssignment, DeviceLocation, DeviceMeasurement, SearchResults, Site, Zone,
};

/// Flags always appended when listing assignments so the server embeds the
/// device and asset.
pub const ASSIGNMENT_INCLUDES: &str = "&includeDevice=true&includeAsset=true";

fn get(path: String) -> HttpRequest {
    HttpRequest::new(HttpMethod::Get, path)
}

pub fn build_list_sites(query: &str) -> HttpRequest {
    get(format!("sites?{query}"))
}

pub fn build_get_site(site_token: &str) -> HttpRequest {
    get(format!("sites/{site_token}"))
}

pub fn build_list_assignments_for_site(site_token: &str, query: &str) -> HttpRequest {
    get(format!(
        "sites/{site_token}/assignments?{query}{ASSIGNMENT_INCLUDES}"
    ))
}

pub fn build_list_locations_for_site(site_token: &str, query: &str) -> HttpRequest {
    get(format!("sites/{site_token}/locations?{query}"))
}

pub fn build_list_measurements_for_site(site_token: &str, query: &str) -> HttpRequest {
    get(format!("sites/{site_token}/measurements?{query}"))
}

pub fn build_list_alerts_for_site(site_token: &str, query: &str) -> HttpRequest {
    get(format!("sites/{site_token}/alerts?{query}"))
}

pub fn build_list_zones_for_site(site_token: &str, query: &str) -> HttpRequest {
    get(format!("sites/{site_token}/zones?{query}"))
}

/// The payload is serialized as given; any `Serialize` value works, from a
/// `ZoneCreateRequest` to a raw `serde_json::Value`.
pub fn build_create_zone<P>(site_token: &str, payload: &P) -> Result<HttpRequest, ApiError>
where
    P: Serialize + ?Sized,
{
    let body =
        serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;
    let mut request = HttpRequest::new(HttpMethod::Post, format!("/sites/{site_token}/zones"));
    request.body = Some(body);
    Ok(request)
}

/// Deletion through this route is always forced.
pub fn build_delete_zone(zone_token: &str) -> HttpRequest {
    HttpRequest::new(HttpMethod::Delete, format!("zones/{zone_token}?force=true"))
}

pub fn build_release_assignment(token: &str) -> HttpRequest {
    HttpRequest::new(HttpMethod::Post, format!("/assignments/{token}/end"))
}

pub fn build_missing_assignment(token: &str) -> HttpRequest {
    HttpRequest::new(HttpMethod::Post, format!("/assignments/{token}/missing"))
}

pub fn parse_list_sites(response: HttpResponse) -> Result<SearchResults<Site>, ApiError> {
    parse_json(response)
}

pub fn parse_get_site(response: HttpResponse) -> Result<Site, ApiError> {
    parse_json(response)
}

pub fn parse_list_assignments_for_site(
    response: HttpResponse,
) -> Result<SearchResults<DeviceAssignment>, ApiError> {
    parse_json(response)
}

pub fn parse_list_locations_for_site(
    response: HttpResponse,
) -> Result<SearchResults<DeviceLocation>, ApiError> {
    parse_json(response)
}

pub fn parse_list_measurements_for_site(
    response: HttpResponse,
) -> Result<SearchResults<DeviceMeasurement>, ApiError> {
    parse_json(response)
}

pub fn parse_list_alerts_for_site(
    response: HttpResponse,
) -> Result<SearchResults<DeviceAlert>, ApiError> {
    parse_json(response)
}

pub fn parse_list_zones_for_site(response: HttpResponse) -> Result<SearchResults<Zone>, ApiError> {
    parse_json(response)
}

pub fn parse_create_zone(response: HttpResponse) -> Result<Zone, ApiError> {
    parse_json(response)
}

pub fn parse_delete_zone(response: HttpResponse) -> Result<Zone, ApiError> {
    parse_json(response)
}

pub fn parse_release_assignment(response: HttpResponse) -> Result<DeviceAssignment, ApiError> {
    parse_json(response)
}

pub fn parse_missing_assignment(response: HttpResponse) -> Result<DeviceAssignment, ApiError> {
    parse_json(response)
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    debug!(status = response.status, "SiteWhere request failed");
    match response.status {
        404 => Err(ApiError::NotFound),
        401 | 403 => Err(ApiError::Unauthorized {
            status: response.status,
        }),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceAssignmentStatus, ZoneCreateRequest};

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn list_sites_appends_query_verbatim() {
        let req = build_list_sites("page=1");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "sites?page=1");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn list_sites_keeps_separator_for_empty_query() {
        assert_eq!(build_list_sites("").path, "sites?");
    }

    #[test]
    fn get_site_has_no_query_suffix() {
        for token in ["abc123", "bb105f8d-3150-41f5-b9d1-db04965668d3", "x"] {
            let req = build_get_site(token);
            assert_eq!(req.method, HttpMethod::Get);
            assert_eq!(req.path, format!("sites/{token}"));
            assert!(!req.path.contains('?'));
        }
    }

    #[test]
    fn assignments_always_include_device_and_asset() {
        for query in ["", "page=2&pageSize=10", "includeDevice=false"] {
            let req = build_list_assignments_for_site("s1", query);
            assert_eq!(
                req.path,
                format!("sites/s1/assignments?{query}&includeDevice=true&includeAsset=true")
            );
        }
    }

    #[test]
    fn site_event_lists_use_their_collection() {
        assert_eq!(
            build_list_locations_for_site("s1", "page=1").path,
            "sites/s1/locations?page=1"
        );
        assert_eq!(
            build_list_measurements_for_site("s1", "page=1").path,
            "sites/s1/measurements?page=1"
        );
        assert_eq!(
            build_list_alerts_for_site("s1", "page=1").path,
            "sites/s1/alerts?page=1"
        );
        assert_eq!(
            build_list_zones_for_site("s1", "page=1").path,
            "sites/s1/zones?page=1"
        );
    }

    #[test]
    fn tokens_are_not_escaped() {
        assert_eq!(build_get_site("a b/c").path, "sites/a b/c");
    }

    #[test]
    fn create_zone_posts_payload() {
        let payload = ZoneCreateRequest {
            name: "Zone A".to_string(),
            ..Default::default()
        };
        let req = build_create_zone("abc123", &payload).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "/sites/abc123/zones");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "Zone A");
    }

    #[test]
    fn create_zone_accepts_raw_json() {
        let payload = serde_json::json!({"name": "Zone A"});
        let req = build_create_zone("abc123", &payload).unwrap();
        assert_eq!(req.body.as_deref(), Some(r#"{"name":"Zone A"}"#));
    }

    #[test]
    fn delete_zone_is_always_forced() {
        let req = build_delete_zone("z1");
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "zones/z1?force=true");
        assert!(req.body.is_none());
    }

    #[test]
    fn assignment_transitions_post_without_body() {
        let end = build_release_assignment("a1");
        assert_eq!(end.method, HttpMethod::Post);
        assert_eq!(end.path, "/assignments/a1/end");
        assert!(end.body.is_none());

        let missing = build_missing_assignment("a1");
        assert_eq!(missing.method, HttpMethod::Post);
        assert_eq!(missing.path, "/assignments/a1/missing");
        assert!(missing.body.is_none());
    }

    #[test]
    fn parse_list_sites_success() {
        let sites = parse_list_sites(response(
            200,
            r#"{"numResults":1,"results":[{"token":"s1","name":"HQ"}]}"#,
        ))
        .unwrap();
        assert_eq!(sites.num_results, 1);
        assert_eq!(sites.results[0].name, "HQ");
    }

    #[test]
    fn parse_release_assignment_success() {
        let a = parse_release_assignment(response(
            200,
            r#"{"token":"a1","status":"Released","releasedDate":"2017-01-01T00:00:00.000Z"}"#,
        ))
        .unwrap();
        assert_eq!(a.status, DeviceAssignmentStatus::Released);
        assert!(a.released_date.is_some());
    }

    #[test]
    fn parse_accepts_any_2xx() {
        let zone = parse_create_zone(response(201, r#"{"token":"z1","name":"Zone A"}"#)).unwrap();
        assert_eq!(zone.token, "z1");
    }

    #[test]
    fn parse_get_site_not_found() {
        let err = parse_get_site(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_maps_auth_failures() {
        let err = parse_list_sites(response(401, "")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { status: 401 }));
        let err = parse_delete_zone(response(403, "")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { status: 403 }));
    }

    #[test]
    fn parse_keeps_body_of_other_failures() {
        let err = parse_missing_assignment(response(500, "internal error")).unwrap_err();
        match err {
            ApiError::HttpError { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "internal error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_bad_json() {
        let err = parse_list_zones_for_site(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }
}
