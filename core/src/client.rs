//! Async facade over the SiteWhere REST API.
//!
//! # Design
//! `SiteWhereClient` owns a `Transport` and nothing else. Each method builds
//! the endpoint request, authorizes it through the caller's `Session`,
//! executes it exactly once and parses the response. The outcome is the
//! returned `Result`; there is no retry and no shared state between calls,
//! so concurrent calls are unordered with respect to each other.

use serde::Serialize;
use tracing::debug;

use crate::endpoints;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::Session;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    DeviceAlert, DeviceAssignment, DeviceLocation, DeviceMeasurement, SearchResults, Site, Zone,
};

#[derive(Debug, Clone)]
pub struct SiteWhereClient<T = ReqwestTransport> {
    transport: T,
}

impl SiteWhereClient<ReqwestTransport> {
    /// Client on a reqwest transport with the default timeout.
    pub fn new() -> Result<Self, ApiError> {
        Ok(Self::with_transport(ReqwestTransport::new()?))
    }
}

impl<T: Transport> SiteWhereClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Authorize `request` for `session` and put it on the wire once.
    pub async fn send(
        &self,
        session: &Session,
        request: HttpRequest,
    ) -> Result<HttpResponse, ApiError> {
        let request = session.authorize(request);
        debug!(method = %request.method, url = %request.path, "dispatching SiteWhere request");
        self.transport.execute(request).await
    }

    pub async fn list_sites(
        &self,
        session: &Session,
        query: &str,
    ) -> Result<SearchResults<Site>, ApiError> {
        let response = self.send(session, endpoints::build_list_sites(query)).await?;
        endpoints::parse_list_sites(response)
    }

    pub async fn get_site(&self, session: &Session, site_token: &str) -> Result<Site, ApiError> {
        let response = self
            .send(session, endpoints::build_get_site(site_token))
            .await?;
        endpoints::parse_get_site(response)
    }

    /// Assignments come back with the device and asset embedded.
    pub async fn list_assignments_for_site(
        &self,
        session: &Session,
        site_token: &str,
        query: &str,
    ) -> Result<SearchResults<DeviceAssignment>, ApiError> {
        let request = endpoints::build_list_assignments_for_site(site_token, query);
        let response = self.send(session, request).await?;
        endpoints::parse_list_assignments_for_site(response)
    }

    pub async fn list_locations_for_site(
        &self,
        session: &Session,
        site_token: &str,
        query: &str,
    ) -> Result<SearchResults<DeviceLocation>, ApiError> {
        let request = endpoints::build_list_locations_for_site(site_token, query);
        let response = self.send(session, request).await?;
        endpoints::parse_list_locations_for_site(response)
    }

    pub async fn list_measurements_for_site(
        &self,
        session: &Session,
        site_token: &str,
        query: &str,
    ) -> Result<SearchResults<DeviceMeasurement>, ApiError> {
        let request = endpoints::build_list_measurements_for_site(site_token, query);
        let response = self.send(session, request).await?;
        endpoints::parse_list_measurements_for_site(response)
    }

    pub async fn list_alerts_for_site(
        &self,
        session: &Session,
        site_token: &str,
        query: &str,
    ) -> Result<SearchResults<DeviceAlert>, ApiError> {
        let request = endpoints::build_list_alerts_for_site(site_token, query);
        let response = self.send(session, request).await?;
        endpoints::parse_list_alerts_for_site(response)
    }

    pub async fn list_zones_for_site(
        &self,
        session: &Session,
        site_token: &str,
        query: &str,
    ) -> Result<SearchResults<Zone>, ApiError> {
        let request = endpoints::build_list_zones_for_site(site_token, query);
        let response = self.send(session, request).await?;
        endpoints::parse_list_zones_for_site(response)
    }

    pub async fn create_zone<P>(
        &self,
        session: &Session,
        site_token: &str,
        payload: &P,
    ) -> Result<Zone, ApiError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let request = endpoints::build_create_zone(site_token, payload)?;
        let response = self.send(session, request).await?;
        endpoints::parse_create_zone(response)
    }

    pub async fn delete_zone(&self, session: &Session, zone_token: &str) -> Result<Zone, ApiError> {
        let response = self
            .send(session, endpoints::build_delete_zone(zone_token))
            .await?;
        endpoints::parse_delete_zone(response)
    }

    pub async fn release_assignment(
        &self,
        session: &Session,
        token: &str,
    ) -> Result<DeviceAssignment, ApiError> {
        let response = self
            .send(session, endpoints::build_release_assignment(token))
            .await?;
        endpoints::parse_release_assignment(response)
    }

    pub async fn missing_assignment(
        &self,
        session: &Session,
        token: &str,
    ) -> Result<DeviceAssignment, ApiError> {
        let response = self
            .send(session, endpoints::build_missing_assignment(token))
            .await?;
        endpoints::parse_missing_assignment(response)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::http::HttpMethod;
    use crate::session::TENANT_HEADER;
    use crate::types::ZoneCreateRequest;

    /// Records every request and answers with one canned response, or a
    /// transport failure when none is set.
    #[derive(Clone, Default)]
    struct RecordingTransport {
        requests: Arc<Mutex<Vec<HttpRequest>>>,
        reply: Option<(u16, String)>,
    }

    impl RecordingTransport {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                requests: Arc::default(),
                reply: Some((status, body.to_string())),
            }
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.lock().unwrap().push(request);
            match &self.reply {
                Some((status, body)) => Ok(HttpResponse {
                    status: *status,
                    headers: Vec::new(),
                    body: body.clone(),
                }),
                None => Err(ApiError::Transport("connection refused".to_string())),
            }
        }
    }

    fn session() -> Session {
        Session::new("http://localhost:8080/sitewhere/api")
            .with_basic_auth("admin", "password")
            .with_tenant("default")
    }

    const EMPTY_LIST: &str = r#"{"numResults":0,"results":[]}"#;

    #[tokio::test]
    async fn list_sites_issues_one_authorized_get() {
        let transport = RecordingTransport::replying(200, EMPTY_LIST);
        let client = SiteWhereClient::with_transport(transport.clone());

        let sites = client.list_sites(&session(), "page=1").await.unwrap();
        assert!(sites.results.is_empty());

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(
            requests[0].path,
            "http://localhost:8080/sitewhere/api/sites?page=1"
        );
        assert!(requests[0].header("authorization").is_some());
        assert_eq!(requests[0].header(TENANT_HEADER), Some("default"));
    }

    #[tokio::test]
    async fn create_zone_posts_payload_under_site() {
        let transport = RecordingTransport::replying(200, r#"{"token":"z1","name":"Zone A"}"#);
        let client = SiteWhereClient::with_transport(transport.clone());
        let payload = ZoneCreateRequest {
            name: "Zone A".to_string(),
            ..Default::default()
        };

        let zone = client
            .create_zone(&session(), "abc123", &payload)
            .await
            .unwrap();
        assert_eq!(zone.token, "z1");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(
            requests[0].path,
            "http://localhost:8080/sitewhere/api/sites/abc123/zones"
        );
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["name"], "Zone A");
        assert_eq!(requests[0].header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn delete_zone_is_forced() {
        let transport = RecordingTransport::replying(200, r#"{"token":"z1"}"#);
        let client = SiteWhereClient::with_transport(transport.clone());

        client.delete_zone(&session(), "z1").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].method, HttpMethod::Delete);
        assert!(requests[0].path.ends_with("/zones/z1?force=true"));
    }

    #[tokio::test]
    async fn assignment_transitions_send_no_body() {
        let transport = RecordingTransport::replying(200, r#"{"token":"a1","status":"Released"}"#);
        let client = SiteWhereClient::with_transport(transport.clone());

        client.release_assignment(&session(), "a1").await.unwrap();
        client.missing_assignment(&session(), "a1").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].path.ends_with("/assignments/a1/end"));
        assert!(requests[1].path.ends_with("/assignments/a1/missing"));
        for request in &requests {
            assert_eq!(request.method, HttpMethod::Post);
            assert!(request.body.is_none());
            assert_eq!(request.header("content-type"), None);
        }
    }

    #[tokio::test]
    async fn every_operation_calls_transport_exactly_once() {
        let transport = RecordingTransport::replying(500, "boom");
        let client = SiteWhereClient::with_transport(transport.clone());
        let s = session();

        assert!(client.list_sites(&s, "").await.is_err());
        assert!(client.get_site(&s, "s1").await.is_err());
        assert!(client.list_assignments_for_site(&s, "s1", "").await.is_err());
        assert!(client.list_locations_for_site(&s, "s1", "").await.is_err());
        assert!(client.list_measurements_for_site(&s, "s1", "").await.is_err());
        assert!(client.list_alerts_for_site(&s, "s1", "").await.is_err());
        assert!(client.list_zones_for_site(&s, "s1", "").await.is_err());
        assert!(client
            .create_zone(&s, "s1", &serde_json::json!({"name": "Z"}))
            .await
            .is_err());
        assert!(client.delete_zone(&s, "z1").await.is_err());
        assert!(client.release_assignment(&s, "a1").await.is_err());
        assert!(client.missing_assignment(&s, "a1").await.is_err());

        assert_eq!(transport.requests().len(), 11);
    }

    #[tokio::test]
    async fn transport_failure_is_forwarded_unchanged() {
        let transport = RecordingTransport::default();
        let client = SiteWhereClient::with_transport(transport.clone());

        let err = client.get_site(&session(), "s1").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(ref msg) if msg == "connection refused"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body() {
        let transport = RecordingTransport::replying(500, "internal error");
        let client = SiteWhereClient::with_transport(transport);

        let err = client
            .list_assignments_for_site(&session(), "s1", "page=1")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, ref body } if body == "internal error"));
        assert_eq!(client.transport().requests().len(), 1);
    }
}
