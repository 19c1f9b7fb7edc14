use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

/// Path prefix of the REST API, as deployed by SiteWhere.
pub const API_ROOT: &str = "/sitewhere/api";

pub const DEMO_SITE_TOKEN: &str = "bb105f8d-3150-41f5-b9d1-db04965668d3";
pub const DEMO_ASSIGNMENT_TOKEN: &str = "0d0e4a84-8d0b-4c2b-9f2e-1f6a6d1b7c55";
pub const DEMO_ZONE_TOKEN: &str = "ab7a3d3e-8d2c-4b7c-b1f5-3f6c5d2a9e10";

type Metadata = BTreeMap<String, String>;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub token: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub metadata: Metadata,
    pub created_date: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    Active,
    Missing,
    Released,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub token: String,
    pub device_hardware_id: String,
    pub assignment_type: String,
    pub asset_module_id: Option<String>,
    pub asset_id: Option<String>,
    pub status: AssignmentStatus,
    pub site_token: String,
    pub active_date: Option<String>,
    pub released_date: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_asset: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub token: String,
    pub site_token: String,
    pub name: String,
    pub coordinates: Vec<Coordinate>,
    pub border_color: String,
    pub fill_color: String,
    pub opacity: f64,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_date: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateZone {
    pub name: String,
    #[serde(default)]
    pub coordinates: Vec<Coordinate>,
    pub border_color: Option<String>,
    pub fill_color: Option<String>,
    pub opacity: Option<f64>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Site-scoped device event. The payload fields differ per event type, so
/// they are kept as JSON and merged into the common fields on the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub event_type: String,
    pub site_token: String,
    pub device_assignment_token: String,
    pub event_date: Option<String>,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults<T> {
    pub num_results: usize,
    pub results: Vec<T>,
}

#[derive(Default)]
pub struct Store {
    pub sites: BTreeMap<String, Site>,
    pub assignments: BTreeMap<String, Assignment>,
    pub zones: BTreeMap<String, Zone>,
    pub events: Vec<Event>,
}

impl Store {
    /// A store holding one construction site with an active assignment, a
    /// border zone and a handful of events.
    pub fn demo() -> Self {
        let mut store = Store::default();
        let created = Some("2017-01-01T00:00:00.000Z".to_string());

        store.sites.insert(
            DEMO_SITE_TOKEN.to_string(),
            Site {
                token: DEMO_SITE_TOKEN.to_string(),
                name: "Construction Site".to_string(),
                description: "A construction site with many high-value assets.".to_string(),
                image_url: "https://s3.amazonaws.com/sitewhere-demo/construction/construction.jpg"
                    .to_string(),
                metadata: Metadata::new(),
                created_date: created.clone(),
            },
        );
        store.assignments.insert(
            DEMO_ASSIGNMENT_TOKEN.to_string(),
            Assignment {
                token: DEMO_ASSIGNMENT_TOKEN.to_string(),
                device_hardware_id: "d3fb1b3d-7d5c-4b0e-8a4d-1c1b6d1e2f30".to_string(),
                assignment_type: "Hardware".to_string(),
                asset_module_id: Some("fs-hardware".to_string()),
                asset_id: Some("300".to_string()),
                status: AssignmentStatus::Active,
                site_token: DEMO_SITE_TOKEN.to_string(),
                active_date: created.clone(),
                released_date: None,
                metadata: Metadata::new(),
                device: None,
                associated_asset: None,
            },
        );
        store.zones.insert(
            DEMO_ZONE_TOKEN.to_string(),
            Zone {
                token: DEMO_ZONE_TOKEN.to_string(),
                site_token: DEMO_SITE_TOKEN.to_string(),
                name: "Construction Site Border".to_string(),
                coordinates: vec![
                    Coordinate { latitude: 34.10260, longitude: -84.24492, elevation: None },
                    Coordinate { latitude: 34.10384, longitude: -84.24277, elevation: None },
                    Coordinate { latitude: 34.10174, longitude: -84.24053, elevation: None },
                ],
                border_color: "#017112".to_string(),
                fill_color: "#1db32e".to_string(),
                opacity: 0.4,
                metadata: Metadata::new(),
                created_date: created,
            },
        );

        let event = |id: &str, event_type: &str, payload: serde_json::Value| Event {
            id: id.to_string(),
            event_type: event_type.to_string(),
            site_token: DEMO_SITE_TOKEN.to_string(),
            device_assignment_token: DEMO_ASSIGNMENT_TOKEN.to_string(),
            event_date: Some("2017-01-01T00:05:00.000Z".to_string()),
            payload: payload.as_object().cloned().unwrap_or_default(),
        };
        store.events = vec![
            event("loc-1", "Location", json!({"latitude": 34.1025, "longitude": -84.2433, "elevation": 0.0})),
            event("loc-2", "Location", json!({"latitude": 34.1031, "longitude": -84.2427, "elevation": 0.0})),
            event("mx-1", "Measurement", json!({"name": "fuel.level", "value": 0.75})),
            event("mx-2", "Measurement", json!({"name": "engine.temperature", "value": 88.5})),
            event(
                "alert-1",
                "Alert",
                json!({"source": "Device", "level": "Warning", "type": "fuel.low", "message": "Fuel level is low."}),
            ),
        ];
        store
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    #[serde(default)]
    pub include_device: bool,
    #[serde(default)]
    pub include_asset: bool,
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub force: bool,
}

/// Router seeded with `Store::demo()`.
pub fn app() -> Router {
    app_with_store(Store::demo())
}

pub fn app_with_store(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    let api = Router::new()
        .route("/sites", get(list_sites))
        .route("/sites/{token}", get(get_site))
        .route("/sites/{token}/assignments", get(list_assignments))
        .route("/sites/{token}/locations", get(list_locations))
        .route("/sites/{token}/measurements", get(list_measurements))
        .route("/sites/{token}/alerts", get(list_alerts))
        .route("/sites/{token}/zones", get(list_zones).post(create_zone))
        .route("/zones/{token}", delete(delete_zone))
        .route("/assignments/{token}/end", post(end_assignment))
        .route("/assignments/{token}/missing", post(missing_assignment))
        .route_layer(middleware::from_fn(require_auth))
        .with_state(db);
    Router::new().nest(API_ROOT, api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_auth(request: Request, next: Next) -> Result<Response, StatusCode> {
    if request.headers().contains_key(header::AUTHORIZATION) {
        Ok(next.run(request).await)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// 1-based paging; a page size of zero returns everything.
fn paginate<T>(items: Vec<T>, page: Option<usize>, page_size: Option<usize>) -> SearchResults<T> {
    let num_results = items.len();
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(100);
    let results = if page_size == 0 {
        items
    } else {
        items
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect()
    };
    SearchResults {
        num_results,
        results,
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

async fn list_sites(
    State(db): State<Db>,
    Query(paging): Query<Paging>,
) -> Json<SearchResults<Site>> {
    let store = db.read().await;
    let sites = store.sites.values().cloned().collect();
    Json(paginate(sites, paging.page, paging.page_size))
}

async fn get_site(
    State(db): State<Db>,
    Path(token): Path<String>,
) -> Result<Json<Site>, StatusCode> {
    let store = db.read().await;
    store.sites.get(&token).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn list_assignments(
    State(db): State<Db>,
    Path(token): Path<String>,
    Query(query): Query<AssignmentQuery>,
) -> Result<Json<SearchResults<Assignment>>, StatusCode> {
    let store = db.read().await;
    if !store.sites.contains_key(&token) {
        return Err(StatusCode::NOT_FOUND);
    }
    let assignments = store
        .assignments
        .values()
        .filter(|a| a.site_token == token)
        .cloned()
        .map(|mut a| {
            if query.include_device {
                a.device = Some(json!({
                    "hardwareId": a.device_hardware_id,
                    "specificationToken": "7dfd6d63-5e8d-4380-be04-fc5c73801dfb",
                }));
            }
            if query.include_asset {
                a.associated_asset = a.asset_id.as_ref().map(|id| json!({"id": id, "name": "Caterpillar 320E"}));
            }
            a
        })
        .collect();
    Ok(Json(paginate(assignments, query.page, query.page_size)))
}

async fn list_events(
    db: &Db,
    site_token: &str,
    event_type: &str,
    paging: Paging,
) -> Result<Json<SearchResults<Event>>, StatusCode> {
    let store = db.read().await;
    if !store.sites.contains_key(site_token) {
        return Err(StatusCode::NOT_FOUND);
    }
    let events = store
        .events
        .iter()
        .filter(|e| e.site_token == site_token && e.event_type == event_type)
        .cloned()
        .collect();
    Ok(Json(paginate(events, paging.page, paging.page_size)))
}

async fn list_locations(
    State(db): State<Db>,
    Path(token): Path<String>,
    Query(paging): Query<Paging>,
) -> Result<Json<SearchResults<Event>>, StatusCode> {
    list_events(&db, &token, "Location", paging).await
}

async fn list_measurements(
    State(db): State<Db>,
    Path(token): Path<String>,
    Query(paging): Query<Paging>,
) -> Result<Json<SearchResults<Event>>, StatusCode> {
    list_events(&db, &token, "Measurement", paging).await
}

async fn list_alerts(
    State(db): State<Db>,
    Path(token): Path<String>,
    Query(paging): Query<Paging>,
) -> Result<Json<SearchResults<Event>>, StatusCode> {
    list_events(&db, &token, "Alert", paging).await
}

async fn list_zones(
    State(db): State<Db>,
    Path(token): Path<String>,
    Query(paging): Query<Paging>,
) -> Result<Json<SearchResults<Zone>>, StatusCode> {
    let store = db.read().await;
    if !store.sites.contains_key(&token) {
        return Err(StatusCode::NOT_FOUND);
    }
    let zones = store
        .zones
        .values()
        .filter(|z| z.site_token == token)
        .cloned()
        .collect();
    Ok(Json(paginate(zones, paging.page, paging.page_size)))
}

async fn create_zone(
    State(db): State<Db>,
    Path(token): Path<String>,
    Json(input): Json<CreateZone>,
) -> Result<(StatusCode, Json<Zone>), StatusCode> {
    let mut store = db.write().await;
    if !store.sites.contains_key(&token) {
        return Err(StatusCode::NOT_FOUND);
    }
    let zone = Zone {
        token: Uuid::new_v4().to_string(),
        site_token: token,
        name: input.name,
        coordinates: input.coordinates,
        border_color: input.border_color.unwrap_or_else(|| "#000000".to_string()),
        fill_color: input.fill_color.unwrap_or_else(|| "#dddddd".to_string()),
        opacity: input.opacity.unwrap_or(0.5),
        metadata: input.metadata,
        created_date: Some(now()),
    };
    info!(zone = %zone.token, site = %zone.site_token, "created zone");
    store.zones.insert(zone.token.clone(), zone.clone());
    Ok((StatusCode::CREATED, Json(zone)))
}

async fn delete_zone(
    State(db): State<Db>,
    Path(token): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Zone>, StatusCode> {
    if !query.force {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut store = db.write().await;
    let zone = store.zones.remove(&token).ok_or(StatusCode::NOT_FOUND)?;
    info!(zone = %zone.token, "deleted zone");
    Ok(Json(zone))
}

async fn transition_assignment(
    db: &Db,
    token: &str,
    status: AssignmentStatus,
) -> Result<Json<Assignment>, StatusCode> {
    let mut store = db.write().await;
    let assignment = store
        .assignments
        .get_mut(token)
        .ok_or(StatusCode::NOT_FOUND)?;
    if assignment.status == AssignmentStatus::Released {
        return Err(StatusCode::BAD_REQUEST);
    }
    assignment.status = status;
    if status == AssignmentStatus::Released {
        assignment.released_date = Some(now());
    }
    info!(assignment = %token, status = ?status, "updated assignment status");
    Ok(Json(assignment.clone()))
}

async fn end_assignment(
    State(db): State<Db>,
    Path(token): Path<String>,
) -> Result<Json<Assignment>, StatusCode> {
    transition_assignment(&db, &token, AssignmentStatus::Released).await
}

async fn missing_assignment(
    State(db): State<Db>,
    Path(token): Path<String>,
) -> Result<Json<Assignment>, StatusCode> {
    transition_assignment(&db, &token, AssignmentStatus::Missing).await
}
