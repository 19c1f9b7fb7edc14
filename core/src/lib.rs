//! Client for the SiteWhere REST API (sites, assignments, zones, events).
//!
//! # Overview
//! Every remote operation is available in two forms:
//! - `endpoints::build_*` / `endpoints::parse_*`: pure functions producing
//!   an `HttpRequest` and consuming an `HttpResponse`, for hosts that do
//!   their own I/O.
//! - `SiteWhereClient` async methods, which authorize the request through an
//!   explicit `Session`, execute it once on a `Transport` and return a single
//!   `Result`.
//!
//! # Design
//! - The facade is stateless; the caller owns the `Session` and passes it
//!   into every call.
//! - Tokens and query strings are inserted into paths verbatim. Callers
//!   encode them.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod session;
pub mod transport;
pub mod types;

pub use client::SiteWhereClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::Session;
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    AlertLevel, DeviceAlert, DeviceAssignment, DeviceAssignmentStatus, DeviceLocation,
    DeviceMeasurement, EventCommon, Location, Metadata, SearchResults, Site, SiteMapData, Zone,
    ZoneCreateRequest,
};
