//! Wire DTOs for the SiteWhere REST API.
//!
//! # Design
//! Field names follow the server's camelCase JSON. Every struct defaults
//! missing fields and ignores unknown ones, so a newer server adding fields
//! does not break parsing. Timestamps stay as the server's strings.
//! The mock-server crate defines its own copies; integration tests catch
//! drift between the two.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type Metadata = BTreeMap<String, String>;

/// Envelope returned by every list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults<T> {
    #[serde(default)]
    pub num_results: u64,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Default for SearchResults<T> {
    fn default() -> Self {
        Self {
            num_results: 0,
            results: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteMapData {
    #[serde(rename = "type")]
    pub map_type: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Site {
    pub token: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub map: SiteMapData,
    pub metadata: Metadata,
    pub created_date: Option<String>,
    pub updated_date: Option<String>,
}

/// Lifecycle of a device assignment: active until released or reported
/// missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceAssignmentStatus {
    #[default]
    Active,
    Missing,
    Released,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceAssignment {
    pub token: String,
    pub device_hardware_id: String,
    pub assignment_type: String,
    pub asset_module_id: Option<String>,
    pub asset_id: Option<String>,
    pub status: DeviceAssignmentStatus,
    pub site_token: String,
    pub active_date: Option<String>,
    pub released_date: Option<String>,
    pub metadata: Metadata,
    /// Present when the request carried `includeDevice=true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<serde_json::Value>,
    /// Present when the request carried `includeAsset=true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_asset: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Zone {
    pub token: String,
    pub site_token: String,
    pub name: String,
    pub coordinates: Vec<Location>,
    pub border_color: String,
    pub fill_color: String,
    pub opacity: f64,
    pub metadata: Metadata,
    pub created_date: Option<String>,
}

/// Payload for `create_zone`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneCreateRequest {
    pub name: String,
    #[serde(default)]
    pub coordinates: Vec<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

/// Fields shared by every device event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventCommon {
    pub id: String,
    pub event_type: String,
    pub site_token: String,
    pub device_assignment_token: String,
    pub assignment_type: String,
    pub asset_module_id: Option<String>,
    pub asset_id: Option<String>,
    pub event_date: Option<String>,
    pub received_date: Option<String>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLocation {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub elevation: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMeasurement {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertLevel {
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAlert {
    #[serde(flatten)]
    pub common: EventCommon,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub level: AlertLevel,
    #[serde(default, rename = "type")]
    pub alert_type: String,
    #[serde(default)]
    pub message: String,
}
