// Wire types for the spoolfleet backend REST API.
//
// These mirror the backend's JSON payloads field-for-field and stay
// deliberately loose (lots of `Option`s, raw strings). `spoolfleet-core`
// converts them into strict domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Spool inventory ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoolDto {
    pub id: i64,
    #[serde(default)]
    pub tag_uid: Option<String>,
    pub material: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub color_name: Option<String>,
    /// RGBA hex as stored by the backend, e.g. `"ff0000ff"`.
    #[serde(default)]
    pub rgba_hex: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub label_weight_g: Option<f64>,
    #[serde(default)]
    pub core_weight_g: Option<f64>,
    #[serde(default)]
    pub weight_used_g: Option<f64>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for the spool weight update endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoolWeightUpdate {
    pub gross_weight_g: u32,
}

// ── Printer status ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmsTrayDto {
    pub id: i64,
    #[serde(default)]
    pub tray_type: Option<String>,
    /// 8-char RGBA hex (`"00ff00ff"`) on most firmwares.
    #[serde(default)]
    pub tray_color: Option<String>,
    #[serde(default)]
    pub remain: Option<i32>,
    #[serde(default)]
    pub tag_uid: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmsUnitDto {
    pub id: i64,
    #[serde(default)]
    pub humidity: Option<i32>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub tray: Vec<AmsTrayDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterStatusDto {
    pub id: i64,
    pub name: String,
    pub connected: bool,
    /// Raw gcode state string: `"IDLE"`, `"RUNNING"`, `"FINISH"`, `"FAILED"`, …
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub plate_cleared: bool,
    #[serde(default)]
    pub current_print: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub remaining_time: Option<i64>,
    #[serde(default)]
    pub temperatures: Option<serde_json::Value>,
    #[serde(default)]
    pub ams: Vec<AmsUnitDto>,
    #[serde(default)]
    pub ams_exists: bool,
    /// Virtual tray / external spool holder.
    #[serde(default)]
    pub vt_tray: Option<AmsTrayDto>,
}

// ── Print queue ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilamentOverrideDto {
    #[serde(rename = "type")]
    pub filament_type: String,
    pub color_hex: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItemDto {
    pub id: i64,
    #[serde(default)]
    pub printer_id: Option<i64>,
    #[serde(default)]
    pub required_filament_types: Vec<String>,
    #[serde(default)]
    pub filament_overrides: Option<Vec<FilamentOverrideDto>>,
    pub position: i32,
    pub status: String,
    #[serde(default)]
    pub name: Option<String>,
}

// ── Control ──────────────────────────────────────────────────────────

/// Standard response envelope for printer control endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlResponse {
    pub success: bool,
    pub message: String,
}

/// Error body the backend returns on 4xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: String,
}
