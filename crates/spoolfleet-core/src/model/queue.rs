// ── Print queue domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle state of a queue item. The backend stores these lowercase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[non_exhaustive]
pub enum QueueStatus {
    Pending,
    Printing,
    Done,
    Failed,
    Canceled,
    #[default]
    Unknown,
}

impl QueueStatus {
    pub fn parse(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Unknown)
    }
}

/// A per-item filament requirement override: exact type + color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilamentOverride {
    pub filament_type: String,
    /// Color hex as entered by the user; may carry a leading `#`,
    /// mixed case, or a non-6 length. Normalized at matching time.
    pub color_hex: String,
}

/// One queued print job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: i64,
    pub printer_id: Option<i64>,
    pub name: Option<String>,
    /// Filament types the sliced job calls for (one per plate tool).
    pub required_filament_types: Vec<String>,
    /// Exact type+color requirements, when the user pinned them.
    pub filament_overrides: Vec<FilamentOverride>,
    pub position: i32,
    pub status: QueueStatus,
}

impl QueueItem {
    pub fn is_pending(&self) -> bool {
        self.status == QueueStatus::Pending
    }
}
