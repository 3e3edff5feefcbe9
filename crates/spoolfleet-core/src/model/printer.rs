// ── Printer status domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Printer job state, normalized from the raw `gcode_state` string.
///
/// The firmware reports uppercase strings (`"RUNNING"`, `"FINISH"`, ...);
/// anything unrecognized maps to [`Unknown`](Self::Unknown) rather than
/// failing the whole status conversion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[non_exhaustive]
pub enum PrinterState {
    Idle,
    Prepare,
    Slicing,
    Running,
    Pause,
    Finish,
    Failed,
    #[default]
    Unknown,
}

impl PrinterState {
    /// Parse a raw state string, mapping anything unrecognized to `Unknown`.
    pub fn parse(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Unknown)
    }

    /// Whether a print job has come to rest on the plate (successfully
    /// or not) and may need clearing.
    pub fn is_print_complete(self) -> bool {
        matches!(self, Self::Finish | Self::Failed)
    }

    pub fn is_busy(self) -> bool {
        matches!(self, Self::Prepare | Self::Slicing | Self::Running | Self::Pause)
    }
}

/// One AMS slot (or the external "virtual tray" spool holder).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmsTray {
    pub id: i64,
    /// Filament type as reported by the tray, e.g. `"PLA"`. Empty or
    /// absent when the slot is unloaded.
    pub tray_type: Option<String>,
    /// 8-char RGBA hex (`"00ff00ff"`) on most firmwares.
    pub tray_color: Option<String>,
    /// Remaining filament estimate in percent; `-1` when unknown.
    pub remain: Option<i32>,
    pub tag_uid: Option<String>,
}

impl AmsTray {
    /// A tray counts as loaded when it reports a non-empty filament type.
    pub fn is_loaded(&self) -> bool {
        self.tray_type.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// One AMS unit with its four trays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmsUnit {
    pub id: i64,
    pub humidity: Option<i32>,
    pub temp: Option<f64>,
    pub trays: Vec<AmsTray>,
}

/// Live status of a single printer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterStatus {
    pub id: i64,
    pub name: String,
    pub connected: bool,
    pub state: PrinterState,
    /// Whether the finished/failed print has been acknowledged as removed.
    pub plate_cleared: bool,
    pub current_print: Option<String>,
    /// Progress in percent, when a job is active.
    pub progress: Option<f64>,
    /// Remaining print time in minutes.
    pub remaining_time: Option<i64>,
    pub ams_units: Vec<AmsUnit>,
    /// External spool holder, fed directly without an AMS.
    pub vt_tray: Option<AmsTray>,
}

impl PrinterStatus {
    /// Iterate over every loaded tray: AMS slots first, then the
    /// external tray.
    pub fn loaded_trays(&self) -> impl Iterator<Item = &AmsTray> {
        self.ams_units
            .iter()
            .flat_map(|unit| unit.trays.iter())
            .chain(self.vt_tray.iter())
            .filter(|tray| tray.is_loaded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_parses_case_insensitively() {
        assert_eq!(PrinterState::parse("RUNNING"), PrinterState::Running);
        assert_eq!(PrinterState::parse("finish"), PrinterState::Finish);
        assert_eq!(PrinterState::parse("Failed"), PrinterState::Failed);
        assert_eq!(PrinterState::parse("GARBAGE"), PrinterState::Unknown);
        assert_eq!(PrinterState::parse(""), PrinterState::Unknown);
    }

    #[test]
    fn state_display_round_trips_uppercase() {
        assert_eq!(PrinterState::Finish.to_string(), "FINISH");
        assert_eq!(PrinterState::Idle.to_string(), "IDLE");
    }

    #[test]
    fn print_complete_covers_finish_and_failed() {
        assert!(PrinterState::Finish.is_print_complete());
        assert!(PrinterState::Failed.is_print_complete());
        assert!(!PrinterState::Running.is_print_complete());
        assert!(!PrinterState::Idle.is_print_complete());
    }

    #[test]
    fn loaded_trays_skips_empty_slots_and_includes_vt() {
        let status = PrinterStatus {
            id: 1,
            name: "X1C".into(),
            connected: true,
            state: PrinterState::Idle,
            plate_cleared: true,
            current_print: None,
            progress: None,
            remaining_time: None,
            ams_units: vec![AmsUnit {
                id: 0,
                humidity: None,
                temp: None,
                trays: vec![
                    AmsTray { id: 0, tray_type: Some("PLA".into()), ..AmsTray::default() },
                    AmsTray { id: 1, tray_type: Some(String::new()), ..AmsTray::default() },
                    AmsTray { id: 2, tray_type: None, ..AmsTray::default() },
                ],
            }],
            vt_tray: Some(AmsTray {
                id: 254,
                tray_type: Some("PETG".into()),
                ..AmsTray::default()
            }),
        };

        let types: Vec<_> = status
            .loaded_trays()
            .filter_map(|t| t.tray_type.as_deref())
            .collect();
        assert_eq!(types, vec!["PLA", "PETG"]);
    }
}
