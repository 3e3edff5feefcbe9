// ── Queue feasibility filter ──
//
// Decides which pending queue items a printer can start with the
// filament it currently has loaded. Type checks are case-insensitive;
// color checks only apply when both sides actually carry color data.

use std::collections::HashSet;
use std::sync::Arc;

use crate::model::{PrinterStatus, QueueItem};

/// Normalize a color hex string for comparison.
///
/// Strips a leading `#`, lowercases, and forces exactly 6 chars: AMS
/// colors arrive as 8-char RGBA (alpha truncated away), user-entered
/// short values are right-padded with `0`.
pub fn normalize_hex(raw: &str) -> String {
    let mut hex: String = raw
        .trim()
        .trim_start_matches('#')
        .to_ascii_lowercase();
    hex.truncate(6);
    while hex.len() < 6 {
        hex.push('0');
    }
    hex
}

/// What a printer currently has loaded, in comparable form.
///
/// `types` holds uppercased filament types; `type_color_pairs` holds
/// `"TYPE:rrggbb"` strings for trays that reported a color.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedFilamentSet {
    pub types: HashSet<String>,
    pub type_color_pairs: HashSet<String>,
}

impl LoadedFilamentSet {
    /// Derive the loaded set from a printer's AMS units and external tray.
    pub fn from_printer(status: &PrinterStatus) -> Self {
        let mut set = Self::default();
        for tray in status.loaded_trays() {
            let Some(tray_type) = tray.tray_type.as_deref() else {
                continue;
            };
            let upper = tray_type.to_ascii_uppercase();
            if let Some(color) = tray.tray_color.as_deref().filter(|c| !c.is_empty()) {
                set.type_color_pairs
                    .insert(format!("{upper}:{}", normalize_hex(color)));
            }
            set.types.insert(upper);
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Whether the printer reported any per-tray color information.
    pub fn has_color_data(&self) -> bool {
        !self.type_color_pairs.is_empty()
    }

    fn has_type(&self, filament_type: &str) -> bool {
        self.types.contains(&filament_type.to_ascii_uppercase())
    }

    fn has_pair(&self, filament_type: &str, color_hex: &str) -> bool {
        let key = format!(
            "{}:{}",
            filament_type.to_ascii_uppercase(),
            normalize_hex(color_hex)
        );
        self.type_color_pairs.contains(&key)
    }
}

/// Whether one queue item can start with the loaded filament.
pub fn is_feasible(item: &QueueItem, loaded: &LoadedFilamentSet) -> bool {
    // Every required type must be loaded; no requirements means any
    // filament will do.
    if !item
        .required_filament_types
        .iter()
        .all(|t| loaded.has_type(t))
    {
        return false;
    }

    // Color overrides only constrain when the printer can answer the
    // question: without tray color data the type check has to suffice.
    if item.filament_overrides.is_empty() || !loaded.has_color_data() {
        return true;
    }

    item.filament_overrides
        .iter()
        .any(|ov| loaded.has_pair(&ov.filament_type, &ov.color_hex))
}

/// Filter a queue down to the pending items the printer can start,
/// preserving the incoming (position) order.
pub fn feasible_queue(
    items: &[Arc<QueueItem>],
    loaded: &LoadedFilamentSet,
) -> Vec<Arc<QueueItem>> {
    items
        .iter()
        .filter(|item| item.is_pending() && is_feasible(item, loaded))
        .map(Arc::clone)
        .collect()
}

/// The "next job" summary shown on dashboards: the first feasible
/// pending item plus a "+N more" overflow count.
#[derive(Debug, Clone)]
pub struct NextUp {
    pub item: Arc<QueueItem>,
    pub more: usize,
}

pub fn next_up(feasible: &[Arc<QueueItem>]) -> Option<NextUp> {
    let (first, rest) = feasible.split_first()?;
    Some(NextUp {
        item: Arc::clone(first),
        more: rest.len(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{AmsTray, AmsUnit, PrinterState};

    #[test]
    fn normalize_hex_forms() {
        assert_eq!(normalize_hex("#1E7A3C"), "1e7a3c");
        assert_eq!(normalize_hex("1e7a3cff"), "1e7a3c"); // RGBA truncated
        assert_eq!(normalize_hex("abc"), "abc000"); // short padded
        assert_eq!(normalize_hex("#FFF"), "fff000");
        assert_eq!(normalize_hex(""), "000000");
    }

    fn printer_with(trays: Vec<AmsTray>, vt: Option<AmsTray>) -> PrinterStatus {
        PrinterStatus {
            id: 1,
            name: "X1C".into(),
            connected: true,
            state: PrinterState::Idle,
            plate_cleared: true,
            current_print: None,
            progress: None,
            remaining_time: None,
            ams_units: vec![AmsUnit { id: 0, humidity: None, temp: None, trays }],
            vt_tray: vt,
        }
    }

    fn tray(id: i64, tray_type: &str, color: Option<&str>) -> AmsTray {
        AmsTray {
            id,
            tray_type: Some(tray_type.into()),
            tray_color: color.map(Into::into),
            remain: None,
            tag_uid: None,
        }
    }

    #[test]
    fn loaded_set_uppercases_and_pairs() {
        let status = printer_with(
            vec![tray(0, "pla", Some("1E7A3CFF")), tray(1, "PETG", None)],
            Some(tray(254, "abs", Some("#000000"))),
        );
        let loaded = LoadedFilamentSet::from_printer(&status);

        assert!(loaded.types.contains("PLA"));
        assert!(loaded.types.contains("PETG"));
        assert!(loaded.types.contains("ABS"));
        assert!(loaded.type_color_pairs.contains("PLA:1e7a3c"));
        assert!(loaded.type_color_pairs.contains("ABS:000000"));
        assert!(loaded.has_color_data());
        // PETG tray had no color, so no pair for it
        assert_eq!(loaded.type_color_pairs.len(), 2);
    }
}
