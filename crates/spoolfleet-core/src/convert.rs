// ── API-to-domain type conversions ──
//
// Bridges raw `spoolfleet_api` wire types into canonical
// `spoolfleet_core::model` domain types. Each `From` impl parses loose
// strings into strong types and fills sensible defaults for missing
// optional data; a malformed field never fails the whole conversion.

use spoolfleet_api::types::{
    AmsTrayDto, AmsUnitDto, FilamentOverrideDto, PrinterStatusDto, QueueItemDto, SpoolDto,
};

use crate::model::{
    printer::{AmsTray, AmsUnit, PrinterState, PrinterStatus},
    queue::{FilamentOverride, QueueItem, QueueStatus},
    spool::Spool,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Treat `""` the same as absent. The backend stores cleared text
/// fields both ways depending on which client wrote them.
fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.is_empty())
}

// ── Spool ──────────────────────────────────────────────────────────

impl From<SpoolDto> for Spool {
    fn from(dto: SpoolDto) -> Self {
        Spool {
            id: dto.id,
            tag_uid: non_empty(dto.tag_uid),
            material: dto.material,
            subtype: non_empty(dto.subtype),
            color_name: non_empty(dto.color_name),
            rgba_hex: non_empty(dto.rgba_hex),
            brand: non_empty(dto.brand),
            label_weight_g: dto.label_weight_g,
            core_weight_g: dto.core_weight_g,
            weight_used_g: dto.weight_used_g,
            archived: dto.archived,
            updated_at: dto.updated_at,
        }
    }
}

// ── Printer status ─────────────────────────────────────────────────

impl From<AmsTrayDto> for AmsTray {
    fn from(dto: AmsTrayDto) -> Self {
        AmsTray {
            id: dto.id,
            tray_type: dto.tray_type,
            tray_color: non_empty(dto.tray_color),
            remain: dto.remain,
            tag_uid: non_empty(dto.tag_uid),
        }
    }
}

impl From<AmsUnitDto> for AmsUnit {
    fn from(dto: AmsUnitDto) -> Self {
        AmsUnit {
            id: dto.id,
            humidity: dto.humidity,
            temp: dto.temp,
            trays: dto.tray.into_iter().map(AmsTray::from).collect(),
        }
    }
}

impl From<PrinterStatusDto> for PrinterStatus {
    fn from(dto: PrinterStatusDto) -> Self {
        let state = dto
            .state
            .as_deref()
            .map_or(PrinterState::Unknown, PrinterState::parse);

        PrinterStatus {
            id: dto.id,
            name: dto.name,
            connected: dto.connected,
            state,
            plate_cleared: dto.plate_cleared,
            current_print: non_empty(dto.current_print),
            progress: dto.progress,
            remaining_time: dto.remaining_time,
            ams_units: dto.ams.into_iter().map(AmsUnit::from).collect(),
            vt_tray: dto.vt_tray.map(AmsTray::from),
        }
    }
}

// ── Queue ──────────────────────────────────────────────────────────

impl From<FilamentOverrideDto> for FilamentOverride {
    fn from(dto: FilamentOverrideDto) -> Self {
        FilamentOverride {
            filament_type: dto.filament_type,
            color_hex: dto.color_hex,
        }
    }
}

impl From<QueueItemDto> for QueueItem {
    fn from(dto: QueueItemDto) -> Self {
        QueueItem {
            id: dto.id,
            printer_id: dto.printer_id,
            name: non_empty(dto.name),
            required_filament_types: dto.required_filament_types,
            filament_overrides: dto
                .filament_overrides
                .unwrap_or_default()
                .into_iter()
                .map(FilamentOverride::from)
                .collect(),
            position: dto.position,
            status: QueueStatus::parse(&dto.status),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn spool_conversion_normalizes_empty_strings() {
        let dto = SpoolDto {
            id: 5,
            tag_uid: Some(String::new()),
            material: "PLA".into(),
            subtype: None,
            color_name: Some("Black".into()),
            rgba_hex: Some(String::new()),
            brand: None,
            label_weight_g: Some(1000.0),
            core_weight_g: None,
            weight_used_g: None,
            archived: false,
            updated_at: None,
        };

        let spool = Spool::from(dto);
        assert!(spool.tag_uid.is_none());
        assert!(spool.rgba_hex.is_none());
        assert_eq!(spool.color_name.as_deref(), Some("Black"));
    }

    #[test]
    fn printer_status_parses_state_leniently() {
        let dto = PrinterStatusDto {
            id: 1,
            name: "A1".into(),
            connected: true,
            state: Some("running".into()),
            plate_cleared: false,
            current_print: None,
            progress: None,
            remaining_time: None,
            temperatures: None,
            ams: vec![],
            ams_exists: false,
            vt_tray: None,
        };
        assert_eq!(PrinterStatus::from(dto).state, PrinterState::Running);

        let dto = PrinterStatusDto {
            id: 1,
            name: "A1".into(),
            connected: false,
            state: None,
            plate_cleared: false,
            current_print: None,
            progress: None,
            remaining_time: None,
            temperatures: None,
            ams: vec![],
            ams_exists: false,
            vt_tray: None,
        };
        assert_eq!(PrinterStatus::from(dto).state, PrinterState::Unknown);
    }

    #[test]
    fn queue_item_missing_overrides_becomes_empty_vec() {
        let dto = QueueItemDto {
            id: 9,
            printer_id: Some(1),
            required_filament_types: vec!["pla".into()],
            filament_overrides: None,
            position: 2,
            status: "pending".into(),
            name: None,
        };

        let item = QueueItem::from(dto);
        assert!(item.filament_overrides.is_empty());
        assert_eq!(item.status, QueueStatus::Pending);
        assert!(item.is_pending());
    }
}
