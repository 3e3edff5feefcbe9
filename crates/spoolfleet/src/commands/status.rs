//! Printer status command handlers.

use std::fmt::Write as _;

use tabled::Tabled;

use spoolfleet_core::PrinterStatus;

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PrinterRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Connected")]
    connected: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "Plate")]
    plate: String,
    #[tabled(rename = "Job")]
    job: String,
}

impl From<&PrinterStatus> for PrinterRow {
    fn from(p: &PrinterStatus) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            connected: if p.connected { "yes" } else { "no" }.into(),
            state: p.state.to_string(),
            progress: p.progress.map_or_else(|| "-".into(), |v| format!("{v:.0}%")),
            plate: if p.plate_cleared { "clear" } else { "occupied" }.into(),
            job: p.current_print.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

// ── Detail block ────────────────────────────────────────────────────

fn detail(p: &PrinterStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Printer:   {} (id {})", p.name, p.id);
    let _ = writeln!(out, "Connected: {}", if p.connected { "yes" } else { "no" });
    let _ = writeln!(out, "State:     {}", p.state);
    if let Some(job) = &p.current_print {
        let _ = writeln!(out, "Job:       {job}");
    }
    if let Some(progress) = p.progress {
        let _ = writeln!(out, "Progress:  {progress:.0}%");
    }
    if let Some(remaining) = p.remaining_time {
        let _ = writeln!(out, "Remaining: {remaining} min");
    }
    let _ = writeln!(
        out,
        "Plate:     {}",
        if p.plate_cleared { "clear" } else { "occupied" }
    );

    let loaded: Vec<String> = p
        .loaded_trays()
        .map(|t| {
            format!(
                "{}{}",
                t.tray_type.as_deref().unwrap_or("?"),
                t.tray_color
                    .as_deref()
                    .map_or_else(String::new, |c| format!(" #{c}"))
            )
        })
        .collect();
    let _ = write!(
        out,
        "Loaded:    {}",
        if loaded.is_empty() { "(nothing)".into() } else { loaded.join(", ") }
    );
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let hub = util::one_shot_hub(global)?;
    hub.full_refresh().await?;

    match args.printer_id {
        None => {
            let printers = hub.store().printers_snapshot();
            let out = output::render_list(
                global.output,
                printers.as_slice(),
                |p| PrinterRow::from(p.as_ref()),
                |p| p.id.to_string(),
            );
            output::print_output(&out, global.quiet);
        }
        Some(printer_id) => {
            let printer = hub.store().printer_status(printer_id).ok_or_else(|| {
                CliError::NotFound {
                    resource_type: "printer".into(),
                    identifier: printer_id.to_string(),
                    list_command: "status".into(),
                }
            })?;
            let out = output::render_single(
                global.output,
                printer.as_ref(),
                detail,
                |p| p.id.to_string(),
            );
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}
