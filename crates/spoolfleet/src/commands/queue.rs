//! Queue command handlers.

use owo_colors::OwoColorize;
use tabled::Tabled;

use spoolfleet_core::queue::is_feasible;
use spoolfleet_core::{LoadedFilamentSet, QueueItem};

use crate::cli::{GlobalOpts, QueueArgs};
use crate::error::CliError;
use crate::output::{self, OutputFormat};

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct QueueRow {
    #[tabled(rename = "Pos")]
    position: i32,
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Filament")]
    filament: String,
}

impl From<&QueueItem> for QueueRow {
    fn from(item: &QueueItem) -> Self {
        Self {
            position: item.position,
            id: item.id,
            name: item.name.clone().unwrap_or_else(|| "-".into()),
            filament: describe_filament(item),
        }
    }
}

#[derive(Tabled)]
struct FullQueueRow {
    #[tabled(rename = "Pos")]
    position: i32,
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Filament")]
    filament: String,
    #[tabled(rename = "Feasible")]
    feasible: String,
}

fn describe_filament(item: &QueueItem) -> String {
    if !item.filament_overrides.is_empty() {
        return item
            .filament_overrides
            .iter()
            .map(|ov| format!("{} #{}", ov.filament_type, ov.color_hex.trim_start_matches('#')))
            .collect::<Vec<_>>()
            .join(" | ");
    }
    if item.required_filament_types.is_empty() {
        "any".into()
    } else {
        item.required_filament_types.join(", ")
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: QueueArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let hub = util::one_shot_hub(global)?;
    hub.full_refresh().await?;

    if args.all {
        let printer = hub.store().printer_status(args.printer_id).ok_or_else(|| {
            CliError::NotFound {
                resource_type: "printer".into(),
                identifier: args.printer_id.to_string(),
                list_command: "status".into(),
            }
        })?;
        let loaded = LoadedFilamentSet::from_printer(&printer);
        let items = hub.store().queue_for_printer(args.printer_id);

        let out = output::render_list(
            global.output,
            items.as_slice(),
            |item| FullQueueRow {
                position: item.position,
                id: item.id,
                name: item.name.clone().unwrap_or_else(|| "-".into()),
                filament: describe_filament(item),
                feasible: if is_feasible(item, &loaded) { "yes" } else { "no" }.into(),
            },
            |item| item.id.to_string(),
        );
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let view = hub.queue_view(args.printer_id)?;

    if global.output == OutputFormat::Table && !global.quiet {
        if let Some(next) = &view.next_up {
            eprintln!(
                "{} {} (+{} more feasible, {} pending total)",
                "Next up:".green().bold(),
                next.item.name.clone().unwrap_or_else(|| next.item.id.to_string()),
                next.more,
                view.pending_total
            );
        } else if view.pending_total > 0 {
            eprintln!(
                "{} {} pending item(s), none feasible with the loaded filament",
                "Blocked:".yellow().bold(),
                view.pending_total
            );
        }
    }

    let out = output::render_list(
        global.output,
        view.feasible.as_slice(),
        |item| QueueRow::from(item.as_ref()),
        |item| item.id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
