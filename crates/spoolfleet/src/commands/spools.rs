//! Spool inventory command handlers.

use tabled::Tabled;

use spoolfleet_core::Spool;

use crate::cli::{GlobalOpts, SpoolsArgs, SpoolsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SpoolRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Material")]
    material: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Tag")]
    tag: String,
    #[tabled(rename = "Label g")]
    label_g: String,
    #[tabled(rename = "Used g")]
    used_g: String,
    #[tabled(rename = "Archived")]
    archived: String,
}

impl From<&Spool> for SpoolRow {
    fn from(s: &Spool) -> Self {
        Self {
            id: s.id,
            name: s.display_name(),
            material: s.material.clone(),
            color: s.color_name.clone().unwrap_or_default(),
            tag: s.tag_uid.clone().unwrap_or_else(|| "-".into()),
            label_g: s.label_weight_g.map_or_else(|| "-".into(), |g| format!("{g:.0}")),
            used_g: s.weight_used_g.map_or_else(|| "-".into(), |g| format!("{g:.0}")),
            archived: if s.archived { "yes" } else { "no" }.into(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: SpoolsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SpoolsCommand::List { archived } => {
            let hub = util::one_shot_hub(global)?;
            let spools = hub.list_spools(archived).await?;

            let out = output::render_list(
                global.output,
                &spools,
                |s: &Spool| SpoolRow::from(s),
                |s| s.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
