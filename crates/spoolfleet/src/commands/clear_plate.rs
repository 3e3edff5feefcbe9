//! Clear-plate command handler.

use owo_colors::OwoColorize;

use crate::cli::{ClearPlateArgs, GlobalOpts};
use crate::error::CliError;

use super::util;

pub async fn handle(args: ClearPlateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let hub = util::one_shot_hub(global)?;

    hub.clear_plate(args.printer_id).await?;

    if !global.quiet {
        eprintln!(
            "{} plate cleared on printer {}",
            "OK".green().bold(),
            args.printer_id
        );
    }
    Ok(())
}
