//! Command dispatch: bridges CLI args -> hub calls -> output formatting.

pub mod clear_plate;
pub mod config_cmd;
pub mod queue;
pub mod spools;
pub mod status;
pub mod util;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Spools(args) => spools::handle(args, global).await,
        Command::Status(args) => status::handle(args, global).await,
        Command::Queue(args) => queue::handle(args, global).await,
        Command::ClearPlate(args) => clear_plate::handle(args, global).await,
        Command::Watch(args) => watch::handle(args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
