// ── Domain model ──
//
// Canonical strongly-typed entities. Wire DTOs from `spoolfleet_api`
// are converted into these in `convert.rs`; everything above the
// conversion layer only ever sees these types.

pub mod printer;
pub mod queue;
pub mod spool;

pub use printer::{AmsTray, AmsUnit, PrinterState, PrinterStatus};
pub use queue::{FilamentOverride, QueueItem, QueueStatus};
pub use spool::Spool;
