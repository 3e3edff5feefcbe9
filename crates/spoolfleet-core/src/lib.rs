// spoolfleet-core: reactive engine between spoolfleet-api and consumers.
//
// Owns the domain model, the live-scale reconciliation pipeline
// (normalizer -> stability filter -> matcher -> presentation state
// machine), the queue feasibility filter, the clear-plate workflow,
// and the hub facade that wires it all to a running backend.

pub mod convert;
pub mod error;
pub mod hub;
pub mod live;
pub mod model;
pub mod queue;
pub mod store;
pub mod stream;
pub mod telemetry;
pub mod workflow;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use hub::{ConnectionState, FleetHub, HubConfig, QueueView};
pub use live::matcher::{MatchOutcome, SpoolReadout};
pub use live::reconciler::{DeviceReconciler, DisplayCard, DisplaySnapshot, SyncRequest};
pub use live::stability::StabilityFilter;
pub use queue::{LoadedFilamentSet, NextUp};
pub use store::DataStore;
pub use stream::EntityStream;
pub use telemetry::{TelemetryEvent, WeightSample};
pub use workflow::{Capabilities, ClearPlateFlow, ClearPlatePrompt};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AmsTray, AmsUnit, FilamentOverride, PrinterState, PrinterStatus, QueueItem, QueueStatus,
    Spool,
};
