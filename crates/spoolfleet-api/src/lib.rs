// spoolfleet-api: Async Rust client for the spoolfleet backend REST API
// and the SpoolBuddy device event stream.

pub mod client;
pub mod error;
pub mod events;
pub mod types;

pub use client::BackendClient;
pub use error::Error;
pub use events::{DeviceEvent, EventStreamHandle, ReconnectConfig};
