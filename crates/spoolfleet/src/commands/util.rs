//! Shared helpers for command handlers.

use spoolfleet_config::Config;
use spoolfleet_core::{FleetHub, HubConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the config file (honoring `--config`) and fold in CLI flag
/// overrides.
pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = match &global.config {
        Some(path) => spoolfleet_config::load_config_from(path)?,
        None => spoolfleet_config::load_config_or_default(),
    };

    if let Some(ref url) = global.backend_url {
        cfg.backend.url.clone_from(url);
    }
    if let Some(ref key) = global.api_key {
        cfg.backend.api_key = Some(key.clone());
    }
    if let Some(timeout) = global.timeout {
        cfg.backend.timeout_secs = timeout;
    }

    Ok(cfg)
}

/// Build a `HubConfig` for a one-shot command: no event stream, no
/// background polling.
pub fn one_shot_hub_config(global: &GlobalOpts) -> Result<HubConfig, CliError> {
    let cfg = load_config(global)?;
    let mut hub = spoolfleet_config::hub_config(&cfg)?;
    hub.events_enabled = false;
    hub.status_poll_secs = 0;
    Ok(hub)
}

/// Construct a hub for a one-shot command.
pub fn one_shot_hub(global: &GlobalOpts) -> Result<FleetHub, CliError> {
    Ok(FleetHub::new(one_shot_hub_config(global)?)?)
}
