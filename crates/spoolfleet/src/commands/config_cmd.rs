//! Configuration command handlers.

use spoolfleet_config::{Config, config_path, save_config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, OutputFormat};

use super::util;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let path = config_path();
            if path.exists() {
                if !global.quiet {
                    eprintln!("Config already exists at {}", path.display());
                }
                return Ok(());
            }
            save_config(&Config::default())?;
            if !global.quiet {
                eprintln!("Wrote default config to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = util::load_config(global)?;
            let out = match global.output {
                OutputFormat::Json => {
                    serde_json::to_string_pretty(&cfg).unwrap_or_else(|_| "{}".into())
                }
                _ => toml::to_string_pretty(&cfg).map_err(spoolfleet_config::ConfigError::from)?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config_path().display());
            Ok(())
        }
    }
}
