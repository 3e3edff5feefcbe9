//! Live scale-station watch command.

use std::collections::HashMap;
use std::time::Duration;

use owo_colors::OwoColorize;
use tokio::sync::watch;

use spoolfleet_core::{DisplayCard, DisplaySnapshot, PrinterState, PrinterStatus};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;

use super::util;

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = util::load_config(global)?;
    let mut hub_cfg = spoolfleet_config::hub_config(&cfg)?;
    hub_cfg.events_enabled = true;
    if let Some(timeout) = global.timeout {
        hub_cfg.timeout = Duration::from_secs(timeout);
    }

    let hub = spoolfleet_core::FleetHub::new(hub_cfg)?;
    hub.connect().await?;

    if !global.quiet {
        match &args.device_id {
            Some(id) => eprintln!("Watching device {id}. Ctrl-C to exit."),
            None => eprintln!("Watching all devices. Ctrl-C to exit."),
        }
    }

    let mut displays: HashMap<String, watch::Receiver<DisplaySnapshot>> = HashMap::new();
    let mut tick = tokio::time::interval(Duration::from_millis(250));

    // The initial refresh ran during connect(), so the subscription's
    // creation-time snapshot is the baseline; only transitions print.
    let mut printers = hub.store().subscribe_printers();
    let mut printer_states: HashMap<i64, (bool, PrinterState)> = printers
        .current()
        .iter()
        .map(|p| (p.id, (p.connected, p.state)))
        .collect();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(statuses) = printers.changed() => {
                for status in statuses.iter() {
                    let entry = (status.connected, status.state);
                    if printer_states.insert(status.id, entry) != Some(entry) {
                        print_printer(status);
                    }
                }
            }
            _ = tick.tick() => {
                // Pick up devices that produced their first event since
                // the last sweep.
                for id in hub.device_ids() {
                    if displays.contains_key(&id) {
                        continue;
                    }
                    if args.device_id.as_deref().is_some_and(|want| want != id) {
                        continue;
                    }
                    if let Some(rx) = hub.display(&id) {
                        displays.insert(id, rx);
                    }
                }

                for rx in displays.values_mut() {
                    if rx.has_changed().unwrap_or(false) {
                        let snap = rx.borrow_and_update().clone();
                        print_snapshot(&snap);
                    }
                }
            }
        }
    }

    hub.disconnect().await;
    Ok(())
}

fn print_printer(status: &PrinterStatus) {
    let time = chrono::Local::now().format("%H:%M:%S");
    let name = format!("{} (#{})", status.name, status.id);

    if status.connected {
        let progress = status
            .progress
            .map_or_else(String::new, |p| format!(" {p:.0}%"));
        println!("{time} {} {}{progress}", name.magenta(), status.state);
    } else {
        println!("{time} {} {}", name.magenta(), "disconnected".red());
    }
}

fn print_snapshot(snap: &DisplaySnapshot) {
    let time = chrono::Local::now().format("%H:%M:%S");
    let weight = snap
        .display_weight_g
        .map_or_else(|| "   --  ".into(), |g| format!("{g:7.1}g"));

    let card = match &snap.card {
        DisplayCard::Empty => "-".to_string(),
        DisplayCard::KnownSpool { spool, readout } => format!(
            "{} {}% full, {}g remaining{}",
            spool.display_name(),
            readout.fill_percent,
            readout.remaining_g,
            if readout.weight_match { "" } else { " (weight mismatch)" }
        ),
        DisplayCard::UnknownTag { uid } => format!("unknown tag {uid}"),
    };

    if snap.online {
        println!("{time} {} {weight}  {card}", snap.device_id.cyan());
    } else {
        println!("{time} {} {}", snap.device_id.cyan(), "offline".red());
    }
}
