// ── Clear-plate workflow ──
//
// When a print finishes (or fails) the plate must be physically
// emptied before the next queued job can start. This module decides
// which affordance to surface for a printer and tracks the in-flight
// clear request. It is pure state; the hub performs the actual API
// call and feeds the outcome back in.

use std::collections::HashSet;

use crate::model::PrinterStatus;

/// Capability required to trigger a plate clear.
pub const CAP_CLEAR_PLATE: &str = "printers:clear_plate";

/// The capability set granted to this session's API key.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    granted: HashSet<String>,
}

impl Capabilities {
    pub fn new<I, S>(granted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: granted.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has(&self, capability: &str) -> bool {
        self.granted.contains(capability)
    }

    pub fn can_clear_plate(&self) -> bool {
        self.has(CAP_CLEAR_PLATE)
    }
}

/// The affordance a consumer should render for a printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearPlatePrompt {
    /// No feasible queue: nothing to prompt for.
    Hidden,
    /// There is a feasible queue but the plate is not blocking it;
    /// offer a passive link to the queue.
    ViewQueue,
    /// A finished/failed print is blocking a feasible next job.
    ///
    /// `enabled` is false when the session lacks the clear-plate
    /// capability: the action is shown but not actionable.
    /// `error` carries the last failed attempt's message for retry UX.
    ReadyToClear {
        enabled: bool,
        error: Option<String>,
    },
    /// A clear request is in flight.
    Clearing,
    /// The last clear succeeded; shown until the next status refresh
    /// confirms it.
    Cleared,
}

/// Tracks the in-flight/terminal phase of one printer's clear action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Idle,
    Clearing,
    Cleared,
}

/// Per-printer clear-plate state machine.
#[derive(Debug, Clone, Default)]
pub struct ClearPlateFlow {
    phase: Phase,
    last_error: Option<String>,
}

impl ClearPlateFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the prompt for the current printer status and feasible
    /// queue size.
    pub fn prompt(
        &self,
        printer: &PrinterStatus,
        feasible_count: usize,
        caps: &Capabilities,
    ) -> ClearPlatePrompt {
        if feasible_count == 0 {
            return ClearPlatePrompt::Hidden;
        }

        match self.phase {
            Phase::Clearing => ClearPlatePrompt::Clearing,
            Phase::Cleared => ClearPlatePrompt::Cleared,
            Phase::Idle => {
                if printer.state.is_print_complete() && !printer.plate_cleared {
                    ClearPlatePrompt::ReadyToClear {
                        enabled: caps.can_clear_plate(),
                        error: self.last_error.clone(),
                    }
                } else {
                    ClearPlatePrompt::ViewQueue
                }
            }
        }
    }

    /// A clear request was dispatched.
    pub fn begin(&mut self) {
        self.phase = Phase::Clearing;
    }

    /// The clear request completed.
    ///
    /// On failure the flow returns to ready with the server's message
    /// retained, so the action can be retried.
    pub fn complete(&mut self, success: bool, message: Option<String>) {
        if success {
            self.phase = Phase::Cleared;
            self.last_error = None;
        } else {
            self.phase = Phase::Idle;
            self.last_error = message;
        }
    }

    /// A status refresh confirmed the plate state; drop the terminal
    /// `Cleared` overlay.
    pub fn acknowledge_refresh(&mut self) {
        if self.phase == Phase::Cleared {
            self.phase = Phase::Idle;
        }
    }
}
