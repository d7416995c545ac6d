//! Per-device results of a balancing pass and the event stream that carries them.

use std::fmt;

use crate::devices::SourceKind;

/// What happened to one device during a balancing pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The device was assigned to the source at `source_index`.
    Powered {
        source_index: usize,
        kind: SourceKind,
    },
    /// No source had enough budget left for the device.
    Unpowered,
    /// The worker assigned to the device failed before reaching a decision.
    WorkerFault { message: String },
}

impl Outcome {
    pub fn is_powered(&self) -> bool {
        matches!(self, Self::Powered { .. })
    }
}

/// A single device's outcome, as emitted by its worker.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceOutcome {
    /// Position in which the device was serviced (0 = first to take the lock).
    pub sequence: usize,
    /// Index of the device in the coordinator's collection.
    pub device_index: usize,
    pub device_name: String,
    pub demand_w: f64,
    pub outcome: Outcome,
    /// Value of the shared budget when the worker released it.
    pub remaining_after_w: f64,
}

impl fmt::Display for DeviceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Powered { kind, .. } => {
                write!(f, "{} is powered by {}", self.device_name, kind.label())
            }
            Outcome::Unpowered => write!(
                f,
                "{} cannot be powered due to insufficient capacity.",
                self.device_name
            ),
            Outcome::WorkerFault { message } => {
                write!(f, "{} could not be balanced: {message}", self.device_name)
            }
        }
    }
}

/// Progress events emitted while a pass runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BalanceEvent {
    /// The pass has started with `workers` devices to service.
    Started {
        active: SourceKind,
        budget_w: f64,
        workers: usize,
    },
    /// A worker finished its decision.
    Outcome(DeviceOutcome),
    /// Every worker has been joined.
    Completed {
        powered: usize,
        unpowered: usize,
        faults: usize,
    },
}

/// The complete result of a balancing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    /// Source whose rated capacity seeded the shared budget.
    pub active: SourceKind,
    pub initial_budget_w: f64,
    pub final_remaining_w: f64,
    /// Outcomes in service order.
    pub outcomes: Vec<DeviceOutcome>,
}

impl PassReport {
    pub fn powered_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_powered()).count()
    }

    pub fn unpowered_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.outcome == Outcome::Unpowered)
            .count()
    }

    pub fn fault_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::WorkerFault { .. }))
            .count()
    }

    /// Returns the outcome of the first serviced device called `name`.
    pub fn outcome_for(&self, name: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.device_name == name)
            .map(|o| &o.outcome)
    }

    /// Total watts credited to the source at `source_index`.
    pub fn credited_w(&self, source_index: usize) -> f64 {
        self.outcomes
            .iter()
            .filter_map(|o| match o.outcome {
                Outcome::Powered {
                    source_index: idx, ..
                } if idx == source_index => Some(o.demand_w),
                _ => None,
            })
            .sum()
    }

    /// Builds the completion event for this report.
    pub fn completed_event(&self) -> BalanceEvent {
        BalanceEvent::Completed {
            powered: self.powered_count(),
            unpowered: self.unpowered_count(),
            faults: self.fault_count(),
        }
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Balancing load across energy sources...")?;
        for outcome in &self.outcomes {
            writeln!(f, "{outcome}")?;
        }
        Ok(())
    }
}
