//! TUI application state wrapping an [`EnergyCoordinator`].

use std::sync::Arc;

use crate::config::HouseConfig;
use crate::error::ConfigError;
use crate::logging::{LogRecord, MemorySink};
use crate::sim::{EnergyCoordinator, PassSummary, ServiceOrder};

/// Maximum number of log lines shown in the log pane.
pub const LOG_LINES: usize = 8;

/// TUI application state.
pub struct App {
    coordinator: EnergyCoordinator,
    sink: Arc<MemorySink>,
    /// Configuration the coordinator was built from (kept for restart).
    config: HouseConfig,
    /// Index of the highlighted device.
    pub selected: usize,
    /// Whether the user has requested quit.
    pub quit: bool,
    /// One-line result of the last action.
    pub status: String,
}

impl App {
    /// Creates a new app from a configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration does not build.
    pub fn new(config: HouseConfig) -> Result<Self, ConfigError> {
        let sink = Arc::new(MemorySink::forwarding().with_limit(LOG_LINES));
        let coordinator = config.build(sink.clone())?;
        Ok(Self {
            coordinator,
            sink,
            config,
            selected: 0,
            quit: false,
            status: "Ready.".to_string(),
        })
    }

    /// Creates a new app from a preset name.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        Self::new(HouseConfig::from_preset(name)?)
    }

    pub fn coordinator(&self) -> &EnergyCoordinator {
        &self.coordinator
    }

    /// Moves the highlight down, wrapping at the end.
    pub fn select_next(&mut self) {
        let len = self.coordinator.devices().len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    /// Moves the highlight up, wrapping at the start.
    pub fn select_prev(&mut self) {
        let len = self.coordinator.devices().len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    /// Toggles the highlighted device.
    pub fn toggle_selected(&mut self) {
        self.status = match self.coordinator.toggle_device(self.selected) {
            Ok(t) => match &t.pass {
                Some(pass) => format!(
                    "{} turned {}; balanced: {} powered, {} unpowered",
                    t.device_name,
                    if t.is_on { "on" } else { "off" },
                    pass.powered_count(),
                    pass.unpowered_count()
                ),
                None => format!(
                    "{} turned {}",
                    t.device_name,
                    if t.is_on { "on" } else { "off" }
                ),
            },
            Err(e) => e.to_string(),
        };
    }

    /// Removes the highlighted device.
    pub fn remove_selected(&mut self) {
        let Some(name) = self
            .coordinator
            .devices()
            .get(self.selected)
            .map(|d| d.name().to_string())
        else {
            self.status = "Nothing to remove.".to_string();
            return;
        };
        self.status = match self.coordinator.remove_device(&name) {
            Ok(_) => format!("Removed {name}"),
            Err(e) => e.to_string(),
        };
        let len = self.coordinator.devices().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Makes the source at `index` active.
    pub fn set_active(&mut self, index: usize) {
        self.status = match self.coordinator.set_active_source(index) {
            Ok(kind) => format!("Active source: {}", kind.label()),
            Err(e) => e.to_string(),
        };
    }

    /// Runs a balancing pass on demand.
    pub fn balance(&mut self) {
        self.status = match self.coordinator.balance() {
            Ok(report) => {
                let summary = PassSummary::from_report(&report, self.coordinator.sources());
                format!(
                    "Balanced: {} powered, {} unpowered ({:.0}% served)",
                    summary.powered,
                    summary.unpowered,
                    summary.served_ratio() * 100.0
                )
            }
            Err(e) => e.to_string(),
        };
    }

    /// Cycles the service order: collection, scheduler, shuffled.
    pub fn cycle_order(&mut self) {
        let next = match self.coordinator.balancer().order() {
            ServiceOrder::Collection => ServiceOrder::Scheduler,
            ServiceOrder::Scheduler => ServiceOrder::Shuffled {
                seed: self.config.balancer.seed,
            },
            ServiceOrder::Shuffled { .. } => ServiceOrder::Collection,
        };
        self.coordinator.balancer_mut().set_order(next);
        self.status = format!("Service order: {}", next.key());
    }

    /// Rebuilds the house from the configuration it was started with.
    pub fn restart(&mut self) {
        self.sink.clear();
        match self.config.build(self.sink.clone()) {
            Ok(coordinator) => {
                self.coordinator = coordinator;
                self.selected = 0;
                self.status = "Restarted.".to_string();
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    /// Active load as a fraction of the active source's rated capacity.
    pub fn load_ratio(&self) -> f64 {
        let capacity = self.coordinator.active_capacity();
        if capacity > 0.0 {
            self.coordinator.total_consumption() / capacity
        } else if self.coordinator.total_consumption() > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }

    /// Latest log lines for the log pane.
    pub fn log_tail(&self) -> Vec<LogRecord> {
        self.sink.tail(LOG_LINES)
    }
}
