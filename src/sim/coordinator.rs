//! Energy coordinator: owns devices, sources, and the active-source selection.

use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::devices::{Device, EnergySource, SourceKind};
use crate::error::HouseError;
use crate::logging::EventSink;

use super::balancer::LoadBalancer;
use super::outcome::{BalanceEvent, PassReport};

/// Result of toggling a device.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    pub device_name: String,
    /// State after the toggle.
    pub is_on: bool,
    /// Total consumption after the toggle (W).
    pub total_consumption_w: f64,
    /// `true` when the new total exceeds the active source's rated capacity.
    pub over_capacity: bool,
    /// Report of the balancing pass the toggle triggered, if one ran.
    pub pass: Option<PassReport>,
}

/// Owns the household's devices and sources and triggers balancing passes.
///
/// `active` is either `None` (no sources configured) or an index into
/// `sources`; every mutation preserves that invariant.
pub struct EnergyCoordinator {
    devices: Vec<Device>,
    sources: Vec<EnergySource>,
    active: Option<usize>,
    balancer: LoadBalancer,
    sink: Arc<dyn EventSink>,
    last_pass: Option<PassReport>,
}

impl EnergyCoordinator {
    /// Creates a coordinator. The first source, if any, becomes active.
    pub fn new(
        devices: Vec<Device>,
        sources: Vec<EnergySource>,
        balancer: LoadBalancer,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let active = if sources.is_empty() { None } else { Some(0) };
        Self {
            devices,
            sources,
            active,
            balancer,
            sink,
            last_pass: None,
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn sources(&self) -> &[EnergySource] {
        &self.sources
    }

    /// Returns a mutable handle to the device at `index` for renaming or re-rating.
    pub fn device_mut(&mut self, index: usize) -> Result<&mut Device, HouseError> {
        let len = self.devices.len();
        self.devices
            .get_mut(index)
            .ok_or(HouseError::InvalidIndex { index, len })
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_source(&self) -> Option<&EnergySource> {
        self.active.and_then(|i| self.sources.get(i))
    }

    pub fn balancer(&self) -> &LoadBalancer {
        &self.balancer
    }

    pub fn balancer_mut(&mut self) -> &mut LoadBalancer {
        &mut self.balancer
    }

    /// Report of the most recent balancing pass, if any ran.
    pub fn last_pass(&self) -> Option<&PassReport> {
        self.last_pass.as_ref()
    }

    /// Appends a new device in the off state. Duplicate names are allowed.
    pub fn add_device(&mut self, name: impl Into<String>, rated_watts: f64) {
        let device = Device::new(name, rated_watts);
        self.sink
            .info(&format!("Smart object '{}' added.", device.name()));
        self.devices.push(device);
    }

    /// Removes the first device called `name` and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`HouseError::DeviceNotFound`] if no device matches; the
    /// collection is left unchanged.
    pub fn remove_device(&mut self, name: &str) -> Result<Device, HouseError> {
        match self.devices.iter().position(|d| d.name() == name) {
            Some(index) => {
                let removed = self.devices.remove(index);
                self.sink.info(&format!("Smart object '{name}' deleted."));
                Ok(removed)
            }
            None => {
                self.sink.warning(&format!("Smart object '{name}' not found."));
                Err(HouseError::DeviceNotFound(name.to_string()))
            }
        }
    }

    /// Flips the device at `index` and balances if the new total exceeds the
    /// active source's capacity.
    ///
    /// With no active source the capacity is treated as zero, so any non-zero
    /// total is over capacity; the pass is then skipped with a warning and the
    /// toggle still succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`HouseError::InvalidIndex`] if `index` is out of range; no
    /// state changes in that case.
    pub fn toggle_device(&mut self, index: usize) -> Result<ToggleOutcome, HouseError> {
        let len = self.devices.len();
        let device = self
            .devices
            .get_mut(index)
            .ok_or(HouseError::InvalidIndex { index, len })?;

        let is_on = device.toggle();
        let device_name = device.name().to_string();
        self.sink.info(&format!(
            "{device_name} turned {}.",
            if is_on { "on" } else { "off" }
        ));

        let total_consumption_w = self.total_consumption();
        let over_capacity = self.is_over_capacity();
        let mut pass = None;
        if over_capacity {
            self.sink
                .warning("Total consumption exceeds active source capacity. load balancing...");
            match self.balance() {
                Ok(report) => pass = Some(report),
                Err(e) => tracing::debug!(error = %e, "balancing skipped after toggle"),
            }
        }

        Ok(ToggleOutcome {
            device_name,
            is_on,
            total_consumption_w,
            over_capacity,
            pass,
        })
    }

    /// Makes the source at `index` active.
    ///
    /// # Errors
    ///
    /// Returns [`HouseError::InvalidIndex`] if `index` is not a source index.
    pub fn set_active_source(&mut self, index: usize) -> Result<SourceKind, HouseError> {
        let kind = self
            .sources
            .get(index)
            .map(EnergySource::kind)
            .ok_or(HouseError::InvalidIndex {
                index,
                len: self.sources.len(),
            })?;
        self.active = Some(index);
        self.sink
            .info(&format!("Active energy source set to {}", kind.label()));
        Ok(kind)
    }

    /// Sum of the current draw of every device (W).
    pub fn total_consumption(&self) -> f64 {
        self.devices.iter().map(Device::consumption).sum()
    }

    /// Rated capacity of the active source, or `0.0` when none is set.
    pub fn active_capacity(&self) -> f64 {
        self.active_source().map_or(0.0, EnergySource::rated_capacity)
    }

    pub fn is_over_capacity(&self) -> bool {
        self.total_consumption() > self.active_capacity()
    }

    /// Emits the status-view warning when consumption exceeds the active
    /// source's capacity and returns whether it did.
    pub fn check_capacity(&self) -> bool {
        let over = self.active_source().is_some() && self.is_over_capacity();
        if over {
            self.sink
                .warning("Warning! Energy consumption exceeds source capacity.");
        }
        over
    }

    /// Runs a balancing pass over the current state.
    ///
    /// # Errors
    ///
    /// Returns [`HouseError::NoActiveSource`] when no source is active.
    pub fn balance(&mut self) -> Result<PassReport, HouseError> {
        let (tx, _rx) = crossbeam_channel::unbounded();
        self.balance_with_events(&tx)
    }

    /// Runs a balancing pass, streaming progress to `events`.
    ///
    /// Each source's scratch capacity is reset before the pass and set to its
    /// rated capacity minus the watts credited to it afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`HouseError::NoActiveSource`] when no source is active.
    pub fn balance_with_events(
        &mut self,
        events: &Sender<BalanceEvent>,
    ) -> Result<PassReport, HouseError> {
        for source in &mut self.sources {
            source.reset_remaining();
        }

        let report =
            self.balancer
                .balance_with_events(&self.devices, &self.sources, self.active, events)?;

        for (index, source) in self.sources.iter_mut().enumerate() {
            source.set_remaining_capacity(source.rated_capacity() - report.credited_w(index));
        }
        self.last_pass = Some(report.clone());
        Ok(report)
    }
}
