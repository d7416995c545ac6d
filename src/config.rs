//! TOML-based house configuration and preset definitions.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::devices::{Device, EnergySource, SourceKind};
use crate::error::ConfigError;
use crate::logging::EventSink;
use crate::sim::{EnergyCoordinator, LoadBalancer, ServiceOrder};

/// Top-level house configuration parsed from TOML.
///
/// All fields have defaults matching the default house (three sources, four
/// appliances, all off). Load from TOML with [`HouseConfig::from_toml_file`]
/// or use [`HouseConfig::default_house`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HouseConfig {
    /// Active-source selection.
    #[serde(default)]
    pub house: HouseSection,
    /// Balancing policy.
    #[serde(default)]
    pub balancer: BalancerConfig,
    /// Log level and destination.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Energy sources in priority order.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
    /// Appliances in display order.
    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceConfig>,
}

/// Active-source selection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HouseSection {
    /// Index into `sources` of the initially active source (default: first).
    pub active_source: Option<usize>,
}

/// Balancing policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BalancerConfig {
    /// Service order: `"collection"`, `"scheduler"`, or `"shuffled"`.
    pub order: String,
    /// Seed for the `"shuffled"` order.
    pub seed: u64,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            order: "collection".to_string(),
            seed: 42,
        }
    }
}

/// Log level and destination.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive (e.g. `"info"`, `"smarthouse_sim=debug"`).
    pub level: String,
    /// Append logs to this file instead of stderr.
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// One energy source.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// `"solar"`, `"city"`, or `"diesel"`.
    pub kind: String,
    /// Rated capacity (W).
    pub capacity_w: f64,
}

/// One appliance.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    pub name: String,
    /// Rated power draw (W).
    pub rated_w: f64,
    /// Initial state.
    #[serde(default)]
    pub on: bool,
}

impl SourceConfig {
    fn new(kind: SourceKind, capacity_w: f64) -> Self {
        Self {
            kind: kind.key().to_string(),
            capacity_w,
        }
    }
}

impl DeviceConfig {
    fn new(name: &str, rated_w: f64, on: bool) -> Self {
        Self {
            name: name.to_string(),
            rated_w,
            on,
        }
    }
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new(SourceKind::Solar, 500.0),
        SourceConfig::new(SourceKind::City, 1000.0),
        SourceConfig::new(SourceKind::Diesel, 800.0),
    ]
}

fn default_devices() -> Vec<DeviceConfig> {
    vec![
        DeviceConfig::new("Lamp", 100.0, false),
        DeviceConfig::new("AC", 300.0, false),
        DeviceConfig::new("TV", 200.0, false),
        DeviceConfig::new("Fridge", 300.0, false),
    ]
}

impl HouseConfig {
    /// Returns the default house: Solar 500 W, City 1000 W, Diesel 800 W and
    /// Lamp, AC, TV, Fridge switched off.
    pub fn default_house() -> Self {
        Self {
            house: HouseSection::default(),
            balancer: BalancerConfig::default(),
            logging: LoggingConfig::default(),
            sources: default_sources(),
            devices: default_devices(),
        }
    }

    /// Returns the all-on preset: the default house with every appliance on
    /// (900 W against the 500 W solar panel).
    pub fn all_on() -> Self {
        let mut cfg = Self::default_house();
        for device in &mut cfg.devices {
            device.on = true;
        }
        cfg
    }

    /// Returns the tight preset: a single small solar panel and a heater it
    /// cannot carry.
    pub fn tight() -> Self {
        Self {
            sources: vec![SourceConfig::new(SourceKind::Solar, 100.0)],
            devices: vec![
                DeviceConfig::new("Lamp", 60.0, true),
                DeviceConfig::new("Heater", 500.0, false),
            ],
            ..Self::default_house()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["default", "all_on", "tight"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "default" => Ok(Self::default_house()),
            "all_on" => Ok(Self::all_on()),
            "tight" => Ok(Self::tight()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Resolves the configured service order.
    pub fn service_order(&self) -> Option<ServiceOrder> {
        ServiceOrder::from_key(&self.balancer.order, self.balancer.seed)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.service_order().is_none() {
            errors.push(ConfigError::new(
                "balancer.order",
                format!(
                    "must be one of {}, got \"{}\"",
                    ServiceOrder::KEYS.join(", "),
                    self.balancer.order
                ),
            ));
        }

        for (i, source) in self.sources.iter().enumerate() {
            if SourceKind::from_key(&source.kind).is_none() {
                errors.push(ConfigError::new(
                    format!("sources[{i}].kind"),
                    format!(
                        "must be \"solar\", \"city\" or \"diesel\", got \"{}\"",
                        source.kind
                    ),
                ));
            }
            if !(source.capacity_w >= 0.0 && source.capacity_w.is_finite()) {
                errors.push(ConfigError::new(
                    format!("sources[{i}].capacity_w"),
                    "must be a finite value >= 0",
                ));
            }
        }

        if let Some(active) = self.house.active_source {
            if active >= self.sources.len() {
                errors.push(ConfigError::new(
                    "house.active_source",
                    format!("must be < number of sources ({})", self.sources.len()),
                ));
            }
        }

        for (i, device) in self.devices.iter().enumerate() {
            if device.name.trim().is_empty() {
                errors.push(ConfigError::new(
                    format!("devices[{i}].name"),
                    "must not be empty",
                ));
            }
            if !(device.rated_w >= 0.0 && device.rated_w.is_finite()) {
                errors.push(ConfigError::new(
                    format!("devices[{i}].rated_w"),
                    "must be a finite value >= 0",
                ));
            }
        }

        if self.logging.level.trim().is_empty() {
            errors.push(ConfigError::new("logging.level", "must not be empty"));
        }

        errors
    }

    /// Builds a coordinator from this configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if the configuration is invalid.
    pub fn build(&self, sink: Arc<dyn EventSink>) -> Result<EnergyCoordinator, ConfigError> {
        if let Some(err) = self.validate().into_iter().next() {
            return Err(err);
        }

        let mut sources = Vec::with_capacity(self.sources.len());
        for (i, s) in self.sources.iter().enumerate() {
            let kind = SourceKind::from_key(&s.kind).ok_or_else(|| {
                ConfigError::new(format!("sources[{i}].kind"), "unknown source kind")
            })?;
            sources.push(EnergySource::new(kind, s.capacity_w));
        }

        let devices = self
            .devices
            .iter()
            .map(|d| Device::with_state(d.name.clone(), d.rated_w, d.on))
            .collect();

        let order = self.service_order().unwrap_or_default();
        let balancer = LoadBalancer::new(order, sink.clone());
        let mut coordinator = EnergyCoordinator::new(devices, sources, balancer, sink);
        if let Some(active) = self.house.active_source {
            coordinator
                .set_active_source(active)
                .map_err(|e| ConfigError::new("house.active_source", e.to_string()))?;
        }
        Ok(coordinator)
    }
}
