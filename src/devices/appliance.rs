use std::fmt;

/// A power-consuming household appliance ("smart object").
///
/// A device draws its full rated wattage while switched on and nothing while
/// switched off. Names are used as lookup keys by the coordinator but are not
/// required to be unique.
///
/// # Examples
///
/// ```
/// use smarthouse_sim::devices::Device;
///
/// let mut lamp = Device::new("Lamp", 100.0);
/// assert_eq!(lamp.consumption(), 0.0);
///
/// lamp.turn_on();
/// assert_eq!(lamp.consumption(), 100.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    name: String,
    rated_watts: f64,
    is_on: bool,
}

impl Device {
    /// Creates a new device in the off state.
    pub fn new(name: impl Into<String>, rated_watts: f64) -> Self {
        Self::with_state(name, rated_watts, false)
    }

    /// Creates a new device with an explicit on/off state.
    pub fn with_state(name: impl Into<String>, rated_watts: f64, is_on: bool) -> Self {
        Self {
            name: name.into(),
            rated_watts,
            is_on,
        }
    }

    /// Returns the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the rated power draw in watts, regardless of state.
    pub fn rated_watts(&self) -> f64 {
        self.rated_watts
    }

    /// Returns `true` while the device is switched on.
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Returns the current draw in watts: the rated wattage when on, `0.0` when off.
    pub fn consumption(&self) -> f64 {
        if self.is_on { self.rated_watts } else { 0.0 }
    }

    pub fn turn_on(&mut self) {
        self.is_on = true;
    }

    pub fn turn_off(&mut self) {
        self.is_on = false;
    }

    /// Flips the on/off state and returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.is_on = !self.is_on;
        self.is_on
    }

    /// Renames the device. Uniqueness is the caller's concern.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Replaces the rated wattage. No validation is performed.
    pub fn set_rated_watts(&mut self, rated_watts: f64) {
        self.rated_watts = rated_watts;
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - Power Rate: {} W",
            self.name,
            if self.is_on { "On" } else { "Off" },
            self.rated_watts
        )
    }
}
