use std::fmt;

/// The kind of an energy source.
///
/// Kinds differ only in their display label; capacity is supplied at
/// construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Solar,
    City,
    Diesel,
}

impl SourceKind {
    /// All kinds, in declaration order.
    pub const ALL: [SourceKind; 3] = [SourceKind::Solar, SourceKind::City, SourceKind::Diesel];

    /// Human-readable label used in console output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Solar => "Solar Panel",
            Self::City => "City Power",
            Self::Diesel => "Diesel Generator",
        }
    }

    /// Short key used in configuration files.
    pub fn key(self) -> &'static str {
        match self {
            Self::Solar => "solar",
            Self::City => "city",
            Self::Diesel => "diesel",
        }
    }

    /// Parses a configuration key (`"solar"`, `"city"`, `"diesel"`).
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A power supplier with a fixed rated capacity in watts.
///
/// `rated_capacity` never changes after construction and is the value every
/// capacity check in the system uses. `remaining_capacity` is a separate
/// scratch value: it is reset to the rated value when a balancing pass starts
/// and afterwards holds the rated capacity minus the watts credited to this
/// source during that pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergySource {
    kind: SourceKind,
    rated_capacity: f64,
    remaining_capacity: f64,
}

impl EnergySource {
    /// Creates a source of the given kind with a fixed rated capacity (W).
    pub fn new(kind: SourceKind, rated_capacity: f64) -> Self {
        Self {
            kind,
            rated_capacity,
            remaining_capacity: rated_capacity,
        }
    }

    pub fn solar(rated_capacity: f64) -> Self {
        Self::new(SourceKind::Solar, rated_capacity)
    }

    pub fn city(rated_capacity: f64) -> Self {
        Self::new(SourceKind::City, rated_capacity)
    }

    pub fn diesel(rated_capacity: f64) -> Self {
        Self::new(SourceKind::Diesel, rated_capacity)
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Returns the fixed maximum output in watts.
    pub fn rated_capacity(&self) -> f64 {
        self.rated_capacity
    }

    /// Returns the scratch capacity left after the most recent pass.
    pub fn remaining_capacity(&self) -> f64 {
        self.remaining_capacity
    }

    pub fn set_remaining_capacity(&mut self, watts: f64) {
        self.remaining_capacity = watts;
    }

    /// Resets the scratch capacity to the rated value.
    pub fn reset_remaining(&mut self) {
        self.remaining_capacity = self.rated_capacity;
    }
}
