//! Household appliances and the energy sources that power them.

/// Power-consuming appliances.
pub mod appliance;
/// Energy sources and their kinds.
pub mod source;

// Re-export the main types for convenience
pub use appliance::Device;
pub use source::{EnergySource, SourceKind};
