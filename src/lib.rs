//! Smart-house energy management simulator.
//!
//! Appliances draw load against an ordered list of energy sources, one of
//! which is active. When consumption exceeds the active source's capacity a
//! concurrent balancing pass decides which source powers which appliance.

pub mod cli;
pub mod config;
pub mod devices;
pub mod error;
pub mod io;
pub mod logging;
pub mod menu;
/// Load balancer, coordinator, and pass reporting.
pub mod sim;
#[cfg(feature = "tui")]
pub mod tui;

pub use error::{ConfigError, HouseError};
