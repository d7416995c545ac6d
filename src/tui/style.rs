//! Color constants and helpers for the TUI.

use ratatui::style::Color;

use crate::logging::Severity;
use crate::sim::Outcome;

/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Device that is switched on.
pub const DEVICE_ON: Color = Color::Green;
/// Device that is switched off.
pub const DEVICE_OFF: Color = Color::DarkGray;
/// Marker for the active source.
pub const ACTIVE_SOURCE: Color = Color::Cyan;

/// Returns a gauge color for load as a fraction of the active capacity.
pub fn load_color(ratio: f64) -> Color {
    if ratio > 1.0 {
        Color::Red
    } else if ratio >= 0.8 {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// Returns the color used for a pass outcome line.
pub fn outcome_color(outcome: &Outcome) -> Color {
    match outcome {
        Outcome::Powered { .. } => Color::Green,
        Outcome::Unpowered => Color::Yellow,
        Outcome::WorkerFault { .. } => Color::Red,
    }
}

/// Returns the color used for a log line.
pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Gray,
        Severity::Warning => Color::Yellow,
        Severity::Severe => Color::Red,
    }
}
