//! Post-hoc summary of a balancing pass.

use std::fmt;

use crate::devices::EnergySource;

use super::outcome::{Outcome, PassReport};

/// Aggregate figures derived from a completed [`PassReport`].
///
/// Computed after the pass so the summary always agrees with the per-device
/// outcomes it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct PassSummary {
    /// Number of devices assigned to a source.
    pub powered: usize,
    /// Number of devices no source could cover.
    pub unpowered: usize,
    /// Number of workers that failed.
    pub faults: usize,
    /// Watts assigned to any source.
    pub served_w: f64,
    /// Watts left without a source (unpowered or faulted devices).
    pub unserved_w: f64,
    /// Watts credited per source, indexed like the source list.
    pub credited_w: Vec<f64>,
    /// Source labels, indexed like `credited_w`.
    pub labels: Vec<&'static str>,
}

impl PassSummary {
    /// Computes the summary for `report` against the source list it ran on.
    pub fn from_report(report: &PassReport, sources: &[EnergySource]) -> Self {
        let mut served_w = 0.0;
        let mut unserved_w = 0.0;
        for o in &report.outcomes {
            match o.outcome {
                Outcome::Powered { .. } => served_w += o.demand_w,
                Outcome::Unpowered | Outcome::WorkerFault { .. } => unserved_w += o.demand_w,
            }
        }

        Self {
            powered: report.powered_count(),
            unpowered: report.unpowered_count(),
            faults: report.fault_count(),
            served_w,
            unserved_w,
            credited_w: (0..sources.len()).map(|i| report.credited_w(i)).collect(),
            labels: sources.iter().map(|s| s.kind().label()).collect(),
        }
    }

    /// Fraction of requested watts that were served, in `[0.0, 1.0]`.
    pub fn served_ratio(&self) -> f64 {
        let total = self.served_w + self.unserved_w;
        if total > 0.0 { self.served_w / total } else { 1.0 }
    }
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Balancing Summary ---")?;
        writeln!(
            f,
            "Powered: {}  Unpowered: {}  Faults: {}",
            self.powered, self.unpowered, self.faults
        )?;
        writeln!(
            f,
            "Served: {:.1} W  Unserved: {:.1} W ({:.1}% served)",
            self.served_w,
            self.unserved_w,
            self.served_ratio() * 100.0
        )?;
        for (label, watts) in self.labels.iter().zip(&self.credited_w) {
            writeln!(f, "  {label}: {watts:.1} W")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::SourceKind;
    use crate::sim::outcome::DeviceOutcome;

    fn report(outcomes: Vec<(f64, Outcome)>) -> PassReport {
        PassReport {
            active: SourceKind::Solar,
            initial_budget_w: 500.0,
            final_remaining_w: 0.0,
            outcomes: outcomes
                .into_iter()
                .enumerate()
                .map(|(i, (demand_w, outcome))| DeviceOutcome {
                    sequence: i,
                    device_index: i,
                    device_name: format!("dev{i}"),
                    demand_w,
                    outcome,
                    remaining_after_w: 0.0,
                })
                .collect(),
        }
    }

    #[test]
    fn empty_pass_is_fully_served() {
        let summary = PassSummary::from_report(&report(vec![]), &[EnergySource::solar(500.0)]);
        assert_eq!(summary.powered, 0);
        assert_eq!(summary.credited_w, vec![0.0]);
        assert_eq!(summary.served_ratio(), 1.0);
    }

    #[test]
    fn splits_served_and_unserved_watts() {
        let sources = [EnergySource::solar(500.0), EnergySource::city(1000.0)];
        let summary = PassSummary::from_report(
            &report(vec![
                (
                    100.0,
                    Outcome::Powered {
                        source_index: 0,
                        kind: SourceKind::Solar,
                    },
                ),
                (
                    300.0,
                    Outcome::Powered {
                        source_index: 1,
                        kind: SourceKind::City,
                    },
                ),
                (400.0, Outcome::Unpowered),
            ]),
            &sources,
        );
        assert_eq!(summary.powered, 2);
        assert_eq!(summary.unpowered, 1);
        assert_eq!(summary.served_w, 400.0);
        assert_eq!(summary.unserved_w, 400.0);
        assert_eq!(summary.credited_w, vec![100.0, 300.0]);
        assert!((summary.served_ratio() - 0.5).abs() < 1e-12);

        let text = summary.to_string();
        assert!(text.contains("City Power: 300.0 W"));
        assert!(text.contains("(50.0% served)"));
    }
}
