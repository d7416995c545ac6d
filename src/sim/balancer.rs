//! Concurrent load-balancing pass over powered-on devices.
//!
//! A pass seeds one shared budget with the active source's rated capacity and
//! launches one worker thread per powered-on device. Each worker holds the
//! budget lock for its whole walk over the source list, so decisions are
//! serialized even though workers run concurrently.
//!
//! The walk always starts at source index 0. If the budget covers the device,
//! the device is credited to the source at the current index and the budget is
//! reduced. Otherwise the budget is *replaced* by the next source's rated
//! capacity (any leftover is discarded) and the walk moves on. The budget value
//! carries over between devices; the scan index does not.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Sender, unbounded};
use parking_lot::{Condvar, Mutex};

use crate::devices::{Device, EnergySource};
use crate::error::HouseError;
use crate::logging::EventSink;

use super::order::ServiceOrder;
use super::outcome::{BalanceEvent, DeviceOutcome, Outcome, PassReport};

/// Snapshot of one powered-on device taken when the pass starts.
#[derive(Debug, Clone)]
struct Demand {
    device_index: usize,
    name: String,
    watts: f64,
}

/// State guarded by the pass-wide lock.
#[derive(Debug)]
struct Ledger {
    remaining_w: f64,
    next_turn: usize,
    outcomes: Vec<DeviceOutcome>,
}

/// The single shared budget plus the turn signal for ordered policies.
struct SharedBudget {
    ledger: Mutex<Ledger>,
    turn_changed: Condvar,
}

impl SharedBudget {
    fn new(initial_w: f64, workers: usize) -> Self {
        Self {
            ledger: Mutex::new(Ledger {
                remaining_w: initial_w,
                next_turn: 0,
                outcomes: Vec::with_capacity(workers),
            }),
            turn_changed: Condvar::new(),
        }
    }

    /// Takes the lock (waiting for `turn` if one is assigned), runs `decide`
    /// against the budget, and records the outcome before releasing.
    ///
    /// A panic in `decide` or while reporting the outcome is recorded as
    /// [`Outcome::WorkerFault`]; the turn advances either way.
    fn settle<F>(
        &self,
        demand: &Demand,
        turn: Option<usize>,
        sink: &dyn EventSink,
        events: &Sender<BalanceEvent>,
        decide: F,
    ) where
        F: FnOnce(&mut f64) -> Outcome,
    {
        let mut ledger = self.ledger.lock();
        if let Some(turn) = turn {
            while ledger.next_turn != turn {
                self.turn_changed.wait(&mut ledger);
            }
        }

        let outcome =
            match panic::catch_unwind(AssertUnwindSafe(|| decide(&mut ledger.remaining_w))) {
                Ok(outcome) => outcome,
                Err(payload) => Outcome::WorkerFault {
                    message: panic_message(payload.as_ref()),
                },
            };

        let mut record = DeviceOutcome {
            sequence: ledger.outcomes.len(),
            device_index: demand.device_index,
            device_name: demand.name.clone(),
            demand_w: demand.watts,
            outcome,
            remaining_after_w: ledger.remaining_w,
        };

        let reported = panic::catch_unwind(AssertUnwindSafe(|| announce(&record, sink, events)));
        if let Err(payload) = reported {
            record.outcome = Outcome::WorkerFault {
                message: format!("reporting failed: {}", panic_message(payload.as_ref())),
            };
            // best effort; the sink may keep failing
            let _ = panic::catch_unwind(AssertUnwindSafe(|| announce(&record, sink, events)));
        }

        ledger.outcomes.push(record);
        ledger.next_turn += 1;
        drop(ledger);
        self.turn_changed.notify_all();
    }
}

/// Logs `record` at the severity matching its outcome and streams it.
fn announce(record: &DeviceOutcome, sink: &dyn EventSink, events: &Sender<BalanceEvent>) {
    let line = record.to_string();
    match record.outcome {
        Outcome::Powered { .. } => sink.info(&line),
        Outcome::Unpowered => sink.warning(&line),
        Outcome::WorkerFault { .. } => sink.severe(&line),
    }
    // receiver may have been dropped by the caller
    let _ = events.send(BalanceEvent::Outcome(record.clone()));
}

/// Walks `sources` from index 0 looking for a budget that covers `demand_w`.
///
/// Mutates `remaining_w` in place: subtracts the demand on success, or resets
/// it to the next source's rated capacity when the current budget falls short.
pub fn walk_sources(remaining_w: &mut f64, demand_w: f64, sources: &[EnergySource]) -> Outcome {
    for (index, source) in sources.iter().enumerate() {
        if *remaining_w >= demand_w {
            *remaining_w -= demand_w;
            return Outcome::Powered {
                source_index: index,
                kind: source.kind(),
            };
        }
        if let Some(next) = sources.get(index + 1) {
            *remaining_w = next.rated_capacity();
        }
    }
    Outcome::Unpowered
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Runs balancing passes with a fixed service-order policy.
#[derive(Clone)]
pub struct LoadBalancer {
    order: ServiceOrder,
    sink: Arc<dyn EventSink>,
}

impl LoadBalancer {
    pub fn new(order: ServiceOrder, sink: Arc<dyn EventSink>) -> Self {
        Self { order, sink }
    }

    pub fn order(&self) -> ServiceOrder {
        self.order
    }

    pub fn set_order(&mut self, order: ServiceOrder) {
        self.order = order;
    }

    /// Runs a pass and returns the collected report.
    ///
    /// # Errors
    ///
    /// See [`LoadBalancer::balance_with_events`].
    pub fn balance(
        &self,
        devices: &[Device],
        sources: &[EnergySource],
        active: Option<usize>,
    ) -> Result<PassReport, HouseError> {
        let (tx, _rx) = unbounded();
        self.balance_with_events(devices, sources, active, &tx)
    }

    /// Runs a pass, streaming a [`BalanceEvent`] for each step to `events`.
    ///
    /// Blocks until every worker has been joined. Off devices are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`HouseError::NoActiveSource`] if `active` is `None` and
    /// [`HouseError::InvalidIndex`] if it does not point into `sources`. No
    /// worker is launched in either case.
    pub fn balance_with_events(
        &self,
        devices: &[Device],
        sources: &[EnergySource],
        active: Option<usize>,
        events: &Sender<BalanceEvent>,
    ) -> Result<PassReport, HouseError> {
        let Some(active_index) = active else {
            self.sink
                .warning("No active energy source set; load balancing skipped.");
            return Err(HouseError::NoActiveSource);
        };
        let active_source = sources.get(active_index).ok_or(HouseError::InvalidIndex {
            index: active_index,
            len: sources.len(),
        })?;

        let demands: Vec<Demand> = devices
            .iter()
            .enumerate()
            .filter(|(_, device)| device.is_on())
            .map(|(device_index, device)| Demand {
                device_index,
                name: device.name().to_string(),
                watts: device.consumption(),
            })
            .collect();

        let initial_budget_w = active_source.rated_capacity();
        self.sink.info("Balancing load across energy sources...");
        tracing::debug!(
            active = active_source.kind().label(),
            budget_w = initial_budget_w,
            workers = demands.len(),
            order = self.order.key(),
            "starting balancing pass"
        );
        let _ = events.send(BalanceEvent::Started {
            active: active_source.kind(),
            budget_w: initial_budget_w,
            workers: demands.len(),
        });

        let budget = SharedBudget::new(initial_budget_w, demands.len());
        let turns = self.order.turns(demands.len());
        let turn_of = |worker: usize| turns.as_ref().map(|t| t[worker]);
        let sink = self.sink.as_ref();

        let mut abandoned = Vec::new();
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(demands.len());
            let mut unspawned = Vec::new();

            for (worker, demand) in demands.iter().enumerate() {
                let turn = turn_of(worker);
                let budget = &budget;
                let spawned = thread::Builder::new()
                    .name(format!("balance-{worker}"))
                    .spawn_scoped(scope, move || {
                        budget.settle(demand, turn, sink, events, |remaining_w| {
                            walk_sources(remaining_w, demand.watts, sources)
                        });
                    });
                match spawned {
                    Ok(handle) => handles.push((demand, handle)),
                    Err(e) => unspawned.push((turn, demand, e.to_string())),
                }
            }

            // Settle spawn failures here, in turn order, so ordered workers
            // waiting on those turns are released.
            unspawned.sort_by_key(|(turn, _, _)| *turn);
            for (turn, demand, message) in unspawned {
                budget.settle(demand, turn, sink, events, |_| Outcome::WorkerFault {
                    message: format!("failed to spawn worker: {message}"),
                });
            }

            for (demand, handle) in handles {
                if let Err(payload) = handle.join() {
                    abandoned.push((demand, panic_message(payload.as_ref())));
                }
            }
        });

        let mut ledger = budget.ledger.into_inner();
        for (demand, message) in abandoned {
            if ledger
                .outcomes
                .iter()
                .any(|o| o.device_index == demand.device_index)
            {
                continue;
            }
            let record = DeviceOutcome {
                sequence: ledger.outcomes.len(),
                device_index: demand.device_index,
                device_name: demand.name.clone(),
                demand_w: demand.watts,
                outcome: Outcome::WorkerFault {
                    message: format!("worker terminated abnormally: {message}"),
                },
                remaining_after_w: ledger.remaining_w,
            };
            let _ = panic::catch_unwind(AssertUnwindSafe(|| announce(&record, sink, events)));
            ledger.outcomes.push(record);
        }
        let report = PassReport {
            active: active_source.kind(),
            initial_budget_w,
            final_remaining_w: ledger.remaining_w,
            outcomes: ledger.outcomes,
        };

        let _ = events.send(report.completed_event());
        tracing::debug!(
            powered = report.powered_count(),
            unpowered = report.unpowered_count(),
            faults = report.fault_count(),
            "balancing pass completed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::SourceKind;
    use crate::logging::{LogRecord, MemorySink, Severity};

    fn house_sources() -> Vec<EnergySource> {
        vec![
            EnergySource::solar(500.0),
            EnergySource::city(1000.0),
            EnergySource::diesel(800.0),
        ]
    }

    fn balancer(order: ServiceOrder) -> (LoadBalancer, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (LoadBalancer::new(order, sink.clone()), sink)
    }

    #[test]
    fn walk_takes_first_budget_that_fits() {
        let sources = house_sources();
        let mut remaining = 500.0;
        let outcome = walk_sources(&mut remaining, 200.0, &sources);
        assert_eq!(
            outcome,
            Outcome::Powered {
                source_index: 0,
                kind: SourceKind::Solar
            }
        );
        assert_eq!(remaining, 300.0);
    }

    #[test]
    fn walk_resets_rather_than_accumulates() {
        let sources = house_sources();
        let mut remaining = 100.0;
        let outcome = walk_sources(&mut remaining, 200.0, &sources);
        assert_eq!(
            outcome,
            Outcome::Powered {
                source_index: 1,
                kind: SourceKind::City
            }
        );
        // 1000 from City, the 100 left over is discarded
        assert_eq!(remaining, 800.0);
    }

    #[test]
    fn walk_reports_unpowered_after_last_source() {
        let sources = house_sources();
        let mut remaining = 500.0;
        let outcome = walk_sources(&mut remaining, 5000.0, &sources);
        assert_eq!(outcome, Outcome::Unpowered);
        // left at the last source's rated capacity
        assert_eq!(remaining, 800.0);
    }

    #[test]
    fn walk_over_empty_sources_is_unpowered() {
        let mut remaining = 0.0;
        assert_eq!(walk_sources(&mut remaining, 10.0, &[]), Outcome::Unpowered);
    }

    #[test]
    fn off_devices_spawn_no_worker() {
        let (balancer, _) = balancer(ServiceOrder::Collection);
        let devices = vec![Device::new("Lamp", 100.0), Device::with_state("TV", 200.0, true)];
        let report = balancer
            .balance(&devices, &house_sources(), Some(0))
            .expect("pass should run");
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].device_name, "TV");
        assert_eq!(report.outcomes[0].device_index, 1);
    }

    #[test]
    fn missing_active_source_is_an_error() {
        let (balancer, sink) = balancer(ServiceOrder::Collection);
        let devices = vec![Device::with_state("Lamp", 100.0, true)];
        let err = balancer.balance(&devices, &[], None);
        assert_eq!(err, Err(HouseError::NoActiveSource));
        assert!(sink.contains(Severity::Warning, "No active energy source"));
    }

    #[test]
    fn stale_active_index_is_an_error() {
        let (balancer, _) = balancer(ServiceOrder::Collection);
        let err = balancer.balance(&[], &house_sources(), Some(3));
        assert_eq!(err, Err(HouseError::InvalidIndex { index: 3, len: 3 }));
    }

    #[test]
    fn events_stream_start_outcomes_and_completion() {
        let (balancer, _) = balancer(ServiceOrder::Collection);
        let devices = vec![
            Device::with_state("Lamp", 100.0, true),
            Device::with_state("Heater", 5000.0, true),
        ];
        let (tx, rx) = unbounded();
        let report = balancer
            .balance_with_events(&devices, &house_sources(), Some(0), &tx)
            .expect("pass should run");
        drop(tx);

        let events: Vec<BalanceEvent> = rx.iter().collect();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            BalanceEvent::Started {
                active: SourceKind::Solar,
                budget_w: 500.0,
                workers: 2
            }
        );
        assert_eq!(events[1], BalanceEvent::Outcome(report.outcomes[0].clone()));
        assert_eq!(
            events[3],
            BalanceEvent::Completed {
                powered: 1,
                unpowered: 1,
                faults: 0
            }
        );
    }

    #[test]
    fn panicking_decision_becomes_worker_fault() {
        let budget = SharedBudget::new(100.0, 2);
        let sink = MemorySink::new();
        let (tx, _rx) = unbounded();
        let demand = Demand {
            device_index: 0,
            name: "Toaster".to_string(),
            watts: 50.0,
        };

        budget.settle(&demand, Some(0), &sink, &tx, |_| panic!("relay stuck"));
        budget.settle(&demand, Some(1), &sink, &tx, |remaining| {
            walk_sources(remaining, 50.0, &[EnergySource::solar(100.0)])
        });

        let ledger = budget.ledger.into_inner();
        assert_eq!(
            ledger.outcomes[0].outcome,
            Outcome::WorkerFault {
                message: "relay stuck".to_string()
            }
        );
        assert!(ledger.outcomes[1].outcome.is_powered());
        assert_eq!(ledger.remaining_w, 50.0);
        assert!(sink.contains(Severity::Severe, "relay stuck"));
    }

    /// Sink that panics on one message and records the rest.
    struct FailingSink {
        trigger: &'static str,
        inner: MemorySink,
    }

    impl EventSink for FailingSink {
        fn emit(&self, severity: Severity, message: &str) {
            if message.contains(self.trigger) {
                panic!("log target unavailable");
            }
            self.inner.emit(severity, message);
        }
    }

    fn pass_with_failing_sink(order: ServiceOrder) -> (PassReport, Vec<LogRecord>) {
        let sink = Arc::new(FailingSink {
            trigger: "Lamp is powered",
            inner: MemorySink::new(),
        });
        let balancer = LoadBalancer::new(order, sink.clone());
        let devices = vec![
            Device::with_state("Lamp", 100.0, true),
            Device::with_state("TV", 200.0, true),
        ];
        let (tx, rx) = unbounded();
        let report = balancer
            .balance_with_events(&devices, &[EnergySource::solar(500.0)], Some(0), &tx)
            .expect("pass should run");
        drop(tx);
        assert_eq!(rx.iter().count(), report.outcomes.len() + 2);
        (report, sink.inner.records())
    }

    #[test]
    fn failing_sink_in_collection_order_faults_one_device() {
        let (report, lines) = pass_with_failing_sink(ServiceOrder::Collection);

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(
            report.outcome_for("Lamp"),
            Some(&Outcome::WorkerFault {
                message: "reporting failed: log target unavailable".to_string()
            })
        );
        assert!(report.outcome_for("TV").is_some_and(Outcome::is_powered));
        assert_eq!(report.final_remaining_w, 200.0);
        assert!(lines.iter().any(|r| {
            r.severity == Severity::Severe && r.message.starts_with("Lamp could not be balanced")
        }));
    }

    #[test]
    fn failing_sink_in_scheduler_order_keeps_every_device() {
        for _ in 0..10 {
            let (report, _) = pass_with_failing_sink(ServiceOrder::Scheduler);
            assert_eq!(report.outcomes.len(), 2);
            assert_eq!(report.fault_count(), 1);
            assert!(matches!(
                report.outcome_for("Lamp"),
                Some(Outcome::WorkerFault { .. })
            ));
            assert!(report.outcome_for("TV").is_some_and(Outcome::is_powered));
        }
    }

    #[test]
    fn outcomes_are_logged_with_matching_severity() {
        let (balancer, sink) = balancer(ServiceOrder::Collection);
        let devices = vec![
            Device::with_state("Lamp", 100.0, true),
            Device::with_state("Heater", 5000.0, true),
        ];
        balancer
            .balance(&devices, &house_sources(), Some(0))
            .expect("pass should run");
        assert!(sink.contains(Severity::Info, "Lamp is powered by Solar Panel"));
        assert!(sink.contains(
            Severity::Warning,
            "Heater cannot be powered due to insufficient capacity."
        ));
    }
}
