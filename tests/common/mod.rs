//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use smarthouse_sim::devices::{Device, EnergySource};
use smarthouse_sim::logging::MemorySink;
use smarthouse_sim::sim::{EnergyCoordinator, LoadBalancer, ServiceOrder};

/// Default sources: Solar 500 W, City 1000 W, Diesel 800 W.
pub fn house_sources() -> Vec<EnergySource> {
    vec![
        EnergySource::solar(500.0),
        EnergySource::city(1000.0),
        EnergySource::diesel(800.0),
    ]
}

/// Default appliances in collection order, all switched on.
pub fn house_devices_on() -> Vec<Device> {
    vec![
        Device::with_state("Lamp", 100.0, true),
        Device::with_state("AC", 300.0, true),
        Device::with_state("TV", 200.0, true),
        Device::with_state("Fridge", 300.0, true),
    ]
}

/// Default appliances in collection order, all switched off.
pub fn house_devices_off() -> Vec<Device> {
    vec![
        Device::new("Lamp", 100.0),
        Device::new("AC", 300.0),
        Device::new("TV", 200.0),
        Device::new("Fridge", 300.0),
    ]
}

/// Balancer and coordinator sharing one in-memory sink.
pub fn coordinator(
    devices: Vec<Device>,
    sources: Vec<EnergySource>,
    order: ServiceOrder,
) -> (EnergyCoordinator, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let balancer = LoadBalancer::new(order, sink.clone());
    (
        EnergyCoordinator::new(devices, sources, balancer, sink.clone()),
        sink,
    )
}
