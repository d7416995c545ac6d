/// Concurrent capacity-assignment pass.
pub mod balancer;
/// Device/source ownership and balancing triggers.
pub mod coordinator;
pub mod order;
/// Pass outcomes and progress events.
pub mod outcome;
pub mod summary;

pub use balancer::LoadBalancer;
pub use coordinator::{EnergyCoordinator, ToggleOutcome};
pub use order::ServiceOrder;
pub use outcome::{BalanceEvent, DeviceOutcome, Outcome, PassReport};
pub use summary::PassSummary;
