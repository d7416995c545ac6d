/// CSV export of balancing pass reports.
pub mod export;
