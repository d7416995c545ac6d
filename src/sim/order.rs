//! Policies deciding the order in which balancing workers take the shared budget.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Order in which concurrently launched workers are serviced.
///
/// Every policy launches one worker per powered-on device at the same time
/// and serializes the full assignment walk under one lock. They differ only
/// in who gets the lock next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceOrder {
    /// Workers race for the lock; the OS scheduler decides the order.
    Scheduler,
    /// Workers are serviced in device collection order.
    #[default]
    Collection,
    /// Workers are serviced in a permutation drawn from `seed`.
    Shuffled { seed: u64 },
}

impl ServiceOrder {
    /// Accepted configuration keys.
    pub const KEYS: &[&str] = &["scheduler", "collection", "shuffled"];

    /// Parses a configuration key. `seed` is only used by `"shuffled"`.
    pub fn from_key(key: &str, seed: u64) -> Option<Self> {
        match key {
            "scheduler" => Some(Self::Scheduler),
            "collection" => Some(Self::Collection),
            "shuffled" => Some(Self::Shuffled { seed }),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Scheduler => "scheduler",
            Self::Collection => "collection",
            Self::Shuffled { .. } => "shuffled",
        }
    }

    /// Returns the turn assigned to each of `workers` workers, indexed by
    /// worker, or `None` when workers race for the lock.
    pub fn turns(&self, workers: usize) -> Option<Vec<usize>> {
        match *self {
            Self::Scheduler => None,
            Self::Collection => Some((0..workers).collect()),
            Self::Shuffled { seed } => {
                let mut service: Vec<usize> = (0..workers).collect();
                service.shuffle(&mut StdRng::seed_from_u64(seed));

                // invert: service[turn] = worker  ->  turns[worker] = turn
                let mut turns = vec![0; workers];
                for (turn, worker) in service.into_iter().enumerate() {
                    turns[worker] = turn;
                }
                Some(turns)
            }
        }
    }
}
