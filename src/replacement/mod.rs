//! Page replacement policies.
//!
//! A policy picks the frame the next faulting page should be loaded into
//! once the free pool is exhausted, and maintains whatever per-access
//! metadata its algorithm needs. All policies operate on the manager's
//! frame table and are swapped as a unit by
//! [`VirtualMemoryManager::set_replacement_algorithm`](crate::virtual_memory::VirtualMemoryManager::set_replacement_algorithm).

mod clock;
mod fifo;
mod lru;

use std::fmt;

pub use clock::ClockPolicy;
pub use fifo::FifoPolicy;
pub use lru::LruPolicy;

use crate::page::{FrameNumber, Page};

/// Selector for the active page replacement algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Fifo,
    Lru,
    Clock,
}

impl Algorithm {
    /// All supported algorithms, in comparison-harness order.
    pub const ALL: [Algorithm; 3] = [Algorithm::Fifo, Algorithm::Lru, Algorithm::Clock];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Fifo => "FIFO",
            Algorithm::Lru => "LRU",
            Algorithm::Clock => "Clock",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pluggable eviction policy.
///
/// `frames` is the manager's frame table; an occupied slot holds the page
/// resident in that frame. The policy returns the frame to fill and the
/// manager takes care of removing the current occupant, so a policy may
/// also return a frame it found free (Clock does).
pub trait ReplacementPolicy: Send {
    /// Picks the frame the incoming page should be loaded into, or `None`
    /// if the policy has no candidate.
    fn select_victim(&mut self, frames: &mut [Option<Page>]) -> Option<FrameNumber>;

    /// Called on every hit with the accessed page. The manager has already
    /// refreshed the page's access tick and counters.
    fn update_reference(&mut self, page: &mut Page);

    /// Called for every newly filled frame, both on fresh allocation and
    /// on the eviction-fill path. Only FIFO tracks admission order.
    fn on_admit(&mut self, frame: FrameNumber);
}

/// Builds a fresh policy instance for `algorithm`.
pub fn create_policy(algorithm: Algorithm) -> Box<dyn ReplacementPolicy> {
    match algorithm {
        Algorithm::Fifo => Box::new(FifoPolicy::new()),
        Algorithm::Lru => Box::new(LruPolicy::new()),
        Algorithm::Clock => Box::new(ClockPolicy::new()),
    }
}
