use std::collections::VecDeque;

use crate::page::{FrameNumber, Page};

use super::ReplacementPolicy;

/// First-in first-out replacement.
///
/// Evicts whatever frame was admitted earliest, irrespective of how often
/// it has been accessed since. That blindness to recency is the defining
/// property of FIFO and is kept intact here.
///
/// The queue is not purged when a process frees its pages; an entry whose
/// frame has since been returned to the free pool is skipped when popped.
#[derive(Debug, Default)]
pub struct FifoPolicy {
    queue: VecDeque<FrameNumber>,
}

impl FifoPolicy {
    pub fn new() -> Self {
        FifoPolicy {
            queue: VecDeque::new(),
        }
    }
}

impl ReplacementPolicy for FifoPolicy {
    fn select_victim(&mut self, frames: &mut [Option<Page>]) -> Option<FrameNumber> {
        while let Some(frame) = self.queue.pop_front() {
            if frames[frame].is_some() {
                return Some(frame);
            }
            // stale entry for a frame that was freed in the meantime
            log::debug!("skipping stale FIFO entry for free frame {}", frame);
        }
        None
    }

    fn update_reference(&mut self, _page: &mut Page) {}

    fn on_admit(&mut self, frame: FrameNumber) {
        self.queue.push_back(frame);
    }
}
