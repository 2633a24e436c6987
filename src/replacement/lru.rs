use crate::page::{FrameNumber, Page};

use super::ReplacementPolicy;

/// Least-recently-used replacement.
///
/// Keeps no state of its own: victim selection scans the frame table for
/// the smallest access tick. Ties go to the lowest frame index, which the
/// strict `<` comparison gives for free.
#[derive(Debug, Default)]
pub struct LruPolicy;

impl LruPolicy {
    pub fn new() -> Self {
        LruPolicy
    }
}

impl ReplacementPolicy for LruPolicy {
    fn select_victim(&mut self, frames: &mut [Option<Page>]) -> Option<FrameNumber> {
        let mut victim = None;
        let mut oldest = u64::MAX;
        for (frame, slot) in frames.iter().enumerate() {
            if let Some(page) = slot {
                if page.last_access < oldest {
                    oldest = page.last_access;
                    victim = Some(frame);
                }
            }
        }
        victim
    }

    fn update_reference(&mut self, _page: &mut Page) {
        // The manager refreshes `last_access` on every hit, which is all
        // the recency information LRU reads.
    }

    fn on_admit(&mut self, _frame: FrameNumber) {}
}
