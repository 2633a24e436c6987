use crate::page::{FrameNumber, Page};

use super::ReplacementPolicy;

/// Clock (second-chance) replacement.
///
/// A hand rotates over the frame table. A frame whose reference bit is
/// clear is taken; a set bit is cleared and the hand moves on, giving the
/// page a second chance. Free frames found under the hand are claimed
/// directly. If one full lap clears every bit without finding a victim,
/// all bits are reset and frame 0 is taken unconditionally, bounding the
/// scan at two laps.
#[derive(Debug, Default)]
pub struct ClockPolicy {
    hand: FrameNumber,
}

impl ClockPolicy {
    pub fn new() -> Self {
        ClockPolicy { hand: 0 }
    }
}

impl ReplacementPolicy for ClockPolicy {
    fn select_victim(&mut self, frames: &mut [Option<Page>]) -> Option<FrameNumber> {
        if frames.is_empty() {
            return None;
        }
        let start = self.hand;
        loop {
            let frame = self.hand;
            self.hand = (frame + 1) % frames.len();
            match frames[frame].as_mut() {
                None => return Some(frame),
                Some(page) if !page.reference_bit => return Some(frame),
                Some(page) => {
                    page.reference_bit = false;
                    if self.hand == start {
                        // every bit was set; reset them all and fall back
                        // to frame 0 instead of scanning again
                        for page in frames.iter_mut().flatten() {
                            page.reference_bit = false;
                        }
                        return Some(0);
                    }
                }
            }
        }
    }

    fn update_reference(&mut self, page: &mut Page) {
        page.reference_bit = true;
    }

    fn on_admit(&mut self, _frame: FrameNumber) {}
}
