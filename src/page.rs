//! Page metadata kept for every resident virtual page.

/// Process identifier. Issued by the process-lifecycle layer; this crate
/// never generates ids itself.
pub type ProcessId = u32;

/// Index of a virtual page within a process address space.
pub type PageNumber = u64;

/// Index of a physical frame in the frame table.
pub type FrameNumber = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Free,
    Allocated,
    SwappedOut,
}

/// One virtual page resident in a physical frame.
///
/// A `Page` lives in exactly one slot of the frame table (the slot equal
/// to `frame_number`); the owning process page table only stores the frame
/// index, never a second copy of the page.
#[derive(Debug, Clone)]
pub struct Page {
    pub page_number: PageNumber,
    pub size: u64,
    pub state: PageState,
    pub owner: ProcessId,
    pub frame_number: FrameNumber,
    /// Logical access tick issued by the manager, monotonic per instance.
    pub last_access: u64,
    pub modified: bool,
    pub reference_count: u64,
    /// Used by the Clock policy only.
    pub reference_bit: bool,
}

impl Page {
    pub fn new(
        page_number: PageNumber,
        size: u64,
        owner: ProcessId,
        frame_number: FrameNumber,
        tick: u64,
    ) -> Self {
        Page {
            page_number,
            size,
            state: PageState::Allocated,
            owner,
            frame_number,
            last_access: tick,
            modified: false,
            reference_count: 0,
            reference_bit: false,
        }
    }

    /// Records one access to this page.
    pub fn touch(&mut self, tick: u64, is_write: bool) {
        self.last_access = tick;
        self.reference_count += 1;
        self.modified = self.modified || is_write;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_page_is_allocated_and_clean() {
        let page = Page::new(3, 4096, 1, 7, 10);
        assert_eq!(page.state, PageState::Allocated);
        assert_eq!(page.frame_number, 7);
        assert_eq!(page.last_access, 10);
        assert!(!page.modified);
        assert!(!page.reference_bit);
        assert_eq!(page.reference_count, 0);
    }

    #[test]
    fn touch_updates_access_metadata() {
        let mut page = Page::new(0, 4096, 1, 0, 1);
        page.touch(5, false);
        page.touch(9, true);
        page.touch(12, false);
        assert_eq!(page.last_access, 12);
        assert_eq!(page.reference_count, 3);
        // dirty bit is sticky
        assert!(page.modified);
    }
}
