//! Per-process page table: virtual page number to physical frame.

use std::collections::HashMap;

use crate::page::{FrameNumber, PageNumber};

/// Mapping from a process's virtual pages to the frames they occupy.
///
/// Created lazily on the first allocation for a process and dropped as a
/// whole when the process frees its pages. Entries are frame indices into
/// the manager's frame table; the pages themselves live there.
#[derive(Debug, Default)]
pub struct PageTable {
    entries: HashMap<PageNumber, FrameNumber>,
}

impl PageTable {
    pub fn new() -> Self {
        PageTable {
            entries: HashMap::new(),
        }
    }

    pub fn map_to_frame(&mut self, page_number: PageNumber, frame_number: FrameNumber) {
        self.entries.insert(page_number, frame_number);
    }

    pub fn get_frame(&self, page_number: PageNumber) -> Option<FrameNumber> {
        self.entries.get(&page_number).copied()
    }

    pub fn unmap_page(&mut self, page_number: PageNumber) -> bool {
        self.entries.remove(&page_number).is_some()
    }

    pub fn contains(&self, page_number: PageNumber) -> bool {
        self.entries.contains_key(&page_number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PageNumber, FrameNumber)> + '_ {
        self.entries.iter().map(|(&page, &frame)| (page, frame))
    }
}
