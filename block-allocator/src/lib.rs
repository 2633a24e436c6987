//! Contiguous memory block allocator with first/best/worst-fit placement.
//!
//! Secondary component of the memory simulator: manages a single span of
//! simulated memory as an address-ordered list of variable-sized blocks.
//! Not used by the paging core, which works in fixed-size frames.

use log::{info, warn};
use std::fmt::Write as _;

pub type ProcessId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationStrategy {
    FirstFit,
    BestFit,
    WorstFit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocatorError {
    InvalidSize,
    OutOfMemory,
    InvalidAddress,
}

/// One span of the managed memory. Blocks are kept sorted by start
/// address and cover the whole span without gaps or overlap.
#[derive(Debug, Clone)]
struct MemoryBlock {
    start: u64,
    size: u64,
    free: bool,
    owner: Option<ProcessId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocatorStats {
    pub total_memory: u64,
    pub allocated_memory: u64,
    pub free_memory: u64,
    pub allocation_count: u64,
    pub deallocation_count: u64,
    pub merge_count: u64,
    /// Fraction of total memory currently allocated, in percent.
    pub utilization: f64,
}

pub struct MemoryAllocator {
    total_memory: u64,
    strategy: AllocationStrategy,
    blocks: Vec<MemoryBlock>,
    allocated_memory: u64,
    allocation_count: u64,
    deallocation_count: u64,
    merge_count: u64,
}

impl MemoryAllocator {
    pub fn new(total_memory: u64, strategy: AllocationStrategy) -> Self {
        assert!(total_memory > 0, "managed memory must be non-empty");
        info!(
            "block allocator initialized: {} bytes, {:?}",
            total_memory, strategy
        );
        MemoryAllocator {
            total_memory,
            strategy,
            blocks: vec![MemoryBlock {
                start: 0,
                size: total_memory,
                free: true,
                owner: None,
            }],
            allocated_memory: 0,
            allocation_count: 0,
            deallocation_count: 0,
            merge_count: 0,
        }
    }

    /// Allocates `size` bytes, returning the start address of the block.
    pub fn allocate(
        &mut self,
        size: u64,
        process_id: Option<ProcessId>,
    ) -> Result<u64, AllocatorError> {
        if size == 0 {
            warn!("rejected zero-sized allocation");
            return Err(AllocatorError::InvalidSize);
        }
        let index = self.find_block(size).ok_or_else(|| {
            warn!("no block fits allocation of {} bytes", size);
            AllocatorError::OutOfMemory
        })?;

        let block = &mut self.blocks[index];
        let address = block.start;
        if block.size == size {
            block.free = false;
            block.owner = process_id;
        } else {
            // split: the tail of the chosen block stays free
            let remainder = MemoryBlock {
                start: block.start + size,
                size: block.size - size,
                free: true,
                owner: None,
            };
            block.size = size;
            block.free = false;
            block.owner = process_id;
            self.blocks.insert(index + 1, remainder);
        }
        self.allocation_count += 1;
        self.allocated_memory += size;
        Ok(address)
    }

    /// Frees the block starting exactly at `address` and merges it with
    /// adjacent free blocks.
    pub fn deallocate(&mut self, address: u64) -> Result<(), AllocatorError> {
        let index = self
            .blocks
            .iter()
            .position(|block| block.start == address && !block.free)
            .ok_or_else(|| {
                warn!("invalid deallocation address {}", address);
                AllocatorError::InvalidAddress
            })?;

        let block = &mut self.blocks[index];
        block.free = true;
        block.owner = None;
        self.deallocation_count += 1;
        self.allocated_memory -= block.size;
        self.merge_free_blocks();
        Ok(())
    }

    fn find_block(&self, size: u64) -> Option<usize> {
        let candidates = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| block.free && block.size >= size);
        match self.strategy {
            AllocationStrategy::FirstFit => candidates.map(|(i, _)| i).next(),
            AllocationStrategy::BestFit => candidates
                .min_by_key(|(_, block)| block.size)
                .map(|(i, _)| i),
            AllocationStrategy::WorstFit => candidates
                .max_by_key(|(_, block)| block.size)
                .map(|(i, _)| i),
        }
    }

    fn merge_free_blocks(&mut self) {
        let mut i = 0;
        while i + 1 < self.blocks.len() {
            if self.blocks[i].free && self.blocks[i + 1].free {
                let merged = self.blocks.remove(i + 1);
                self.blocks[i].size += merged.size;
                self.merge_count += 1;
            } else {
                i += 1;
            }
        }
    }

    /// Moves every allocated block to the front of the span, leaving one
    /// free block at the tail. Addresses of live allocations change.
    pub fn defragment(&mut self) {
        info!("defragmenting block allocator");
        let mut compacted: Vec<MemoryBlock> = Vec::new();
        let mut cursor = 0;
        for block in self.blocks.drain(..).filter(|block| !block.free) {
            compacted.push(MemoryBlock {
                start: cursor,
                size: block.size,
                free: false,
                owner: block.owner,
            });
            cursor += block.size;
        }
        if cursor < self.total_memory {
            compacted.push(MemoryBlock {
                start: cursor,
                size: self.total_memory - cursor,
                free: true,
                owner: None,
            });
        }
        self.blocks = compacted;
    }

    pub fn get_memory_stats(&self) -> AllocatorStats {
        AllocatorStats {
            total_memory: self.total_memory,
            allocated_memory: self.allocated_memory,
            free_memory: self.total_memory - self.allocated_memory,
            allocation_count: self.allocation_count,
            deallocation_count: self.deallocation_count,
            merge_count: self.merge_count,
            utilization: self.allocated_memory as f64 / self.total_memory as f64 * 100.0,
        }
    }

    /// Formats the block list for display, one line per block.
    pub fn memory_map(&self) -> String {
        let mut out = String::new();
        writeln!(out, "{:<12} {:<10} {:<10} {:<8}", "start", "size", "state", "pid").unwrap();
        for block in &self.blocks {
            writeln!(
                out,
                "{:<12} {:<10} {:<10} {:<8}",
                block.start,
                block.size,
                if block.free { "FREE" } else { "ALLOCATED" },
                block
                    .owner
                    .map(|pid| pid.to_string())
                    .unwrap_or_else(|| "-".into()),
            )
            .unwrap();
        }
        out
    }
}
