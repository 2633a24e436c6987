pub mod analyzer;
pub mod page;
pub mod page_table;
pub mod replacement;
pub mod virtual_memory;

pub use analyzer::{AlgorithmAnalyzer, AlgorithmReport};
pub use page::{FrameNumber, Page, PageNumber, PageState, ProcessId};
pub use page_table::PageTable;
pub use replacement::{Algorithm, ReplacementPolicy};
pub use virtual_memory::{AccessOutcome, MemoryError, MemoryStats, VirtualMemoryManager};
