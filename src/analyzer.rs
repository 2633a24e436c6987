//! Comparison harness for the page replacement algorithms.
//!
//! Drives a fresh, independent [`VirtualMemoryManager`] through a scripted
//! access trace per algorithm and reports the resulting statistics. Fault
//! and hit counts are deterministic for a given trace; the measured
//! execution time is the only nondeterministic field.

use std::fmt::Write as _;
use std::time::{Duration, Instant};

use crate::page::PageNumber;
use crate::replacement::Algorithm;
use crate::virtual_memory::{MemoryStats, VirtualMemoryManager};

const PAGE_SIZE: u64 = 4096;

/// Process id the harness allocates and accesses under.
const HARNESS_PID: u32 = 1;

/// Final manager statistics for one run, plus the wall-clock duration of
/// the access loop.
#[derive(Debug, Clone)]
pub struct AlgorithmReport {
    pub stats: MemoryStats,
    pub execution_time: Duration,
}

#[derive(Debug, Default)]
pub struct AlgorithmAnalyzer;

impl AlgorithmAnalyzer {
    pub fn new() -> Self {
        AlgorithmAnalyzer
    }

    /// Runs `access_pattern` (a sequence of page numbers) against a fresh
    /// manager with `memory_size_in_pages` physical frames.
    pub fn analyze_algorithm(
        &self,
        algorithm: Algorithm,
        access_pattern: &[PageNumber],
        memory_size_in_pages: usize,
    ) -> AlgorithmReport {
        let vm = VirtualMemoryManager::new(
            memory_size_in_pages as u64 * PAGE_SIZE,
            PAGE_SIZE,
            algorithm,
        );
        vm.allocate_pages(HARNESS_PID, 1)
            .expect("harness memory holds at least one page");

        let start = Instant::now();
        for &page_number in access_pattern {
            let _ = vm.access_memory(HARNESS_PID, page_number * PAGE_SIZE, false);
        }
        let execution_time = start.elapsed();

        AlgorithmReport {
            stats: vm.get_memory_stats(),
            execution_time,
        }
    }

    /// Runs every algorithm against its own manager instance. No state is
    /// shared between runs.
    pub fn compare_algorithms(
        &self,
        access_pattern: &[PageNumber],
        memory_size_in_pages: usize,
    ) -> Vec<(Algorithm, AlgorithmReport)> {
        Algorithm::ALL
            .iter()
            .map(|&algorithm| {
                (
                    algorithm,
                    self.analyze_algorithm(algorithm, access_pattern, memory_size_in_pages),
                )
            })
            .collect()
    }

    /// Formats comparison results as a table for display.
    pub fn comparison_table(&self, results: &[(Algorithm, AlgorithmReport)]) -> String {
        let mut out = String::new();
        writeln!(
            out,
            "{:<10} {:<8} {:<8} {:<12} {:<12}",
            "algorithm", "faults", "hits", "fault rate", "time"
        )
        .unwrap();
        for (algorithm, report) in results {
            writeln!(
                out,
                "{:<10} {:<8} {:<8} {:<12} {:<12}",
                algorithm.name(),
                report.stats.page_faults,
                report.stats.page_hits,
                format!("{:.2}%", report.stats.fault_rate * 100.0),
                format!("{:.2?}", report.execution_time),
            )
            .unwrap();
        }
        out
    }
}
