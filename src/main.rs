use block_allocator::{AllocationStrategy, MemoryAllocator};
use memory_sim::{Algorithm, AlgorithmAnalyzer, VirtualMemoryManager};

const PAGE_SIZE: u64 = 4096;

fn main() {
    env_logger::init();

    println!("---- Virtual memory demo ----");
    let vm = VirtualMemoryManager::new(16 * PAGE_SIZE, PAGE_SIZE, Algorithm::Lru);

    vm.allocate_pages(1, 3).unwrap();
    vm.allocate_pages(2, 2).unwrap();
    println!("{}", vm.memory_map());

    for page in 0..5u64 {
        let _ = vm.access_memory(1, page * PAGE_SIZE, false);
    }
    for page in 0..3u64 {
        let _ = vm.access_memory(2, page * PAGE_SIZE, true);
    }
    println!("{}", vm.memory_map());
    println!("{:#?}", vm.get_memory_stats());

    vm.free_pages(1).unwrap();
    println!("after freeing process 1: {:?}", vm.get_memory_stats());

    println!("---- Algorithm comparison ----");
    let analyzer = AlgorithmAnalyzer::new();
    let pattern = [0u64, 1, 2, 3, 0, 1, 4, 5, 0, 1, 2, 3, 4, 5];
    let results = analyzer.compare_algorithms(&pattern, 4);
    println!("{}", analyzer.comparison_table(&results));

    println!("---- Block allocator demo ----");
    let mut allocator = MemoryAllocator::new(1024, AllocationStrategy::FirstFit);
    let a = allocator.allocate(128, Some(1)).unwrap();
    let b = allocator.allocate(256, Some(1)).unwrap();
    let c = allocator.allocate(64, Some(2)).unwrap();
    allocator.deallocate(b).unwrap();
    println!("{}", allocator.memory_map());

    allocator.deallocate(a).unwrap();
    allocator.deallocate(c).unwrap();
    allocator.defragment();
    println!("{:?}", allocator.get_memory_stats());
}
