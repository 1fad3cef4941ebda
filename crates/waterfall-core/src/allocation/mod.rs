pub mod engine;

pub use engine::{
    allocate, allocate_tranches, analyze_allocation, analyze_allocation_with, structure_metrics,
    Allocation, AllocationInput, AllocationOutput, StructureMetrics,
};
