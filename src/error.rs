use derive_more::{Display, Error};

/// Why the slot array could not be grown.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// The requested capacity does not fit in the address space.
    #[display("capacity overflow")]
    CapacityOverflow,
    /// The allocator refused a slot array of `capacity` slots.
    #[display("failed to allocate {capacity} slots")]
    AllocationFailure { capacity: usize },
}
