pub mod disk;
pub mod memory;

pub use disk::DiskStore;
pub use memory::{MemoryExpenses, MemoryRates, MemoryUsers};
