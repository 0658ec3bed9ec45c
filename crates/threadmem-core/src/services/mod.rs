pub mod housekeeping;

pub use housekeeping::{BackfillReport, CleanupReport, MemoryStatistics};
