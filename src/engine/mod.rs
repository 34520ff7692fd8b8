pub mod aggregate;
pub mod metrics;
pub mod mistakes;
pub mod sequence_timing;
pub mod summary;
pub(crate) mod tally;
pub mod trend;

pub use aggregate::DateFilter;
pub use trend::Trend;
