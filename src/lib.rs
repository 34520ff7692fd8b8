// Analytics library shared by the `keypace` CLI, the sample-history generator
// and the criterion benchmarks.

pub mod config;
pub mod engine;
pub mod session;
pub mod store;
