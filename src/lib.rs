// Library for the binary and integration tests

pub mod collector;
pub mod config;
pub mod decoder;
pub mod error;
pub mod host_cpu;
pub mod limits;
pub mod metrics;
pub mod models;
pub mod render;
pub mod snapshot;
pub mod units;
pub mod version;
