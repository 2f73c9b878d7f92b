pub mod aggregator;
pub mod analyzer;
pub mod backup;
pub mod classifier;
pub mod cleaner;
pub mod collector;
pub mod config;
pub mod log;
