pub mod backup;
pub mod clean;
pub mod collect;
pub mod config;
pub mod db;
pub mod export;
pub mod ingest;
pub mod init;
pub mod log;
pub mod predict;
pub mod quality;
pub mod report;
pub mod stats;
pub mod train;
