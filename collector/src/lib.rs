pub mod collector;
pub mod config;
pub mod dedup;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod report;
pub mod scheduler;
pub mod sinks;
