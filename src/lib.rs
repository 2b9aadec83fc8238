pub mod api;
pub mod config;
pub mod probe;
pub mod recorder;
pub mod scheduler;
pub mod storage;
