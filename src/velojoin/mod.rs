pub mod config;
pub mod error;
pub mod execution;
pub mod server;
pub mod topology;
