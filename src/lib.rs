pub mod archive;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod observability;
pub mod retrieval;
pub mod transcode;
