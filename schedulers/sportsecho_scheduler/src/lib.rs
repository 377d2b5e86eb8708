pub mod api_client;
pub mod config;
pub mod error;
pub mod fixture_store;
pub mod metrics;
pub mod scheduler;
pub mod season;
pub mod sync_job;
pub mod types;
pub mod watermark;
