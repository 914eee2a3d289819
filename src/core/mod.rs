pub mod config;
pub mod error;
pub mod filter;
pub mod ids;
pub mod keywords;
pub mod models;
pub mod orchestrator;
pub mod provider;
pub mod quota;
pub mod store;
