pub mod builder;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod graph;
pub mod provider;
pub mod resolution;
pub mod source;
pub mod store;
pub mod types;
