pub mod api;
pub mod config;
pub mod database;
pub mod enricher;
pub mod error;
pub mod ethereum;
pub mod indexer;
pub mod models;
pub mod query;
pub mod relative_time;
pub mod subgraph;
