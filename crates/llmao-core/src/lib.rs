pub mod answer;
pub mod catalog;
pub mod config;
pub mod embeddings;
pub mod engine;
pub mod errors;
pub mod judge;
pub mod metrics_api;
pub mod model;
pub mod prompt;
pub mod providers;
pub mod retry;
pub mod sql;
pub mod storage;
