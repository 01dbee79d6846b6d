//! Adapters connecting the campaign engine to the outside world: trend
//! sources, the LLM account, publishing platforms and process configuration.

pub mod config;
pub mod fetcher;
pub mod generator;
pub mod publisher;
