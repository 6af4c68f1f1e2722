//! Shared types, error model, and configuration for noderank.
//!
//! This crate is the foundation depended on by all other noderank crates.
//! It provides:
//! - [`NodeRankError`] — the unified error type
//! - Domain types ([`BaseRecord`], [`NodeRecord`], [`EnrichedRecord`], [`Aggregate`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, OutputConfig, PipelineConfig, PipelineSection, SourceConfig, config_dir,
    config_file_path, default_worker_count, init_config, load_config, load_config_from,
};
pub use error::{NodeRankError, Result};
pub use types::{
    Aggregate, BaseList, BaseRecord, EnrichedRecord, NodeAddress, NodeRankings, NodeRecord,
    TIMESTAMP_FORMAT, format_timestamp,
};
