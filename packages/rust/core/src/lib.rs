//! Enrichment pipeline for noderank.
//!
//! This crate ties the upstream fetcher and decoder together into the
//! worker pool ([`worker`]), the run coordinator ([`pipeline`]) and the
//! output file writer ([`sink`]).

pub mod pipeline;
pub mod sink;
pub mod worker;

pub use pipeline::{RunSummary, acquire_base_list, enrich_all, run};
pub use worker::{Enricher, SkipReason};
