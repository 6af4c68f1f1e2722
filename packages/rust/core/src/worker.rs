//! Enrichment workers.
//!
//! Each worker pulls base records off the shared work queue until the queue
//! is closed and empty, looks every record up, and pushes the merged result
//! to the result queue. A failed lookup is logged and dropped; it never
//! stops the worker or affects its peers.

use std::sync::Arc;

use noderank_shared::{BaseRecord, EnrichedRecord, NodeRankError};
use noderank_source::{Fetcher, decode_node, node_url};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};
use url::Url;

/// Multi-consumer side of the work queue, shared by every worker.
pub(crate) type WorkQueue = Arc<Mutex<mpsc::UnboundedReceiver<BaseRecord>>>;

/// Why a base record produced no output.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    /// The lookup request failed (transport, timeout, body read).
    #[error("could not download data for {public_key}: {source}")]
    Fetch {
        public_key: String,
        source: NodeRankError,
    },

    /// The lookup body could not be decoded.
    #[error("could not parse data for {public_key}: {source}")]
    Decode {
        public_key: String,
        source: NodeRankError,
    },
}

impl SkipReason {
    /// Public key of the record that was skipped.
    pub fn public_key(&self) -> &str {
        match self {
            Self::Fetch { public_key, .. } | Self::Decode { public_key, .. } => public_key,
        }
    }
}

// ---------------------------------------------------------------------------
// Enricher
// ---------------------------------------------------------------------------

/// Fetch + decode + merge for a single base record.
#[derive(Debug, Clone)]
pub struct Enricher {
    fetcher: Fetcher,
    node_url_base: Url,
}

impl Enricher {
    pub fn new(fetcher: Fetcher, node_url_base: Url) -> Self {
        Self {
            fetcher,
            node_url_base,
        }
    }

    /// Look up `base` and merge it with the result.
    pub async fn enrich(&self, base: BaseRecord) -> Result<EnrichedRecord, SkipReason> {
        let fetch_failed = |source| SkipReason::Fetch {
            public_key: base.public_key.clone(),
            source,
        };

        let url = node_url(&self.node_url_base, &base.public_key).map_err(fetch_failed)?;
        let body = self.fetcher.fetch(url.as_str()).await.map_err(fetch_failed)?;

        let node = decode_node(&body).map_err(|source| SkipReason::Decode {
            public_key: base.public_key.clone(),
            source,
        })?;

        Ok(EnrichedRecord::merge(base, node))
    }
}

// ---------------------------------------------------------------------------
// Worker loop
// ---------------------------------------------------------------------------

/// Run one worker until the work queue is closed and drained.
///
/// Returns the number of records this worker emitted.
pub(crate) async fn run_worker(
    id: usize,
    enricher: Arc<Enricher>,
    queue: WorkQueue,
    results: mpsc::Sender<EnrichedRecord>,
) -> usize {
    let mut emitted = 0;

    loop {
        // The lock is held only while waiting for the next record.
        let next = queue.lock().await.recv().await;
        let Some(base) = next else {
            debug!(worker = id, emitted, "work queue closed, worker stopping");
            break;
        };

        debug!(worker = id, alias = %base.alias, "fetching");

        let Some(record) = enricher
            .enrich(base)
            .await
            .map_err(|reason| log_skip(id, &reason))
            .ok()
        else {
            continue;
        };

        if results.send(record).await.is_err() {
            warn!(worker = id, "result queue closed, worker stopping");
            break;
        }
        emitted += 1;
    }

    emitted
}

fn log_skip(worker: usize, reason: &SkipReason) {
    let public_key = reason.public_key();
    match reason {
        SkipReason::Fetch { source, .. } => {
            warn!(worker, %public_key, error = %source, "lookup failed, skipping");
        }
        SkipReason::Decode { source, .. } => {
            warn!(
                worker,
                %public_key,
                error = %source,
                payload = source.payload().unwrap_or_default(),
                "lookup returned undecodable data, skipping"
            );
        }
    }
}
