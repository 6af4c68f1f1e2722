//! End-to-end enrichment run: base list → worker pool → aggregate → file.
//!
//! The coordinator owns both queues. Workers share a closeable work queue
//! and a result queue sized to the batch, so no worker ever waits on the
//! coordinator. The coordinator closes the work queue once every record is
//! enqueued, joins every worker, and only then drains the results.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};
use url::Url;

use noderank_shared::{
    Aggregate, BaseList, BaseRecord, EnrichedRecord, NodeRankError, PipelineConfig, Result,
};
use noderank_source::{Fetcher, decode_base_list};

use crate::sink;
use crate::worker::{Enricher, WorkQueue, run_worker};

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Records in the base list.
    pub base_records: usize,
    /// Records written to the aggregate.
    pub enriched: usize,
    /// Records dropped because their lookup failed.
    pub skipped: usize,
    /// Where the aggregate was written.
    pub output_path: PathBuf,
    /// Size of the written document.
    pub bytes_written: usize,
    /// Generation timestamp stamped on the aggregate.
    pub last_updated: String,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Run the full pipeline.
///
/// 1. Fetch and decode the base list (fatal on failure)
/// 2. Enrich every record on a pool of `config.workers` workers
/// 3. Stamp the aggregate with the current time
/// 4. Write it to `config.output_path` (fatal on failure)
#[instrument(skip_all, fields(list_url = %config.list_url, workers = config.workers))]
pub async fn run(config: &PipelineConfig) -> Result<RunSummary> {
    config.validate()?;
    let start = Instant::now();

    let fetcher = Fetcher::new(config.timeout)?;
    let list = acquire_base_list(&fetcher, &config.list_url).await?;
    let base_records = list.scores.len();

    info!(
        records = base_records,
        list_updated = %list.last_updated,
        "base list acquired"
    );

    let enricher = Enricher::new(fetcher, config.node_url_base.clone());
    let records = enrich_all(enricher, list.scores, config.workers).await;
    let enriched = records.len();

    let aggregate = Aggregate::new(records);
    let bytes_written =
        sink::write_aggregate(&config.output_path, &aggregate).map_err(NodeRankError::sink)?;

    let summary = RunSummary {
        base_records,
        enriched,
        skipped: base_records - enriched,
        output_path: config.output_path.clone(),
        bytes_written,
        last_updated: aggregate.last_updated,
        elapsed: start.elapsed(),
    };

    info!(
        enriched = summary.enriched,
        skipped = summary.skipped,
        bytes = summary.bytes_written,
        path = %summary.output_path.display(),
        duration_ms = summary.elapsed.as_millis(),
        "aggregate written"
    );

    Ok(summary)
}

/// Fetch and decode the base list. Any failure is an acquisition error.
pub async fn acquire_base_list(fetcher: &Fetcher, url: &Url) -> Result<BaseList> {
    let body = fetcher
        .fetch(url.as_str())
        .await
        .map_err(NodeRankError::acquisition)?;

    decode_base_list(&body).map_err(|e| {
        error!(payload = e.payload().unwrap_or_default(), "base list is not decodable");
        NodeRankError::acquisition(e)
    })
}

/// Enrich `batch` on a pool of `workers` workers.
///
/// Records whose lookup fails are absent from the result. The order of the
/// result is completion order and differs between runs.
#[instrument(skip_all, fields(records = batch.len(), workers = workers))]
pub async fn enrich_all(
    enricher: Enricher,
    batch: Vec<BaseRecord>,
    workers: usize,
) -> Vec<EnrichedRecord> {
    let workers = workers.max(1);
    let batch_len = batch.len();

    let (work_tx, work_rx) = mpsc::unbounded_channel();
    // Sized to the batch so workers never block on a coordinator that is
    // still joining.
    let (result_tx, mut result_rx) = mpsc::channel(batch_len.max(1));

    let queue: WorkQueue = Arc::new(Mutex::new(work_rx));
    let enricher = Arc::new(enricher);

    let mut pool = JoinSet::new();
    for id in 0..workers {
        pool.spawn(run_worker(
            id,
            enricher.clone(),
            queue.clone(),
            result_tx.clone(),
        ));
    }
    drop(queue);
    drop(result_tx);

    for base in batch {
        if work_tx.send(base).is_err() {
            warn!("every worker exited early, remaining records dropped");
            break;
        }
    }
    // Closing the work queue is the only stop signal workers get.
    drop(work_tx);

    let mut emitted = 0;
    while let Some(joined) = pool.join_next().await {
        match joined {
            Ok(count) => emitted += count,
            Err(e) => error!(error = %e, "enrichment worker failed"),
        }
    }

    // Every sender is gone once the pool is joined; drain what is buffered.
    result_rx.close();
    let mut records = Vec::with_capacity(emitted);
    while let Some(record) = result_rx.recv().await {
        records.push(record);
    }

    info!(
        enriched = records.len(),
        skipped = batch_len - records.len(),
        "enrichment complete"
    );

    records
}
