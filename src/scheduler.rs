//! Bounded fan-out of enrichment pipelines.

use crate::model::{Candidate, EnrichmentRecord};
use crate::pipeline::{enrich, PipelineContext};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

/// Runs one pipeline per candidate with at most `concurrency` in flight.
/// `on_dispatch` fires as each candidate is handed to a worker. Records come
/// back in candidate order.
pub async fn run<D>(
    candidates: Vec<Candidate>,
    ctx: Arc<PipelineContext>,
    concurrency: usize,
    on_dispatch: D,
) -> Vec<EnrichmentRecord>
where
    D: FnMut(&Candidate),
{
    run_with(candidates, concurrency, on_dispatch, move |candidate| {
        let ctx = Arc::clone(&ctx);
        async move { enrich(candidate, &ctx).await }
    })
    .await
}

/// Same as [`run`] with any per-candidate worker. A worker task that dies is
/// replaced by the bare record of its candidate.
pub async fn run_with<D, W, Fut>(
    candidates: Vec<Candidate>,
    concurrency: usize,
    mut on_dispatch: D,
    worker: W,
) -> Vec<EnrichmentRecord>
where
    D: FnMut(&Candidate),
    W: Fn(Candidate) -> Fut,
    Fut: Future<Output = EnrichmentRecord> + Send + 'static,
{
    let concurrency = concurrency.max(1);
    let total = candidates.len();
    info!(total, concurrency, "Dispatching candidates.");

    let mut results: Vec<(usize, EnrichmentRecord)> = stream::iter(candidates.into_iter().enumerate())
        .map(|(index, candidate)| {
            on_dispatch(&candidate);
            let fallback = EnrichmentRecord::from(candidate.clone());
            let task = tokio::spawn(worker(candidate));
            async move {
                match task.await {
                    Ok(record) => (index, record),
                    Err(e) => {
                        error!(domain = %fallback.domain_name, error = %e, "Pipeline task failed.");
                        (index, fallback)
                    }
                }
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    results.sort_by_key(|(index, _)| *index);
    info!(total = results.len(), "All candidates processed.");
    results.into_iter().map(|(_, record)| record).collect()
}
