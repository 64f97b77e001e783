use config_manager::SchedulerConfig;
use dex_client::ProviderClient;
use futures::future::join_all;
use market_core::ProviderResult;
use retry_utils::{retry_provider_call, RetryConfig};
use std::future::Future;
use std::ops::Range;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Index ranges of consecutive batches of at most `batch_size` items
pub fn plan_batches(len: usize, batch_size: usize) -> Vec<Range<usize>> {
    let batch_size = batch_size.max(1);
    (0..len)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(len))
        .collect()
}

/// Runs `task` over `items` in consecutive batches.
///
/// Tasks within a batch run concurrently and the batch is joined all-settled
/// before the next one starts. `delay` is awaited between batches but not after
/// the last. Results come back in input order.
pub async fn run_batched<'a, I, T, F, Fut>(
    items: &'a [I],
    batch_size: usize,
    delay: Duration,
    mut task: F,
) -> Vec<T>
where
    F: FnMut(&'a I) -> Fut,
    Fut: Future<Output = T>,
{
    let batches = plan_batches(items.len(), batch_size);
    let total = batches.len();
    let mut results = Vec::with_capacity(items.len());

    for (index, range) in batches.into_iter().enumerate() {
        debug!("Running batch {}/{} ({} items)", index + 1, total, range.len());

        let futures: Vec<Fut> = items[range].iter().map(&mut task).collect();
        results.extend(join_all(futures).await);

        if index + 1 < total && !delay.is_zero() {
            sleep(delay).await;
        }
    }

    results
}

/// Batched fan-out of provider calls with an optional classified retry
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    batch_size: usize,
    delay: Duration,
    retry: RetryConfig,
}

impl BatchScheduler {
    pub fn new(batch_size: usize, delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            delay,
            retry: RetryConfig::disabled(),
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.batch_size, config.inter_batch_delay())
            .with_retry(RetryConfig::with_max_attempts(config.retry_attempts))
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn run<'a, I, T, F, Fut>(&self, items: &'a [I], task: F) -> Vec<T>
    where
        F: FnMut(&'a I) -> Fut,
        Fut: Future<Output = T>,
    {
        run_batched(items, self.batch_size, self.delay, task).await
    }

    /// One result per request, in request order
    pub async fn fetch_all<'a, C>(
        &'a self,
        client: &'a C,
        requests: &'a [C::Request],
    ) -> Vec<ProviderResult<C::Payload>>
    where
        C: ProviderClient,
    {
        let retry = &self.retry;
        let results = self
            .run(requests, |request| {
                retry_provider_call(move || client.fetch(request), retry)
            })
            .await;

        let failed = results.iter().filter(|r| r.is_failed()).count();
        if failed > 0 {
            debug!(
                "{}: {}/{} requests failed",
                client.name(),
                failed,
                results.len()
            );
        }

        results
    }
}
