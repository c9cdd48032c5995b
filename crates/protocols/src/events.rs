//! Block-range log reader.
//!
//! A range is split into fixed intervals that are read concurrently. An
//! interval the node refuses as too large is bisected until it fits; any other
//! failure is retried a bounded number of times and then returned.

use crate::chain::{ChainClient, ChainError};
use alloy::rpc::types::{Filter, Log};
use custody_domain::Network;
use futures::future::BoxFuture;
use futures::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for [`EventReader`].
#[derive(Debug, Clone)]
pub struct EventReaderConfig {
    /// Blocks per interval.
    pub block_interval: u64,
    /// Intervals read concurrently.
    pub concurrency: usize,
    /// Attempts per interval for errors other than range-too-large.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub retry_backoff: Duration,
}

impl Default for EventReaderConfig {
    fn default() -> Self {
        Self {
            block_interval: 10_000,
            concurrency: 5,
            max_attempts: 3,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

impl EventReaderConfig {
    /// Default configuration with the network's provider range limit.
    #[must_use]
    pub fn for_network(network: Network) -> Self {
        Self {
            block_interval: network.log_block_interval(),
            ..Self::default()
        }
    }
}

/// Splits `[from, to]` into inclusive intervals spanning `interval + 1`
/// blocks each; the last one is cut at `to`.
#[must_use]
pub fn block_intervals(from: u64, to: u64, interval: u64) -> Vec<(u64, u64)> {
    if from > to {
        return Vec::new();
    }
    if to - from < interval {
        return vec![(from, to)];
    }

    let mut intervals = Vec::new();
    let mut current = from;
    while current <= to {
        let end = current.saturating_add(interval).min(to);
        intervals.push((current, end));
        match end.checked_add(1) {
            Some(next) => current = next,
            None => break,
        }
    }
    intervals
}

/// Reads logs over large block ranges.
pub struct EventReader {
    chain: Arc<dyn ChainClient>,
    config: EventReaderConfig,
}

impl EventReader {
    #[must_use]
    pub fn new(chain: Arc<dyn ChainClient>, config: EventReaderConfig) -> Self {
        Self { chain, config }
    }

    /// Reads every log matching `filter` in `[from, to]`, in block order.
    ///
    /// The filter's own block bounds are replaced per interval.
    ///
    /// # Errors
    /// Returns the first interval error that survived its retries.
    pub async fn read_logs(
        &self,
        filter: &Filter,
        from: u64,
        to: u64,
    ) -> Result<Vec<Log>, ChainError> {
        let intervals = block_intervals(from, to, self.config.block_interval);
        info!(from, to, intervals = intervals.len(), "Reading logs");

        let chunks: Vec<Vec<Log>> = stream::iter(intervals)
            .map(|(start, end)| self.read_range(filter, start, end))
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        let logs: Vec<Log> = chunks.into_iter().flatten().collect();
        info!(count = logs.len(), "Found logs");
        Ok(logs)
    }

    fn read_range<'a>(
        &'a self,
        filter: &'a Filter,
        from: u64,
        to: u64,
    ) -> BoxFuture<'a, Result<Vec<Log>, ChainError>> {
        Box::pin(async move {
            let bounded = filter.clone().from_block(from).to_block(to);
            let max_attempts = self.config.max_attempts.max(1);
            let mut attempt = 1;

            loop {
                match self.chain.logs(&bounded).await {
                    Ok(logs) => {
                        debug!(from, to, count = logs.len(), "Read interval");
                        return Ok(logs);
                    }
                    Err(ChainError::RangeTooLarge(msg)) if from < to => {
                        let mid = from + (to - from) / 2;
                        debug!(from, to, mid, reason = %msg, "Range too large, bisecting");
                        let mut logs = self.read_range(filter, from, mid).await?;
                        logs.extend(self.read_range(filter, mid + 1, to).await?);
                        return Ok(logs);
                    }
                    Err(err @ ChainError::RangeTooLarge(_)) => return Err(err),
                    Err(err) if attempt >= max_attempts => {
                        warn!(from, to, attempts = attempt, error = %err, "Log read failed");
                        return Err(err);
                    }
                    Err(err) => {
                        warn!(from, to, attempt, error = %err, "Log read failed, retrying");
                        attempt += 1;
                        tokio::time::sleep(self.config.retry_backoff).await;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChain;

    #[test]
    fn test_block_intervals() {
        assert_eq!(block_intervals(100, 150, 10_000), vec![(100, 150)]);
        assert_eq!(
            block_intervals(0, 25_000, 10_000),
            vec![(0, 10_000), (10_001, 20_001), (20_002, 25_000)]
        );
        assert!(block_intervals(10, 5, 10).is_empty());
    }

    #[test]
    fn test_block_intervals_cover_final_block() {
        let intervals = block_intervals(0, 10_001, 10_000);
        assert_eq!(intervals, vec![(0, 10_000), (10_001, 10_001)]);
    }

    #[test]
    fn test_polygon_interval() {
        assert_eq!(
            EventReaderConfig::for_network(Network::Polygon).block_interval,
            3_499
        );
        assert_eq!(
            EventReaderConfig::for_network(Network::Mainnet).block_interval,
            10_000
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_bisects_ranges_the_node_refuses() {
        let chain = Arc::new(MockChain::new());
        chain.set_max_log_range(1_000);
        let reader = EventReader::new(chain.clone(), EventReaderConfig::default());

        let logs = reader.read_logs(&Filter::new(), 0, 3_999).await.unwrap();

        assert_eq!(logs.len(), 4_000);
        assert!(
            logs.windows(2)
                .all(|w| w[0].block_number < w[1].block_number)
        );
        assert!(chain.log_calls() > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_retry_then_fail() {
        let chain = Arc::new(MockChain::new());
        chain.fail_logs(10);
        let config = EventReaderConfig {
            max_attempts: 3,
            ..EventReaderConfig::default()
        };
        let reader = EventReader::new(chain.clone(), config);

        let result = reader.read_logs(&Filter::new(), 0, 100).await;

        assert!(matches!(result, Err(ChainError::Transport(_))));
        assert_eq!(chain.log_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_recovers() {
        let chain = Arc::new(MockChain::new());
        chain.fail_logs(1);
        let reader = EventReader::new(chain.clone(), EventReaderConfig::default());

        let logs = reader.read_logs(&Filter::new(), 10, 19).await.unwrap();

        assert_eq!(logs.len(), 10);
        assert_eq!(chain.log_calls(), 2);
    }
}
