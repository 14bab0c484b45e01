//! Concurrent batch verification with wave-bounded parallelism.
//!
//! Input items are partitioned into consecutive waves of at most
//! `concurrency` tasks. A wave is a hard barrier: every task in it settles
//! (success, sentinel, or exhausted retries) before the next wave starts.
//! Each task moves through `PENDING -> RUNNING -> (SUCCESS | RETRY_WAIT ->
//! RUNNING | TERMINAL_FAILURE)`; a retry wait is a timed suspension on the
//! tokio clock, never a spin.
//!
//! Fault containment: a terminal failure is caught at wave settlement and
//! replaced with an error-status sentinel so the remaining tasks are
//! unaffected. Results are gathered by index, so `output[i]` always
//! corresponds to `input[i]` regardless of intra-wave completion order.

use std::time::Duration;

use futures::future::join_all;

use crate::error::{Error, Result};
use crate::model::{BatchItem, VerificationResult};
use crate::LabelVerifier;

/// Batch scheduling options.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum number of tasks running concurrently (wave size).
    pub concurrency: usize,
    /// Total attempts allowed per task before terminal failure.
    pub max_retries: u32,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 5,
            max_retries: 12,
        }
    }
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }
}

/// Runs many verifications against one shared verifier.
pub struct BatchProcessor<'a> {
    verifier: &'a LabelVerifier,
    options: BatchOptions,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(verifier: &'a LabelVerifier, options: BatchOptions) -> Self {
        Self { verifier, options }
    }

    /// Verify every item, preserving input order and cardinality.
    ///
    /// Never fails as a whole: tasks that exhaust their retry budget yield
    /// [`VerificationResult::error_sentinel`] entries.
    pub async fn process(&self, items: &[BatchItem]) -> Vec<VerificationResult> {
        let concurrency = self.options.concurrency.max(1);
        let mut results = Vec::with_capacity(items.len());

        for (wave_index, wave) in items.chunks(concurrency).enumerate() {
            log::debug!("Processing wave {} ({} tasks)", wave_index + 1, wave.len());

            let tasks = wave.iter().enumerate().map(|(offset, item)| {
                let item_index = wave_index * concurrency + offset;
                self.verify_with_retry(item_index, item)
            });

            // Wave barrier: all tasks settle before the next wave begins.
            for (offset, settled) in join_all(tasks).await.into_iter().enumerate() {
                match settled {
                    Ok(result) => results.push(result),
                    Err(err) => {
                        let item_index = wave_index * concurrency + offset;
                        log::error!(
                            "Batch item {item_index} failed terminally ({err}); \
                             sanitizing to an error result"
                        );
                        results.push(VerificationResult::error_sentinel());
                    }
                }
            }
        }

        results
    }

    /// Verify one item, retrying retryable provider failures with a
    /// growing backoff.
    ///
    /// The wait before attempt `n + 1` is `n + 1` seconds plus any
    /// provider-supplied retry-after hint. Non-retryable failures
    /// propagate immediately; an exhausted budget becomes
    /// [`Error::TaskFailed`].
    async fn verify_with_retry(
        &self,
        item_index: usize,
        item: &BatchItem,
    ) -> Result<VerificationResult> {
        let budget = self.options.max_retries;

        for attempt in 0..budget {
            match self.verifier.verify(&item.image, &item.expected).await {
                Ok(result) => {
                    log::debug!("Batch item {item_index} settled on attempt {}", attempt + 1);
                    return Ok(result);
                }
                Err(err) if err.is_retryable() => {
                    let mut wait = f64::from(attempt + 1);
                    if let Some(hint) = err.retry_after() {
                        wait += hint;
                    }
                    log::warn!(
                        "Batch item {item_index}: retryable failure ({err}), retrying in \
                         {wait:.1}s (attempt {}/{budget})",
                        attempt + 1
                    );
                    tokio::time::sleep(Duration::from_secs_f64(wait)).await;
                }
                Err(err) => return Err(err),
            }
        }

        Err(Error::TaskFailed { attempts: budget })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = BatchOptions::default();
        assert_eq!(options.concurrency, 5);
        assert_eq!(options.max_retries, 12);
    }

    #[test]
    fn test_option_floors() {
        let options = BatchOptions::new().with_concurrency(0).with_max_retries(0);
        assert_eq!(options.concurrency, 1);
        assert_eq!(options.max_retries, 1);
    }
}
