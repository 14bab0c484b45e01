//! Batch controller tests: wave scheduling, retry/backoff, fault
//! containment, and order preservation.
//!
//! The clock is paused, so backoff sleeps advance instantly and the tests
//! stay fast and deterministic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use labelcheck::{
    BatchItem, BatchOptions, Error, ExpectedFields, ExtractedFields, FieldExtraction,
    FieldExtractor, LabelVerifier, MatchHints, OverallStatus, Result,
};

/// Scripted outcome for one extraction attempt.
#[derive(Clone, Copy)]
enum Outcome {
    Ok,
    RateLimited,
    RateLimitedWithHint(f64),
    Malformed,
}

/// Extractor that replays per-item scripts and records scheduling facts.
///
/// Items are identified by their expected brand name. Unscripted attempts
/// succeed.
struct ScriptedExtractor {
    scripts: Mutex<HashMap<String, Vec<Outcome>>>,
    starts: Mutex<Vec<String>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedExtractor {
    fn new(scripts: HashMap<String, Vec<Outcome>>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
            starts: Mutex::new(Vec::new()),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    fn unscripted() -> Self {
        Self::new(HashMap::new())
    }

    fn starts(&self) -> Vec<String> {
        self.starts.lock().unwrap().clone()
    }

    fn attempts_for(&self, name: &str) -> usize {
        self.starts.lock().unwrap().iter().filter(|s| *s == name).count()
    }

    fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn next_outcome(&self, name: &str) -> Outcome {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(name) {
            Some(queue) if !queue.is_empty() => queue.remove(0),
            _ => Outcome::Ok,
        }
    }
}

#[async_trait]
impl FieldExtractor for ScriptedExtractor {
    async fn extract(&self, _image: &[u8], expected: &ExpectedFields) -> Result<FieldExtraction> {
        let name = expected.brand_name.clone();
        self.starts.lock().unwrap().push(name.clone());

        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);

        // Simulated provider latency so wave members overlap.
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.running.fetch_sub(1, Ordering::SeqCst);

        match self.next_outcome(&name) {
            Outcome::Ok => Ok(FieldExtraction {
                fields: ExtractedFields {
                    brand_name: name,
                    government_warning_present: true,
                    government_warning_all_caps: true,
                    ..Default::default()
                },
                hints: MatchHints {
                    brand_name: true,
                    class_type: true,
                    alcohol_content: true,
                    net_contents: true,
                    government_warning: true,
                },
            }),
            Outcome::RateLimited => Err(Error::RateLimited { retry_after: None }),
            Outcome::RateLimitedWithHint(secs) => Err(Error::RateLimited {
                retry_after: Some(secs),
            }),
            Outcome::Malformed => Err(Error::MalformedResponse("not json".to_string())),
        }
    }
}

fn items(count: usize) -> Vec<BatchItem> {
    (0..count)
        .map(|i| {
            BatchItem::new(
                vec![i as u8],
                ExpectedFields {
                    brand_name: format!("item-{i}"),
                    ..Default::default()
                },
            )
        })
        .collect()
}

fn settled_ok(result: &labelcheck::VerificationResult) -> bool {
    result.overall_status == OverallStatus::Approved && result.fields.len() == 5
}

#[tokio::test(start_paused = true)]
async fn test_seven_items_concurrency_five_runs_two_waves() {
    let extractor = Arc::new(ScriptedExtractor::unscripted());
    let verifier = LabelVerifier::new(extractor.clone())
        .with_batch_options(BatchOptions::new().with_concurrency(5));

    let results = verifier.verify_batch(&items(7)).await;

    assert_eq!(results.len(), 7);
    assert!(results.iter().all(settled_ok));

    // Results are positional: output[i] echoes input[i].
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.fields[0].extracted, format!("item-{i}"));
    }

    // Wave barrier: the first five all start before either of the last two.
    let starts = extractor.starts();
    assert_eq!(starts.len(), 7);
    let first_wave: Vec<&str> = starts[..5].iter().map(String::as_str).collect();
    for i in 0..5 {
        assert!(first_wave.contains(&format!("item-{i}").as_str()));
    }
    assert_eq!(&starts[5..], &["item-5".to_string(), "item-6".to_string()]);

    // Bounded parallelism, and the waves genuinely overlap internally.
    assert!(extractor.peak_concurrency() <= 5);
    assert!(extractor.peak_concurrency() >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_terminal_failure_is_contained() {
    let mut scripts = HashMap::new();
    // Item 3 never stops being rate limited: 12 attempts, then terminal.
    scripts.insert("item-3".to_string(), vec![Outcome::RateLimited; 12]);

    let extractor = Arc::new(ScriptedExtractor::new(scripts));
    let verifier = LabelVerifier::new(extractor.clone())
        .with_batch_options(BatchOptions::new().with_concurrency(5));

    let results = verifier.verify_batch(&items(7)).await;

    assert_eq!(results.len(), 7);
    assert_eq!(results[3].overall_status, OverallStatus::Error);
    assert!(results[3].fields.is_empty());

    for (i, result) in results.iter().enumerate() {
        if i != 3 {
            assert!(settled_ok(result), "item {i} must settle normally");
        }
    }

    assert_eq!(extractor.attempts_for("item-3"), 12);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_task_recovers_within_budget() {
    let mut scripts = HashMap::new();
    scripts.insert(
        "item-0".to_string(),
        vec![
            Outcome::RateLimited,
            Outcome::RateLimitedWithHint(7.0),
            Outcome::RateLimited,
            Outcome::Ok,
        ],
    );

    let extractor = Arc::new(ScriptedExtractor::new(scripts));
    let verifier = LabelVerifier::new(extractor.clone());

    let started = tokio::time::Instant::now();
    let results = verifier.verify_batch(&items(1)).await;

    // The real result came back, not a sentinel.
    assert_eq!(results.len(), 1);
    assert!(settled_ok(&results[0]));
    assert_eq!(results[0].fields[0].extracted, "item-0");

    // Three retries consumed: 4 attempts in total.
    assert_eq!(extractor.attempts_for("item-0"), 4);

    // Backoff is attempt-indexed plus the provider hint: 1 + (2+7) + 3.
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(13), "waited {waited:?}");
    assert!(waited < Duration::from_secs(15), "waited {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn test_malformed_response_is_not_retried() {
    let mut scripts = HashMap::new();
    scripts.insert("item-0".to_string(), vec![Outcome::Malformed]);

    let extractor = Arc::new(ScriptedExtractor::new(scripts));
    let verifier = LabelVerifier::new(extractor.clone());

    let results = verifier.verify_batch(&items(1)).await;

    // One attempt only, and the sentinel fields verified to a rejection,
    // not an error sentinel.
    assert_eq!(extractor.attempts_for("item-0"), 1);
    assert_eq!(results[0].overall_status, OverallStatus::Rejected);
    assert_eq!(results[0].fields.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_empty_batch() {
    let verifier = LabelVerifier::new(Arc::new(ScriptedExtractor::unscripted()));
    let results = verifier.verify_batch(&[]).await;
    assert!(results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_single_wave_smaller_than_concurrency() {
    let extractor = Arc::new(ScriptedExtractor::unscripted());
    let verifier = LabelVerifier::new(extractor.clone())
        .with_batch_options(BatchOptions::new().with_concurrency(5));

    let results = verifier.verify_batch(&items(3)).await;
    assert_eq!(results.len(), 3);
    assert_eq!(extractor.starts().len(), 3);
    assert!(extractor.peak_concurrency() <= 3);
}
