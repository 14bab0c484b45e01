//! # labelcheck
//!
//! Alcohol-beverage label verification library.
//!
//! labelcheck extracts the five regulated fields from a label image (brand
//! name, class/type, alcohol content, net contents, government warning) and
//! compares them against expected application values, producing per-field
//! pass/warning/fail verdicts and an overall approved/review/rejected
//! status.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use labelcheck::{ExpectedFields, LabelVerifier, VisionConfig, VisionExtractor};
//!
//! #[tokio::main]
//! async fn main() -> labelcheck::Result<()> {
//!     let extractor = VisionExtractor::new(VisionConfig::new("sk-..."))?;
//!     let verifier = LabelVerifier::new(Arc::new(extractor));
//!
//!     let image = std::fs::read("label.png")?;
//!     let expected = ExpectedFields {
//!         brand_name: "Old Crow".into(),
//!         class_type: "Straight Rye Whisky".into(),
//!         alcohol_content: "45%".into(),
//!         net_contents: "750 mL".into(),
//!     };
//!
//!     let result = verifier.verify(&image, &expected).await?;
//!     println!("{:?}: {}", result.overall_status, result.summary);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Reading-order reconstruction**: orders raw OCR tokens into natural
//!   reading order and splits captures holding two side-by-side labels
//! - **Field classification**: positional and vocabulary heuristics over
//!   the ordered token stream
//! - **Tiered fuzzy verification**: field-specific tolerance rules with
//!   pass/warning/fail verdicts
//! - **Batch processing**: wave-bounded concurrency with per-item
//!   retry/backoff and fault containment
//! - **Pluggable extraction**: direct-field vision models or token-stream
//!   OCR engines behind one adapter trait

pub mod batch;
pub mod classify;
pub mod compare;
pub mod error;
pub mod extract;
pub mod layout;
pub mod model;

// Re-export commonly used types
pub use batch::{BatchOptions, BatchProcessor};
pub use classify::FieldClassifier;
pub use compare::{canonical_warning, verify_fields, GOVERNMENT_WARNING_BODY, GOVERNMENT_WARNING_HEADER};
pub use error::{Error, Result};
pub use extract::{
    FieldExtractor, OcrEngine, OcrOutput, RecognizedRegion, TokenStreamExtractor, VisionConfig,
    VisionExtractor,
};
pub use layout::{reading_order, LayoutOptions, ReadingOrder};
pub use model::{
    ApplicationData, BatchItem, ExpectedFields, ExtractedFields, FieldExtraction, FieldStatus,
    FieldVerdict, MatchHints, OverallStatus, Token, VerificationResult,
};

use std::sync::Arc;

/// The verification pipeline entry point.
///
/// Owns an injected extraction adapter (shared read-only across concurrent
/// batch tasks) and the batch scheduling options. Construct one per
/// extraction provider and reuse it for any number of verifications.
pub struct LabelVerifier {
    extractor: Arc<dyn FieldExtractor>,
    batch_options: BatchOptions,
}

impl LabelVerifier {
    /// Create a verifier over an extraction adapter.
    pub fn new(extractor: Arc<dyn FieldExtractor>) -> Self {
        Self {
            extractor,
            batch_options: BatchOptions::default(),
        }
    }

    /// Override the batch scheduling options.
    pub fn with_batch_options(mut self, options: BatchOptions) -> Self {
        self.batch_options = options;
        self
    }

    /// Verify one label image against expected values.
    ///
    /// A malformed extraction response is absorbed here: the all-empty
    /// sentinel fields are verified instead, so the caller still receives
    /// meaningful per-field fail statuses. Retryable provider errors
    /// propagate to the caller (the batch controller handles backoff).
    pub async fn verify(
        &self,
        image: &[u8],
        expected: &ExpectedFields,
    ) -> Result<VerificationResult> {
        let extraction = match self.extractor.extract(image, expected).await {
            Ok(extraction) => extraction,
            Err(Error::MalformedResponse(msg)) => {
                log::warn!("Extraction response unusable ({msg}); verifying sentinel fields");
                FieldExtraction::sentinel()
            }
            Err(err) => return Err(err),
        };

        Ok(compare::verify_fields(
            &extraction.fields,
            &extraction.hints,
            expected,
        ))
    }

    /// Verify a batch of items with wave-bounded concurrency.
    ///
    /// The output always has the same length and order as the input; items
    /// whose task failed terminally yield error-status sentinels instead of
    /// aborting the batch.
    pub async fn verify_batch(&self, items: &[BatchItem]) -> Vec<VerificationResult> {
        BatchProcessor::new(self, self.batch_options.clone())
            .process(items)
            .await
    }
}

/// Pair images with their application data, validating cardinality.
///
/// Returns [`Error::Validation`] before any extraction work when the two
/// lists differ in length.
pub fn pair_batch(
    images: Vec<Vec<u8>>,
    applications: Vec<ExpectedFields>,
) -> Result<Vec<BatchItem>> {
    if images.len() != applications.len() {
        return Err(Error::Validation(format!(
            "Number of images ({}) must match number of application data entries ({})",
            images.len(),
            applications.len()
        )));
    }
    Ok(images
        .into_iter()
        .zip(applications)
        .map(|(image, expected)| BatchItem::new(image, expected))
        .collect())
}
