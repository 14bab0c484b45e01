//! Extraction adapter boundary.
//!
//! The pipeline never talks to an OCR engine or vision model directly; it
//! consumes a [`FieldExtractor`] instance constructed by the entry point and
//! injected into the pipeline. Two shapes are supported:
//!
//! - **Direct-field**: [`VisionExtractor`] asks a vision-capable model for
//!   the field dictionary (plus per-field match hints) in one call.
//! - **Token-stream**: [`TokenStreamExtractor`] wraps any [`OcrEngine`]
//!   producing raw tokens with bounding polygons, then reconstructs reading
//!   order and classifies fields locally.

mod tokens;
mod vision;

pub use tokens::{OcrEngine, OcrOutput, RecognizedRegion, TokenStreamExtractor};
pub use vision::{VisionConfig, VisionExtractor};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{ExpectedFields, FieldExtraction};

/// Boundary for extracting label fields from an image.
///
/// Implementations must be shareable read-only across concurrent batch
/// tasks; every call owns its own output.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    /// Extract the five semantic fields (and any match hints) from raw
    /// image bytes.
    ///
    /// Errors follow the crate taxonomy: [`crate::Error::MalformedResponse`]
    /// for an unusable provider answer (non-retryable),
    /// [`crate::Error::RateLimited`] and [`crate::Error::Provider`] for
    /// retryable provider failures.
    async fn extract(&self, image: &[u8], expected: &ExpectedFields) -> Result<FieldExtraction>;
}
