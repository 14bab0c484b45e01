//! Data model for label verification.
//!
//! All types here are constructed once and never mutated afterwards; the
//! concurrent batch controller relies on that.

mod fields;
mod token;
mod verdict;

pub use fields::{
    ApplicationData, ExpectedFields, ExtractedFields, FieldExtraction, MatchHints,
};
pub use token::Token;
pub use verdict::{
    BatchItem, FieldStatus, FieldVerdict, OverallStatus, VerificationResult,
};
