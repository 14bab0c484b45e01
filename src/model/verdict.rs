//! Per-field and overall verification verdicts.

use serde::{Deserialize, Serialize};

use super::ExpectedFields;

/// Status of a single field comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    Pass,
    Warning,
    Fail,
}

/// Overall status of one verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    /// Every field passed.
    Approved,
    /// At least one warning, no failures.
    Review,
    /// At least one field failed.
    Rejected,
    /// Batch fault containment: the task itself failed terminally.
    Error,
}

/// Verdict for a single field: what was found, what was expected, and how
/// they compared. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldVerdict {
    /// Display name of the field (e.g. "Brand Name").
    pub field: String,
    /// Value extracted from the label.
    pub extracted: String,
    /// Value the application expected.
    pub expected: String,
    /// Comparison outcome.
    pub status: FieldStatus,
    /// Human-readable explanation for warnings and failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl FieldVerdict {
    pub fn new(
        field: impl Into<String>,
        extracted: impl Into<String>,
        expected: impl Into<String>,
        status: FieldStatus,
        note: Option<String>,
    ) -> Self {
        Self {
            field: field.into(),
            extracted: extracted.into(),
            expected: expected.into(),
            status,
            note,
        }
    }
}

/// Result of verifying one label image against expected values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Aggregate outcome over all field verdicts.
    #[serde(rename = "overallStatus")]
    pub overall_status: OverallStatus,
    /// One-line outcome summary.
    pub summary: String,
    /// The five per-field verdicts (empty for error sentinels).
    pub fields: Vec<FieldVerdict>,
}

impl VerificationResult {
    /// Aggregate field verdicts: any fail rejects, else any warning sends
    /// the label to review, else approved.
    pub fn from_verdicts(fields: Vec<FieldVerdict>) -> Self {
        let has_fail = fields.iter().any(|f| f.status == FieldStatus::Fail);
        let has_warning = fields.iter().any(|f| f.status == FieldStatus::Warning);

        let overall_status = if has_fail {
            OverallStatus::Rejected
        } else if has_warning {
            OverallStatus::Review
        } else {
            OverallStatus::Approved
        };

        let summary = if overall_status == OverallStatus::Approved {
            "All fields verified.".to_string()
        } else {
            "One or more fields require attention.".to_string()
        };

        Self {
            overall_status,
            summary,
            fields,
        }
    }

    /// Sentinel substituted for a task whose terminal failure must not
    /// abort the rest of a batch.
    pub fn error_sentinel() -> Self {
        Self {
            overall_status: OverallStatus::Error,
            summary: "Processing failed".to_string(),
            fields: Vec::new(),
        }
    }
}

/// One unit of batch work: an image paired with its expected values.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Raw label image bytes.
    pub image: Vec<u8>,
    /// Expected field values for this image.
    pub expected: ExpectedFields,
}

impl BatchItem {
    pub fn new(image: Vec<u8>, expected: ExpectedFields) -> Self {
        Self { image, expected }
    }
}
