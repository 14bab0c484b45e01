//! Extracted and expected field records.

use serde::{Deserialize, Serialize};

/// The five semantic fields extracted from a label image.
///
/// Absent fields default to empty strings / `false`; "not found" is data,
/// not an error. A fresh value is constructed per verification call and
/// never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Brand name as printed on the label.
    #[serde(default)]
    pub brand_name: String,
    /// Class/type designation (e.g. "STRAIGHT RYE WHISKY").
    #[serde(default)]
    pub class_type: String,
    /// Alcohol content declaration (e.g. "45% ALC/VOL").
    #[serde(default)]
    pub alcohol_content: String,
    /// Net contents declaration (e.g. "750 ML").
    #[serde(default)]
    pub net_contents: String,
    /// Text of the government warning statement, if located.
    #[serde(default)]
    pub government_warning_text: String,
    /// Whether a government warning statement was located at all.
    #[serde(default)]
    pub government_warning_present: bool,
    /// Whether the literal `GOVERNMENT WARNING:` header appears in capitals.
    #[serde(default)]
    pub government_warning_all_caps: bool,
}

impl ExtractedFields {
    /// The all-empty sentinel substituted when a provider response could not
    /// be parsed. Verification of the sentinel produces fail statuses for
    /// every field rather than aborting.
    pub fn sentinel() -> Self {
        Self::default()
    }
}

/// Optional per-field match hints from an external vision provider.
///
/// A `true` hint short-circuits the corresponding field to pass without
/// running the deterministic comparison; a `false` or absent hint never
/// suppresses it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchHints {
    #[serde(default)]
    pub brand_name: bool,
    #[serde(default)]
    pub class_type: bool,
    #[serde(default)]
    pub alcohol_content: bool,
    #[serde(default)]
    pub net_contents: bool,
    #[serde(default)]
    pub government_warning: bool,
}

/// The full output of the extraction boundary: fields plus hints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldExtraction {
    pub fields: ExtractedFields,
    pub hints: MatchHints,
}

impl FieldExtraction {
    /// Sentinel extraction for malformed provider responses.
    pub fn sentinel() -> Self {
        Self::default()
    }
}

/// Expected field values supplied by the caller.
///
/// Amount+unit pairs must already be combined into the composite strings
/// (see [`ApplicationData::into_expected`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedFields {
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub class_type: String,
    #[serde(default)]
    pub alcohol_content: String,
    #[serde(default)]
    pub net_contents: String,
}

/// Raw application form data as uploaded by a caller.
///
/// Mirrors the application JSON: the alcohol content and net contents may
/// arrive either pre-combined or as separate amount/unit pairs. Absent keys
/// default to empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationData {
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub class_type: String,
    #[serde(default)]
    pub alcohol_content: String,
    #[serde(default)]
    pub alcohol_content_amount: String,
    #[serde(default)]
    pub alcohol_content_format: String,
    #[serde(default)]
    pub net_contents: String,
    #[serde(default)]
    pub net_contents_amount: String,
    #[serde(default)]
    pub net_contents_unit: String,
}

impl ApplicationData {
    /// Combine raw amount+unit pairs into the composite expected strings.
    ///
    /// A pre-combined string wins over its amount/unit pair when both are
    /// present.
    pub fn into_expected(self) -> ExpectedFields {
        let alcohol_content = if !self.alcohol_content.is_empty() {
            self.alcohol_content
        } else {
            join_pair(&self.alcohol_content_amount, &self.alcohol_content_format)
        };
        let net_contents = if !self.net_contents.is_empty() {
            self.net_contents
        } else {
            join_pair(&self.net_contents_amount, &self.net_contents_unit)
        };
        ExpectedFields {
            brand_name: self.brand_name,
            class_type: self.class_type,
            alcohol_content,
            net_contents,
        }
    }
}

fn join_pair(amount: &str, unit: &str) -> String {
    format!("{} {}", amount, unit).trim().to_string()
}
