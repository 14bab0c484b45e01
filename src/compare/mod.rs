//! Field verification: comparing extracted values against expected values
//! with field-specific tolerance rules.
//!
//! Each comparison returns a [`FieldStatus`] and an optional explanatory
//! note. A `true` external match hint short-circuits a field to pass; a
//! `false` or absent hint never suppresses the deterministic rule, so a
//! hintless run always produces the algorithmic verdict.

mod similarity;

pub use similarity::{partial_ratio, ratio};

use regex::Regex;

use crate::model::{
    ExpectedFields, ExtractedFields, FieldStatus, FieldVerdict, MatchHints, VerificationResult,
};

/// The mandated warning header, which must appear verbatim in capitals.
pub const GOVERNMENT_WARNING_HEADER: &str = "GOVERNMENT WARNING:";

/// The mandated warning body text (27 CFR 16.21).
pub const GOVERNMENT_WARNING_BODY: &str = "(1) According to the Surgeon General, women should not \
drink alcoholic beverages during pregnancy because of the risk of birth defects. (2) Consumption \
of alcoholic beverages impairs your ability to drive a car or operate machinery, and may cause \
health problems.";

/// The full mandated warning statement.
pub fn canonical_warning() -> String {
    format!("{GOVERNMENT_WARNING_HEADER} {GOVERNMENT_WARNING_BODY}")
}

// Tolerance thresholds. Similarities are on a 0-100 scale.
const BRAND_LENGTH_RATIO_FLOOR: f64 = 0.85;
const BRAND_MINOR_DIFFERENCE: f64 = 90.0;
const BRAND_POSSIBLE_MATCH: f64 = 75.0;
const CLASS_CLOSE_MATCH: f64 = 80.0;
const ALCOHOL_DIFF_TOLERANCE: f64 = 0.5;
const WARNING_EXACT: f64 = 100.0;
const WARNING_OCR_ARTIFACT: f64 = 95.0;
const WARNING_MANUAL_REVIEW: f64 = 80.0;

/// Compare an extracted brand name against the expected value.
pub fn compare_brand_name(
    extracted: &str,
    expected: &str,
    matches: bool,
) -> (FieldStatus, Option<String>) {
    if matches {
        return (FieldStatus::Pass, None);
    }
    if extracted.is_empty() {
        return (
            FieldStatus::Fail,
            Some("Brand name not found on label".to_string()),
        );
    }
    if expected.is_empty() {
        return (FieldStatus::Pass, None);
    }

    let ext = extracted.to_lowercase().trim().to_string();
    let exp = expected.to_lowercase().trim().to_string();

    if ext == exp {
        return (FieldStatus::Pass, None);
    }

    // A large length difference means a different name, not a typo.
    let (ext_len, exp_len) = (ext.chars().count() as f64, exp.chars().count() as f64);
    let length_ratio = ext_len.min(exp_len) / ext_len.max(exp_len);
    if length_ratio < BRAND_LENGTH_RATIO_FLOOR {
        return (
            FieldStatus::Fail,
            Some(format!(
                "Brand name mismatch: found \"{extracted}\", expected \"{expected}\""
            )),
        );
    }

    let similarity = ratio(&ext, &exp);
    if similarity >= BRAND_MINOR_DIFFERENCE {
        return (
            FieldStatus::Warning,
            Some(format!("Minor difference (similarity {similarity:.1}%)")),
        );
    }
    if similarity >= BRAND_POSSIBLE_MATCH {
        return (
            FieldStatus::Warning,
            Some(format!(
                "Possible match but significant difference (similarity {similarity:.1}%)"
            )),
        );
    }

    (FieldStatus::Fail, Some("Brand name mismatch".to_string()))
}

/// Compare an extracted class/type against the expected value.
pub fn compare_class_type(
    extracted: &str,
    expected: &str,
    matches: bool,
) -> (FieldStatus, Option<String>) {
    if matches {
        return (FieldStatus::Pass, None);
    }
    if extracted.is_empty() {
        return (
            FieldStatus::Fail,
            Some("Class/type not found on label".to_string()),
        );
    }
    if expected.is_empty() {
        return (FieldStatus::Pass, None);
    }

    let ext = extracted.to_lowercase().trim().to_string();
    let exp = expected.to_lowercase().trim().to_string();

    if ext == exp {
        return (FieldStatus::Pass, None);
    }

    if ext.contains(&exp) || exp.contains(&ext) {
        return (
            FieldStatus::Warning,
            Some("Partial match, verify full class/type on label".to_string()),
        );
    }

    let best = ratio(&ext, &exp).max(partial_ratio(&ext, &exp));
    if best >= CLASS_CLOSE_MATCH {
        return (
            FieldStatus::Warning,
            Some(format!(
                "Close match but difference detected (similarity: {best:.1}%)"
            )),
        );
    }

    (FieldStatus::Fail, Some("Class/type mismatch".to_string()))
}

/// Compare an extracted alcohol content declaration against the expected
/// value.
///
/// The comparison is numeric on the leading number; equal numbers with
/// differing proof wording is a format warning, and a difference within
/// half a percentage point is a tolerance warning.
pub fn compare_alcohol_content(
    extracted: &str,
    expected: &str,
    matches: bool,
) -> (FieldStatus, Option<String>) {
    if matches {
        return (FieldStatus::Pass, None);
    }
    if extracted.is_empty() {
        return (
            FieldStatus::Fail,
            Some("Alcohol content not found on label".to_string()),
        );
    }
    if expected.is_empty() {
        return (
            FieldStatus::Fail,
            Some("Expected alcohol content is missing from application data".to_string()),
        );
    }

    let (ext_num, exp_num) = match (leading_number(extracted), leading_number(expected)) {
        (Some(e), Some(x)) => (e, x),
        _ => {
            return (
                FieldStatus::Fail,
                Some("Could not parse alcohol content".to_string()),
            )
        }
    };

    if ext_num == exp_num {
        let ext_has_proof = extracted.to_lowercase().contains("proof");
        let exp_has_proof = expected.to_lowercase().contains("proof");
        if ext_has_proof != exp_has_proof {
            return (
                FieldStatus::Warning,
                Some("Percentage matches but format differs".to_string()),
            );
        }
        return (FieldStatus::Pass, None);
    }

    if (ext_num - exp_num).abs() <= ALCOHOL_DIFF_TOLERANCE {
        return (
            FieldStatus::Warning,
            Some("Minor difference detected".to_string()),
        );
    }

    (
        FieldStatus::Fail,
        Some("Alcohol content mismatch".to_string()),
    )
}

/// Compare an extracted net contents declaration against the expected
/// value.
///
/// Strict: volume and unit must both match. There is no warning tier.
pub fn compare_net_contents(
    extracted: &str,
    expected: &str,
    matches: bool,
) -> (FieldStatus, Option<String>) {
    if matches {
        return (FieldStatus::Pass, None);
    }
    if extracted.is_empty() {
        return (
            FieldStatus::Fail,
            Some("Net contents not found on label".to_string()),
        );
    }
    if expected.is_empty() {
        return (FieldStatus::Pass, None);
    }

    let (ext_num, exp_num) = match (leading_number_str(extracted), leading_number_str(expected)) {
        (Some(e), Some(x)) => (e, x),
        _ => {
            return (
                FieldStatus::Fail,
                Some("Could not parse net contents".to_string()),
            )
        }
    };

    if ext_num != exp_num {
        return (FieldStatus::Fail, Some("Volume mismatch".to_string()));
    }

    let ext_unit = unit_of(extracted);
    let exp_unit = unit_of(expected);
    if ext_unit != exp_unit {
        return (FieldStatus::Fail, Some("Unit mismatch".to_string()));
    }

    (FieldStatus::Pass, None)
}

/// Check the government warning statement for presence, capitalization, and
/// text accuracy.
pub fn check_government_warning(
    present: bool,
    all_caps: bool,
    text: &str,
    matches: bool,
) -> (FieldStatus, Option<String>) {
    if !present {
        return (
            FieldStatus::Fail,
            Some("Government warning statement not found on label".to_string()),
        );
    }
    if !all_caps {
        return (
            FieldStatus::Fail,
            Some("\"GOVERNMENT WARNING:\" must be in all capitals".to_string()),
        );
    }
    if matches {
        return (FieldStatus::Pass, None);
    }

    if text.is_empty() {
        // Present and correctly capitalized, with no text to compare.
        return (FieldStatus::Pass, None);
    }

    let similarity = ratio(&text.to_uppercase(), &canonical_warning().to_uppercase());

    if similarity >= WARNING_EXACT {
        return (FieldStatus::Pass, None);
    }
    if similarity >= WARNING_OCR_ARTIFACT {
        return (
            FieldStatus::Warning,
            Some(format!(
                "Warning statement is very close but not exact (similarity: {similarity:.1}%). \
                 May be an OCR artifact"
            )),
        );
    }
    if similarity >= WARNING_MANUAL_REVIEW {
        return (
            FieldStatus::Warning,
            Some(format!(
                "Warning statement has notable differences (similarity: {similarity:.1}%). \
                 Manual review required"
            )),
        );
    }

    (
        FieldStatus::Fail,
        Some(format!(
            "Warning statement does not match required text (similarity: {similarity:.1}%)"
        )),
    )
}

/// Verify all five fields and aggregate the overall verdict.
pub fn verify_fields(
    extracted: &ExtractedFields,
    hints: &MatchHints,
    expected: &ExpectedFields,
) -> VerificationResult {
    let (brand_status, brand_note) =
        compare_brand_name(&extracted.brand_name, &expected.brand_name, hints.brand_name);
    let (class_status, class_note) =
        compare_class_type(&extracted.class_type, &expected.class_type, hints.class_type);
    let (alcohol_status, alcohol_note) = compare_alcohol_content(
        &extracted.alcohol_content,
        &expected.alcohol_content,
        hints.alcohol_content,
    );
    let (contents_status, contents_note) = compare_net_contents(
        &extracted.net_contents,
        &expected.net_contents,
        hints.net_contents,
    );
    let (warning_status, warning_note) = check_government_warning(
        extracted.government_warning_present,
        extracted.government_warning_all_caps,
        &extracted.government_warning_text,
        hints.government_warning,
    );

    let warning_extracted = if extracted.government_warning_present {
        "GOVERNMENT WARNING: present"
    } else {
        "Not found or incorrect"
    };

    VerificationResult::from_verdicts(vec![
        FieldVerdict::new(
            "Brand Name",
            extracted.brand_name.as_str(),
            expected.brand_name.as_str(),
            brand_status,
            brand_note,
        ),
        FieldVerdict::new(
            "Class/Type",
            extracted.class_type.as_str(),
            expected.class_type.as_str(),
            class_status,
            class_note,
        ),
        FieldVerdict::new(
            "Alcohol Content",
            extracted.alcohol_content.as_str(),
            expected.alcohol_content.as_str(),
            alcohol_status,
            alcohol_note,
        ),
        FieldVerdict::new(
            "Net Contents",
            extracted.net_contents.as_str(),
            expected.net_contents.as_str(),
            contents_status,
            contents_note,
        ),
        FieldVerdict::new(
            "Government Warning",
            warning_extracted,
            "GOVERNMENT WARNING: (standard text)",
            warning_status,
            warning_note,
        ),
    ])
}

/// First number in the string, parsed as `f64`.
fn leading_number(text: &str) -> Option<f64> {
    leading_number_str(text).and_then(|n| n.parse().ok())
}

/// First number in the string, as written.
fn leading_number_str(text: &str) -> Option<String> {
    number_pattern().find(text).map(|m| m.as_str().to_string())
}

/// Unit portion of a quantity string: digits, dots, and whitespace removed,
/// lowercased.
fn unit_of(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_digit() && *c != '.' && !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

fn number_pattern() -> Regex {
    Regex::new(r"\d+\.?\d*").expect("valid regex")
}
