//! Field classification: turning an ordered token stream into the five
//! semantic label fields.
//!
//! Every classifier is a pure function of the ordered texts and the original
//! token geometry, so classification is deterministic even though the
//! upstream OCR extraction is not.

mod vocab;

pub use vocab::{SPIRIT_DESCRIPTORS, SPIRIT_TYPES};

use regex::Regex;

use crate::model::{ExtractedFields, Token};

/// Number of preceding tokens scanned for class/type descriptors.
const CLASS_TYPE_LOOKBACK: usize = 4;

/// Minimum token confidence for brand-name candidacy.
const BRAND_MIN_CONFIDENCE: f32 = 0.5;

/// Vertical padding added when approximating label height from candidate
/// centers.
const BRAND_HEIGHT_PAD: f32 = 50.0;

/// Classifies ordered label text into semantic fields.
///
/// Holds the compiled regular expressions; construct once and reuse.
pub struct FieldClassifier {
    unit_or_percent: Regex,
    alcohol_patterns: Vec<Regex>,
    alcohol_extended: Regex,
    alcohol_bare_percent: Regex,
    alcohol_qualifier: Regex,
    net_patterns: Vec<Regex>,
    net_bare_number: Regex,
    net_unit: Regex,
    digits: Regex,
}

impl Default for FieldClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldClassifier {
    /// Compile the classification patterns.
    pub fn new() -> Self {
        Self {
            unit_or_percent: Regex::new(r"(?i)\d+%|\d+\s*ml|\d+\s*l\b").expect("valid regex"),
            alcohol_patterns: vec![
                // Most complete: percentage + ALC/VOL or ABV
                Regex::new(r"(?i)\d+\.?\d*\s*%\s*(?:ALC\.?/?VOL\.?|ABV)").expect("valid regex"),
                // Percentage + PROOF
                Regex::new(r"(?i)\d+\.?\d*\s*PROOF").expect("valid regex"),
                // Bare percentage (last resort)
                Regex::new(r"\d+\.?\d*\s*%").expect("valid regex"),
            ],
            alcohol_extended: Regex::new(
                r"(?i)\d+\.?\d*\s*%\s*(?:ALC\.?/?VOL\.?)?\s*\(?\d+\.?\d*\s*PROOF\)?",
            )
            .expect("valid regex"),
            alcohol_bare_percent: Regex::new(r"^\d+\.?\d*%$").expect("valid regex"),
            alcohol_qualifier: Regex::new(r"(?i)^(?:ALC\.?/?VOL\.?|ABV|PROOF)$")
                .expect("valid regex"),
            net_patterns: vec![
                Regex::new(r"(?i)\d+\.?\d*\s*(?:ML|CL|LITRE|LITER)\b").expect("valid regex"),
                Regex::new(r"(?i)\d+\.?\d*\s*L\b").expect("valid regex"),
            ],
            net_bare_number: Regex::new(r"^\d+\.?\d*$").expect("valid regex"),
            net_unit: Regex::new(r"(?i)^(?:ML|L|CL|LITRE|LITER)$").expect("valid regex"),
            digits: Regex::new(r"^\d+$").expect("valid regex"),
        }
    }

    /// Extract all five fields from one reconstructed capture.
    ///
    /// `texts` is the reading-ordered token text, `tokens` the original
    /// tokens with geometry, and `split_x` the column split when the capture
    /// held two labels.
    pub fn classify(
        &self,
        texts: &[String],
        tokens: &[Token],
        split_x: Option<f32>,
    ) -> ExtractedFields {
        let (warning_present, warning_all_caps, warning_text) = self.government_warning(texts);

        ExtractedFields {
            brand_name: self.brand_name(texts, tokens, split_x),
            class_type: self.class_type(texts),
            alcohol_content: self.alcohol_content(texts),
            net_contents: self.net_contents(texts),
            government_warning_text: warning_text,
            government_warning_present: warning_present,
            government_warning_all_caps: warning_all_caps,
        }
    }

    /// Extract the brand name.
    ///
    /// Primary strategy: the tallest candidate token in the top half of the
    /// label, joined with the other candidates on its line (and its side of
    /// a column split), left to right. Ties on height break leftmost, then
    /// topmost. Fallback: the first ordered text that survives the same
    /// stop-word filters.
    pub fn brand_name(&self, texts: &[String], tokens: &[Token], split_x: Option<f32>) -> String {
        let candidates: Vec<&Token> = tokens
            .iter()
            .filter(|t| t.confidence >= BRAND_MIN_CONFIDENCE && self.is_brand_candidate(&t.text))
            .collect();

        if !candidates.is_empty() {
            let approx_height = candidates
                .iter()
                .map(|t| t.center_y())
                .fold(f32::NEG_INFINITY, f32::max)
                + BRAND_HEIGHT_PAD;

            let mut top_half: Vec<&Token> = candidates
                .iter()
                .copied()
                .filter(|t| t.center_y() < approx_height * 0.5)
                .collect();

            if !top_half.is_empty() {
                top_half.sort_by(|a, b| {
                    b.height()
                        .total_cmp(&a.height())
                        .then(a.left().total_cmp(&b.left()))
                        .then(a.top().total_cmp(&b.top()))
                });
                let winner = top_half[0];

                // Collect the winner's line mates on the same label region.
                let band = winner.height() * 0.5;
                let mut line: Vec<&Token> = top_half
                    .iter()
                    .copied()
                    .filter(|&t| {
                        (t.center_y() - winner.center_y()).abs() <= band
                            && same_region(t, winner, split_x)
                    })
                    .collect();
                line.sort_by(|a, b| a.left().total_cmp(&b.left()));

                return line
                    .iter()
                    .map(|t| t.text.trim())
                    .collect::<Vec<_>>()
                    .join(" ");
            }
        }

        // Fallback: first meaningful word in reading order.
        for text in texts {
            if self.is_brand_candidate(text) {
                return text.trim().to_string();
            }
        }

        String::new()
    }

    fn is_brand_candidate(&self, text: &str) -> bool {
        let trimmed = text.trim();
        let lower = trimmed.to_lowercase();
        trimmed.len() >= 2
            && !vocab::is_stop_word(&lower)
            && !self.digits.is_match(trimmed)
            && !self.unit_or_percent.is_match(&lower)
    }

    /// Extract the class/type phrase (e.g. "STRAIGHT RYE WHISKY").
    ///
    /// Anchors on spirit-type keywords, greedily collects up to
    /// [`CLASS_TYPE_LOOKBACK`] preceding descriptor-or-type tokens
    /// (resetting on anything else so brand text is not swallowed), and
    /// optionally appends one following descriptor/type token. The longest
    /// assembled phrase across all anchors wins.
    pub fn class_type(&self, texts: &[String]) -> String {
        let lower: Vec<String> = texts.iter().map(|t| t.trim().to_lowercase()).collect();

        let mut best = String::new();

        for (idx, word) in lower.iter().enumerate() {
            if !vocab::is_spirit_type(word) {
                continue;
            }

            let mut parts: Vec<&str> = Vec::new();
            let lookback = CLASS_TYPE_LOOKBACK.min(idx);
            for i in (idx - lookback)..idx {
                if vocab::is_descriptor_or_type(&lower[i]) {
                    parts.push(texts[i].trim());
                } else {
                    parts.clear();
                }
            }

            parts.push(texts[idx].trim());

            if let Some(next) = lower.get(idx + 1) {
                if vocab::is_descriptor_or_type(next) {
                    parts.push(texts[idx + 1].trim());
                }
            }

            let candidate = parts.join(" ");
            if candidate.len() > best.len() {
                best = candidate;
            }
        }

        best
    }

    /// Extract the alcohol content declaration.
    ///
    /// Pattern priority: `<num>% ALC/VOL|ABV`, then `<num> PROOF`, then a
    /// bare percentage. A percentage match is extended to grab an adjacent
    /// proof qualifier ("45% ALC/VOL (90 PROOF)"). Falls back to values
    /// split across adjacent tokens ("45%" then "ALC/VOL").
    pub fn alcohol_content(&self, texts: &[String]) -> String {
        let full_text = texts.join(" ");

        for pattern in &self.alcohol_patterns {
            if let Some(m) = pattern.find(&full_text) {
                if let Some(ext) = self.alcohol_extended.find(&full_text) {
                    return ext.as_str().trim().to_string();
                }
                return m.as_str().trim().to_string();
            }
        }

        for (idx, text) in texts.iter().enumerate() {
            if self.alcohol_bare_percent.is_match(text.trim()) {
                if let Some(next) = texts.get(idx + 1) {
                    if self.alcohol_qualifier.is_match(next.trim()) {
                        return format!("{} {}", text.trim(), next.trim());
                    }
                }
                return text.trim().to_string();
            }
        }

        String::new()
    }

    /// Extract the net contents declaration ("750 ML", "1.75L", ...).
    pub fn net_contents(&self, texts: &[String]) -> String {
        let full_text = texts.join(" ");

        for pattern in &self.net_patterns {
            if let Some(m) = pattern.find(&full_text) {
                return m.as_str().trim().to_string();
            }
        }

        for (idx, text) in texts.iter().enumerate() {
            if self.net_bare_number.is_match(text.trim()) {
                if let Some(next) = texts.get(idx + 1) {
                    if self.net_unit.is_match(next.trim()) {
                        return format!("{} {}", text.trim(), next.trim());
                    }
                }
            }
        }

        String::new()
    }

    /// Locate the government warning statement.
    ///
    /// Returns `(present, all_caps, text)`. Presence requires both the
    /// opening "GOVERNMENT" and the closing "PROBLEMS." in the uppercased
    /// joined text; the candidate text is the inclusive window between
    /// them. The caps flag probes the original-case text for the literal
    /// `GOVERNMENT WARNING:` header, independently of the search.
    pub fn government_warning(&self, texts: &[String]) -> (bool, bool, String) {
        const START_WORD: &str = "GOVERNMENT";
        const END_WORD: &str = "PROBLEMS.";

        let joined = texts.join(" ");
        let all_caps = joined.contains("GOVERNMENT WARNING:");

        let upper = joined.to_uppercase();
        let start = upper.find(START_WORD);
        let end = upper.find(END_WORD).map(|i| i + END_WORD.len());

        match (start, end) {
            (Some(start), Some(end)) if start < end => {
                (true, all_caps, upper[start..end].to_string())
            }
            (Some(_), Some(_)) => (true, all_caps, String::new()),
            _ => (false, all_caps, String::new()),
        }
    }
}

fn same_region(a: &Token, b: &Token, split_x: Option<f32>) -> bool {
    match split_x {
        None => true,
        Some(split) => (a.center_x() < split) == (b.center_x() < split),
    }
}
