//! Reading-order reconstruction for unordered OCR tokens.
//!
//! OCR engines report tokens in detection order, not reading order. This
//! module rebuilds natural reading order by grouping tokens into horizontal
//! lines and sorting each line left-to-right, and detects captures that
//! contain two physically distinct labels side by side by scanning for a
//! full-height column gap between them.

use crate::model::Token;

/// Tunable thresholds for layout reconstruction.
///
/// The defaults are the empirically determined values; they are
/// configuration, not invariants.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Tokens at or below this confidence are dropped.
    pub min_confidence: f32,
    /// Number of horizontal bands the image height is partitioned into for
    /// the column-gap scan.
    pub bands: usize,
    /// Fraction of bands that must be free of straddling tokens for a
    /// candidate column to count as clear.
    pub clear_band_ratio: f32,
    /// Minimum width of a clear run, as a fraction of image width, for it
    /// to qualify as a label separator.
    pub min_gap_ratio: f32,
    /// A token joins the running line when its vertical-center distance to
    /// the line's last token is within this factor of the mean token height.
    pub line_height_factor: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            min_confidence: 0.2,
            bands: 8,
            clear_band_ratio: 0.8,
            min_gap_ratio: 0.05,
            line_height_factor: 0.5,
        }
    }
}

/// Reconstructed reading order for one capture.
#[derive(Debug, Clone)]
pub struct ReadingOrder {
    /// Token texts in natural reading order. When the capture holds two
    /// labels, the left label's text comes before the right label's.
    pub texts: Vec<String>,
    /// X coordinate of the detected column split, when the capture contains
    /// two side-by-side labels.
    pub split_x: Option<f32>,
}

/// Reconstruct reading order from unordered tokens.
///
/// Tokens with confidence at or below `opts.min_confidence` or with empty
/// text are dropped first. The result is a pure function of token
/// positions: identical token sets produce identical output regardless of
/// input order.
pub fn reading_order(
    tokens: &[Token],
    img_width: f32,
    img_height: f32,
    opts: &LayoutOptions,
) -> ReadingOrder {
    let kept: Vec<&Token> = tokens
        .iter()
        .filter(|t| t.confidence > opts.min_confidence && !t.text.trim().is_empty())
        .collect();

    if kept.is_empty() {
        return ReadingOrder {
            texts: Vec::new(),
            split_x: None,
        };
    }

    let split_x = detect_column_split(&kept, img_width, img_height, opts);

    let texts = match split_x {
        None => line_sorted_texts(&kept, opts),
        Some(split) => {
            log::debug!("Column split detected at x={split:.1}, ordering left label first");
            let left: Vec<&Token> = kept
                .iter()
                .copied()
                .filter(|t| t.center_x() < split)
                .collect();
            let right: Vec<&Token> = kept
                .iter()
                .copied()
                .filter(|t| t.center_x() >= split)
                .collect();
            let mut texts = line_sorted_texts(&left, opts);
            texts.extend(line_sorted_texts(&right, opts));
            texts
        }
    };

    ReadingOrder { texts, split_x }
}

/// Scan for a full-height column gap separating two labels.
///
/// Candidate split columns are tested one pixel at a time within the middle
/// third of the image width. The height is partitioned into `opts.bands`
/// equal bands; a column is clear when at least `opts.clear_band_ratio` of
/// the bands have no token straddling it. The split point is the midpoint
/// of the first contiguous clear run at least `opts.min_gap_ratio` of the
/// image width wide. A run still open at the end of the scan range counts.
///
/// Returns `None` when no qualifying run exists; a genuine single-column
/// label must never be split.
pub fn detect_column_split(
    tokens: &[&Token],
    img_width: f32,
    img_height: f32,
    opts: &LayoutOptions,
) -> Option<f32> {
    if img_width <= 0.0 || img_height <= 0.0 || opts.bands == 0 {
        return None;
    }

    let band_height = img_height / opts.bands as f32;
    let mid_start = (img_width / 3.0) as i32;
    let mid_end = (2.0 * img_width / 3.0) as i32;
    let min_gap_px = img_width * opts.min_gap_ratio;

    let mut gap_start: Option<i32> = None;

    for x in mid_start..mid_end {
        let xf = x as f32;
        let mut bands_clear = 0usize;
        for b in 0..opts.bands {
            let band_top = b as f32 * band_height;
            let band_bot = (b + 1) as f32 * band_height;
            let crossed = tokens.iter().any(|t| {
                t.left() < xf && xf < t.right() && t.top() < band_bot && t.bottom() > band_top
            });
            if !crossed {
                bands_clear += 1;
            }
        }

        let is_clear = bands_clear as f32 / opts.bands as f32 >= opts.clear_band_ratio;

        if is_clear {
            if gap_start.is_none() {
                gap_start = Some(x);
            }
        } else if let Some(start) = gap_start {
            if (x - start) as f32 >= min_gap_px {
                return Some((start + x) as f32 / 2.0);
            }
            gap_start = None;
        }
    }

    // Clear run extends to the edge of the scan range.
    if let Some(start) = gap_start {
        if (mid_end - start) as f32 >= min_gap_px {
            return Some((start + mid_end) as f32 / 2.0);
        }
    }

    None
}

/// Group tokens into horizontal lines.
///
/// Tokens are sorted by vertical center; a token joins the running line when
/// its vertical-center distance to the line's last token is within
/// `factor` times the mean token height of the grouping. Ties sort by left
/// edge so the grouping is independent of input order.
pub fn group_into_lines<'a>(tokens: &[&'a Token], factor: f32) -> Vec<Vec<&'a Token>> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let avg_height =
        tokens.iter().map(|t| t.height()).sum::<f32>() / tokens.len() as f32;
    let threshold = avg_height * factor;

    let mut sorted: Vec<&Token> = tokens.to_vec();
    sorted.sort_by(|a, b| {
        a.center_y()
            .total_cmp(&b.center_y())
            .then(a.left().total_cmp(&b.left()))
    });

    let mut lines: Vec<Vec<&Token>> = Vec::new();
    let mut current: Vec<&Token> = vec![sorted[0]];
    let mut last = sorted[0];
    for &token in &sorted[1..] {
        if (token.center_y() - last.center_y()).abs() <= threshold {
            current.push(token);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push(token);
        }
        last = token;
    }
    lines.push(current);

    for line in &mut lines {
        line.sort_by(|a, b| {
            a.left()
                .total_cmp(&b.left())
                .then(a.top().total_cmp(&b.top()))
        });
    }

    lines
}

fn line_sorted_texts(tokens: &[&Token], opts: &LayoutOptions) -> Vec<String> {
    group_into_lines(tokens, opts.line_height_factor)
        .into_iter()
        .flatten()
        .map(|t| t.text.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Token;

    fn tok(text: &str, left: f32, top: f32, right: f32, bottom: f32) -> Token {
        Token::from_rect(text, 0.95, left, top, right, bottom)
    }

    /// A plausible single label: brand on top, type, alcohol line, warning.
    fn single_label() -> Vec<Token> {
        vec![
            tok("OLD", 300.0, 50.0, 420.0, 110.0),
            tok("CROW", 440.0, 50.0, 600.0, 110.0),
            tok("STRAIGHT", 250.0, 150.0, 400.0, 185.0),
            tok("RYE", 410.0, 150.0, 470.0, 185.0),
            tok("WHISKY", 480.0, 150.0, 620.0, 185.0),
            tok("45%", 300.0, 240.0, 380.0, 270.0),
            tok("ALC/VOL", 390.0, 240.0, 520.0, 270.0),
            tok("750", 300.0, 300.0, 360.0, 330.0),
            tok("ML", 370.0, 300.0, 420.0, 330.0),
        ]
    }

    #[test]
    fn test_empty_token_set() {
        let order = reading_order(&[], 800.0, 600.0, &LayoutOptions::default());
        assert!(order.texts.is_empty());
        assert!(order.split_x.is_none());
    }

    #[test]
    fn test_low_confidence_and_blank_dropped() {
        let tokens = vec![
            Token::from_rect("KEEP", 0.9, 10.0, 10.0, 60.0, 30.0),
            Token::from_rect("NOISE", 0.2, 10.0, 40.0, 60.0, 60.0),
            Token::from_rect("  ", 0.9, 10.0, 70.0, 60.0, 90.0),
        ];
        let order = reading_order(&tokens, 800.0, 600.0, &LayoutOptions::default());
        assert_eq!(order.texts, vec!["KEEP"]);
    }

    #[test]
    fn test_reading_order_single_label() {
        let order = reading_order(&single_label(), 900.0, 400.0, &LayoutOptions::default());
        assert_eq!(
            order.texts,
            vec!["OLD", "CROW", "STRAIGHT", "RYE", "WHISKY", "45%", "ALC/VOL", "750", "ML"]
        );
        assert!(order.split_x.is_none(), "single label must not be split");
    }

    #[test]
    fn test_order_invariant_to_input_order() {
        let tokens = single_label();
        let baseline = reading_order(&tokens, 900.0, 400.0, &LayoutOptions::default()).texts;

        let mut reversed = tokens.clone();
        reversed.reverse();
        assert_eq!(
            reading_order(&reversed, 900.0, 400.0, &LayoutOptions::default()).texts,
            baseline
        );

        // An arbitrary interleave.
        let shuffled: Vec<Token> = (0..tokens.len())
            .map(|i| tokens[(i * 4 + 3) % tokens.len()].clone())
            .collect();
        assert_eq!(
            reading_order(&shuffled, 900.0, 400.0, &LayoutOptions::default()).texts,
            baseline
        );
    }

    #[test]
    fn test_two_labels_split_left_before_right() {
        // Two labels; the right one starts inside the middle third, so the
        // clear run closes mid-scan.
        let tokens = vec![
            tok("FRONT", 50.0, 40.0, 250.0, 100.0),
            tok("BRAND", 50.0, 140.0, 250.0, 180.0),
            tok("BACK", 550.0, 40.0, 900.0, 100.0),
            tok("WARNING", 550.0, 140.0, 950.0, 180.0),
        ];

        let order = reading_order(&tokens, 1000.0, 300.0, &LayoutOptions::default());
        let split = order.split_x.expect("corridor between labels must split");
        assert!(split > 250.0 && split < 550.0);
        assert_eq!(order.texts, vec!["FRONT", "BRAND", "BACK", "WARNING"]);
    }

    #[test]
    fn test_narrow_gap_does_not_split() {
        // Tokens leave only a thin corridor (under 5% of width) clear.
        let tokens = vec![
            tok("LEFT", 50.0, 40.0, 495.0, 100.0),
            tok("RIGHT", 515.0, 40.0, 950.0, 100.0),
            tok("LOWER", 50.0, 200.0, 495.0, 260.0),
            tok("TEXT", 515.0, 200.0, 950.0, 260.0),
        ];
        let order = reading_order(&tokens, 1000.0, 300.0, &LayoutOptions::default());
        assert!(order.split_x.is_none());
    }

    #[test]
    fn test_gap_at_scan_edge_still_splits() {
        // All right-label content sits past the middle third, so the clear
        // run stays open until the scan range ends.
        let tokens = vec![
            tok("LEFT", 20.0, 40.0, 320.0, 100.0),
            tok("LOWER", 20.0, 200.0, 320.0, 260.0),
            tok("RIGHT", 680.0, 40.0, 980.0, 100.0),
            tok("TEXT", 680.0, 200.0, 980.0, 260.0),
        ];
        let order = reading_order(&tokens, 1000.0, 300.0, &LayoutOptions::default());
        assert!(order.split_x.is_some());
        assert_eq!(order.texts, vec!["LEFT", "LOWER", "RIGHT", "TEXT"]);
    }

    #[test]
    fn test_adaptive_line_band() {
        // Slightly staggered tokens on one visual line stay grouped because
        // the band adapts to the mean token height.
        let tokens = vec![
            tok("ALPHA", 10.0, 100.0, 110.0, 140.0),
            tok("BETA", 120.0, 108.0, 220.0, 148.0),
            tok("GAMMA", 230.0, 95.0, 330.0, 135.0),
            tok("NEXT", 10.0, 200.0, 110.0, 240.0),
        ];
        let order = reading_order(&tokens, 400.0, 300.0, &LayoutOptions::default());
        assert_eq!(order.texts, vec!["ALPHA", "BETA", "GAMMA", "NEXT"]);
    }

    #[test]
    fn test_group_into_lines_shape() {
        let tokens = single_label();
        let refs: Vec<&Token> = tokens.iter().collect();
        let lines = group_into_lines(&refs, 0.5);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].len(), 2);
        assert_eq!(lines[1].len(), 3);
    }
}
