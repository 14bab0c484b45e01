//! String similarity ratios on a 0-100 scale.

/// Full-string similarity ratio in `[0, 100]`, from the normalized
/// Levenshtein distance.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Best similarity of the shorter string against any equal-length window of
/// the longer one, in `[0, 100]`.
///
/// Catches an expected phrase embedded in a longer extracted one (and vice
/// versa), which the full ratio penalizes for the length difference.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    let (short, long, short_len, long_len) = if a_len <= b_len {
        (a, b, a_len, b_len)
    } else {
        (b, a, b_len, a_len)
    };

    if short_len == 0 {
        return if long_len == 0 { 100.0 } else { 0.0 };
    }
    if short_len == long_len {
        return ratio(short, long);
    }

    let long_chars: Vec<char> = long.chars().collect();
    let mut best = 0.0f64;
    for start in 0..=(long_len - short_len) {
        let window: String = long_chars[start..start + short_len].iter().collect();
        let score = ratio(short, &window);
        if score > best {
            best = score;
        }
        if best >= 100.0 {
            break;
        }
    }
    best
}
