//! Normalized edit similarity for title matching
//!
//! Scores are on a 0-100 scale: `100 * (1 - indel / (len_a + len_b))`
//! where `indel` counts the insertions and deletions needed to turn one
//! string into the other. Equivalently `200 * lcs / (len_a + len_b)`.

/// Length of the longest common subsequence of two char slices
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    // Single rolling row over the shorter side
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; short.len() + 1];
    for &lc in long {
        let mut diag = 0;
        for (j, &sc) in short.iter().enumerate() {
            let up = row[j + 1];
            row[j + 1] = if lc == sc { diag + 1 } else { up.max(row[j]) };
            diag = up;
        }
    }
    row[short.len()]
}

/// Case-sensitive similarity ratio in [0, 100].
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(&a, &b) as f64 / total as f64
}

/// Case- and surrounding-whitespace-insensitive ratio.
pub fn normalized_ratio(a: &str, b: &str) -> f64 {
    ratio(&normalize(a), &normalize(b))
}

#[inline]
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_is_100() {
        assert_eq!(ratio("naruto", "naruto"), 100.0);
        assert_eq!(ratio("", ""), 100.0);
    }

    #[test]
    fn test_disjoint_is_0() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_known_ratio() {
        // lcs("naruto", "naruta") = 5 -> 200 * 5 / 12
        assert!((ratio("naruto", "naruta") - 83.333).abs() < 0.01);
        // lcs("one piece", "one peace") = 8 ("one pece") -> 200 * 8 / 18
        assert!((ratio("one piece", "one peace") - 88.888).abs() < 0.01);
    }

    #[test]
    fn test_symmetric() {
        assert_eq!(ratio("bleach", "bleached"), ratio("bleached", "bleach"));
    }

    #[test]
    fn test_normalized_ignores_case() {
        assert_eq!(normalized_ratio("  NARUTO ", "naruto"), 100.0);
        assert!(ratio("NARUTO", "naruto") < 1.0);
    }

    #[test]
    fn test_unicode_counts_chars() {
        assert_eq!(ratio("進撃の巨人", "進撃の巨人"), 100.0);
        assert!((ratio("進撃の巨人", "進撃") - 200.0 * 2.0 / 7.0).abs() < 1e-9);
    }
}
