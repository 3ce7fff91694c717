//! Approximate string similarity on a 0–100 scale.
//!
//! `ratio` is the normalized Indel similarity (insertions and deletions only,
//! no substitutions): `100 * (1 - indel / (len_a + len_b))`, where
//! `indel = len_a + len_b - 2 * lcs`. Lengths are counted in chars so Persian
//! text scores the same as Latin text.

/// Length of the longest common subsequence of two char slices.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let lcs = lcs_len(&a, &b);
    100.0 * (2 * lcs) as f64 / total as f64
}

/// `ratio` after sorting each input's whitespace-separated tokens, so word
/// order does not matter ("django rest" ≈ "rest django").
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Best-scoring choice for `query` as `(index, score)`. Ties keep the earliest
/// choice. Returns `None` when there are no choices.
pub fn extract_one<S: AsRef<str>>(query: &str, choices: &[S]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, choice) in choices.iter().enumerate() {
        let score = token_sort_ratio(query, choice.as_ref());
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((idx, score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert!(approx(ratio("python", "python"), 100.0));
        assert!(approx(ratio("abc", "xyz"), 0.0));
        assert!(approx(ratio("", ""), 100.0));
        assert!(approx(ratio("abc", ""), 0.0));
    }

    #[test]
    fn test_ratio_known_values() {
        // lcs("postgres", "postgresql") = 8 → 16 / 18
        assert!(approx(ratio("postgres", "postgresql"), 88.888));
        // lcs("java", "javascript") = 4 → 8 / 14
        assert!(approx(ratio("java", "javascript"), 57.142));
    }

    #[test]
    fn test_ratio_counts_chars_not_bytes() {
        assert!(approx(ratio("پایتون", "پایتون"), 100.0));
        // one char dropped from six: 10 / 11
        assert!(approx(ratio("پایتون", "پایتو"), 90.909));
    }

    #[test]
    fn test_token_sort_ratio_ignores_word_order() {
        assert!(approx(token_sort_ratio("rest django", "django rest"), 100.0));
        assert!(token_sort_ratio("rest django", "django") < 100.0);
    }

    #[test]
    fn test_extract_one_picks_best_and_first_on_tie() {
        let choices = ["java", "javascript", "postgresql"];
        let (idx, score) = extract_one("postgres", &choices).unwrap();
        assert_eq!(idx, 2);
        assert!(score > 80.0);

        let (idx, _) = extract_one("ab", &["ab", "ab"]).unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn test_extract_one_empty_choices() {
        let choices: [&str; 0] = [];
        assert!(extract_one("python", &choices).is_none());
    }
}
