//! Approximate substring scoring used by the catalog index.
//!
//! A query is aligned against the best-matching substring of a label, so a
//! hit in the middle of the label costs the same as a prefix hit. Edits are
//! insertions, deletions, substitutions and adjacent transpositions, each
//! costing one.

/// Lowercase a string into the char form the scorer compares on.
pub fn fold(s: &str) -> Vec<char> {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Minimum number of edits needed to turn `query` into some substring of
/// `text`. Both sides are expected to be folded already.
pub fn substring_distance(query: &[char], text: &[char]) -> usize {
    let m = query.len();
    let n = text.len();
    if m == 0 {
        return 0;
    }
    if n == 0 {
        return m;
    }

    // Rows over the text; row 0 is all zeros so alignment may start anywhere.
    let mut before_prev = vec![0usize; n + 1];
    let mut prev = vec![0usize; n + 1];
    let mut cur = vec![0usize; n + 1];

    for i in 1..=m {
        cur[0] = i;
        for j in 1..=n {
            let cost = usize::from(query[i - 1] != text[j - 1]);
            let mut best = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
            if i > 1 && j > 1 && query[i - 1] == text[j - 2] && query[i - 2] == text[j - 1] {
                best = best.min(before_prev[j - 2] + 1);
            }
            cur[j] = best;
        }
        std::mem::swap(&mut before_prev, &mut prev);
        std::mem::swap(&mut prev, &mut cur);
    }

    // After the final swap the last computed row lives in `prev`.
    prev.iter().copied().min().unwrap_or(m)
}

/// Normalized score on a 0..=1 scale where 0 is an exact substring hit.
pub fn score(query: &[char], text: &[char]) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let distance = substring_distance(query, text).min(query.len());
    distance as f64 / query.len() as f64
}
