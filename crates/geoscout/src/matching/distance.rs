/// Levenshtein edit distance over Unicode scalar values.
///
/// Classic dynamic programme over a `(len(b) + 1) x (len(a) + 1)` table where insertion,
/// deletion and substitution each cost 1.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut table = vec![vec![0usize; a.len() + 1]; b.len() + 1];
    for (i, row) in table.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in table[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=b.len() {
        for j in 1..=a.len() {
            let substitution = usize::from(b[i - 1] != a[j - 1]);
            table[i][j] = (table[i - 1][j] + 1)
                .min(table[i][j - 1] + 1)
                .min(table[i - 1][j - 1] + substitution);
        }
    }
    table[b.len()][a.len()]
}

/// `(max_len - distance) / max_len` on the lower-cased strings, in `[0, 1]`.
///
/// Two empty strings are identical and score 1.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein(&a, &b);
    (max_len - distance) as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_distances() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("jalan", "jln"), 2);
    }

    #[test]
    fn test_identity() {
        for s in ["", "a", "Jalan Ampang", "Persiaran KLCC", "Cheras Ñ"] {
            assert_eq!(levenshtein(s, s), 0);
            assert_eq!(similarity(s, s), 1.0);
        }
    }

    #[test]
    fn test_symmetry() {
        let samples = [
            "",
            "jalan",
            "Jalan Ampang",
            "jln ampang",
            "Lorong Haji Taib",
            "Persiaran Gurney",
            "ÄÖÜ street",
        ];
        for a in samples {
            for b in samples {
                assert_eq!(levenshtein(a, b), levenshtein(b, a), "{a:?} vs {b:?}");
                assert_eq!(similarity(a, b), similarity(b, a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        assert_eq!(levenshtein("é", "e"), 1);
        assert_eq!(levenshtein("日本", "日"), 1);
    }

    #[test]
    fn test_similarity_is_case_insensitive_and_bounded() {
        assert_eq!(similarity("JALAN AMPANG", "jalan ampang"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);

        let s = similarity("Jalan Ampang", "Jln Ampang");
        assert!(s > 0.0 && s < 1.0);
        assert!((s - 10.0 / 12.0).abs() < 1e-12);
    }
}
