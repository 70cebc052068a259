//! Similarity ranking of subtitle candidates
//!
//! Catalog results are ordered by how closely their release name matches the
//! local video's filename, using the plain Levenshtein edit distance.

use std::path::Path;

/// Computes the Levenshtein edit distance between two strings.
///
/// Insertion, deletion and substitution each cost 1. The comparison is done
/// on raw characters without any case-folding or normalization.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev_row: Vec<usize> = (0..=b.len()).collect();
    let mut curr_row: Vec<usize> = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr_row[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr_row[j] = (prev_row[j] + 1)
                .min(curr_row[j - 1] + 1)
                .min(prev_row[j - 1] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b.len()]
}

/// Orders `candidates` by ascending edit distance between `reference` and
/// the label returned by `label_of`.
///
/// Candidates without a label are compared against the empty string. The
/// sort is stable, so candidates at equal distance keep their catalog order.
pub fn rank_by_similarity<T, F>(reference: &str, candidates: &mut [T], label_of: F)
where
    F: Fn(&T) -> Option<&str>,
{
    candidates.sort_by_cached_key(|candidate| {
        edit_distance(reference, label_of(candidate).unwrap_or_default())
    });
}

/// Reduces a video filename (or full path) to the name used for ranking.
///
/// The directory part and the final extension are dropped, so
/// `/media/Show.S01E02.HDTV.mkv` becomes `Show.S01E02.HDTV`.
pub fn reference_name(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance_known_values() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("saturday", "sunday"), 3);
        assert_eq!(edit_distance("", "hello"), 5);
        assert_eq!(edit_distance("hello", ""), 5);
        assert_eq!(edit_distance("", ""), 0);
    }

    #[test]
    fn test_edit_distance_is_symmetric() {
        let samples = [
            "",
            "a",
            "Show.S01E02.WEB",
            "Show.S01E02.HDTV",
            "show.s01e02.hdtv",
            "שלום",
        ];
        for a in samples {
            for b in samples {
                assert_eq!(edit_distance(a, b), edit_distance(b, a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_edit_distance_zero_only_for_identical() {
        assert_eq!(edit_distance("Show.S01E02", "Show.S01E02"), 0);
        assert_ne!(edit_distance("Show.S01E02", "show.s01e02"), 0);
        assert_ne!(edit_distance("abc", "abcd"), 0);
    }

    #[test]
    fn test_rank_orders_by_distance() {
        let mut candidates = vec![
            (10, Some("Show.S01E02.WEB")),
            (11, Some("Show.S01E02.HDTV")),
        ];
        rank_by_similarity("Show.S01E02.HDTV", &mut candidates, |c| c.1);
        assert_eq!(candidates[0].0, 11);
        assert_eq!(candidates[1].0, 10);
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let mut candidates = vec![
            (1, Some("aaX")),
            (2, Some("aaY")),
            (3, Some("aa")),
            (4, Some("aaZ")),
        ];
        rank_by_similarity("aa", &mut candidates, |c| c.1);
        let order: Vec<i32> = candidates.iter().map(|c| c.0).collect();
        assert_eq!(order, vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_rank_missing_label_compares_as_empty() {
        let mut candidates = vec![(1, Some("completely different")), (2, None)];
        rank_by_similarity("ab", &mut candidates, |c| c.1);
        // "" is 2 edits away from "ab", the long label is much further
        assert_eq!(candidates[0].0, 2);
    }

    #[test]
    fn test_reference_name_strips_directory_and_extension() {
        assert_eq!(reference_name("Show.S01E02.HDTV.mkv"), "Show.S01E02.HDTV");
        assert_eq!(reference_name("/media/tv/Show.S01E02.HDTV.mkv"), "Show.S01E02.HDTV");
        assert_eq!(reference_name("no_extension"), "no_extension");
    }
}
