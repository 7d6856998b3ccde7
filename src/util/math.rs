//! Score comparison helpers shared by ranking and suppression.

use std::cmp::Ordering;

/// Orders scores from highest to lowest, ranking NaN below every number.
#[inline]
pub(crate) fn score_cmp_desc(a: f32, b: f32) -> Ordering {
    rank_key(b).total_cmp(&rank_key(a))
}

#[inline]
fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

/// Converts a tensor element into a non-negative integer index.
pub(crate) fn to_index(value: f32) -> Option<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Some(value as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{score_cmp_desc, to_index};
    use std::cmp::Ordering;

    #[test]
    fn higher_scores_sort_first() {
        assert_eq!(score_cmp_desc(0.9, 0.1), Ordering::Less);
        assert_eq!(score_cmp_desc(0.1, 0.9), Ordering::Greater);
        assert_eq!(score_cmp_desc(0.5, 0.5), Ordering::Equal);
    }

    #[test]
    fn nan_ranks_last() {
        assert_eq!(score_cmp_desc(f32::NAN, -1.0), Ordering::Greater);
        assert_eq!(score_cmp_desc(-1.0, f32::NAN), Ordering::Less);
    }

    #[test]
    fn to_index_rejects_fractions_and_negatives() {
        assert_eq!(to_index(3.0), Some(3));
        assert_eq!(to_index(0.0), Some(0));
        assert_eq!(to_index(-1.0), None);
        assert_eq!(to_index(2.5), None);
        assert_eq!(to_index(f32::NAN), None);
        assert_eq!(to_index(f32::INFINITY), None);
    }
}
