//! Ranked top-k selection for classification scores.

use crate::util::math::score_cmp_desc;
use crate::util::{SiftError, SiftResult};
use std::cmp::Ordering;

/// One class channel after ranking.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationPrediction {
    /// Output channel index.
    pub index: usize,
    /// Label looked up from the caller's table.
    pub label: String,
    /// Raw channel score.
    pub score: f32,
}

/// Score paired with its channel index, before labels are attached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreEntry {
    /// Output channel index.
    pub index: usize,
    /// Raw channel score.
    pub score: f32,
}

fn entry_cmp_desc(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    score_cmp_desc(a.score, b.score).then_with(|| a.index.cmp(&b.index))
}

/// Sorts entries by descending score, ties by ascending index.
pub(crate) fn sort_entries_desc(entries: &mut [ScoreEntry]) {
    entries.sort_by(entry_cmp_desc);
}

/// Parameters for ranked filtering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankParams {
    /// Scores must be strictly greater than this value.
    pub threshold: f32,
    /// Maximum number of entries to keep; `None` keeps all.
    pub top: Option<usize>,
}

impl Default for RankParams {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            top: None,
        }
    }
}

/// Top-K container with O(k) insertion cost.
pub struct TopK<T> {
    k: usize,
    items: Vec<T>,
}

impl TopK<ScoreEntry> {
    /// Creates a new Top-K collector.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            items: Vec::with_capacity(k),
        }
    }

    /// Pushes an entry, evicting the lowest ranked one if at capacity.
    pub fn push(&mut self, entry: ScoreEntry) {
        if self.k == 0 {
            return;
        }
        if self.items.len() < self.k {
            self.items.push(entry);
            return;
        }

        let mut worst_idx = 0usize;
        for (idx, item) in self.items.iter().enumerate().skip(1) {
            if entry_cmp_desc(item, &self.items[worst_idx]) == Ordering::Greater {
                worst_idx = idx;
            }
        }

        if entry_cmp_desc(&entry, &self.items[worst_idx]) == Ordering::Less {
            self.items[worst_idx] = entry;
        }
    }

    /// Returns entries sorted by descending score.
    pub fn into_sorted_desc(mut self) -> Vec<ScoreEntry> {
        sort_entries_desc(&mut self.items);
        self.items
    }
}

/// Ranks per-class scores, keeps at most `top` of them and drops every score
/// not strictly above `threshold`.
///
/// `labels` must be index-aligned with `values`; a length difference is an
/// error rather than a silent truncation.
pub fn top_k<S: AsRef<str>>(
    values: &[f32],
    labels: &[S],
    params: RankParams,
) -> SiftResult<Vec<ClassificationPrediction>> {
    if values.len() != labels.len() {
        return Err(SiftError::LengthMismatch {
            expected: values.len(),
            got: labels.len(),
            context: "classification labels",
        });
    }

    // NaN fails the threshold test, so it never reaches the collector.
    let mut entries: Vec<ScoreEntry> = values
        .iter()
        .enumerate()
        .filter(|(_, score)| **score > params.threshold)
        .map(|(index, &score)| ScoreEntry { index, score })
        .collect();

    let ranked = match params.top {
        Some(k) if k < entries.len() => {
            let mut collector = TopK::new(k);
            for entry in entries {
                collector.push(entry);
            }
            collector.into_sorted_desc()
        }
        _ => {
            sort_entries_desc(&mut entries);
            entries
        }
    };

    Ok(ranked
        .into_iter()
        .map(|entry| ClassificationPrediction {
            index: entry.index,
            label: labels[entry.index].as_ref().to_owned(),
            score: entry.score,
        })
        .collect())
}
