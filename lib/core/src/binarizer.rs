//! Multi-label binarization
//!
//! Encodes variable-length label lists into fixed-width indicator columns.
//! The class universe is the sorted union of every label seen while fitting,
//! so the output layout is reproducible for the same input set.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a label's position in its list maps to a column value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", content = "weights", rename_all = "lowercase")]
pub enum LabelWeighting {
    /// Plain 0/1 presence
    #[default]
    Presence,
    /// `weights[k]` for the label at position `k`, 1.0 past the end
    Positional(Vec<f32>),
}

impl LabelWeighting {
    #[inline]
    pub fn weight_at(&self, position: usize) -> f32 {
        match self {
            LabelWeighting::Presence => 1.0,
            LabelWeighting::Positional(weights) => weights.get(position).copied().unwrap_or(1.0),
        }
    }
}

/// Fitted label universe
#[derive(Debug, Clone)]
pub struct MultiLabelBinarizer {
    classes: Vec<String>,
    index: AHashMap<String, usize>,
}

impl MultiLabelBinarizer {
    /// Learn the sorted class universe from label lists.
    pub fn fit<'a, I, L>(rows: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = &'a String>,
    {
        let classes: BTreeSet<&String> = rows.into_iter().flatten().collect();
        Self::from_classes(classes.into_iter().cloned().collect())
    }

    /// Rebuild from a persisted class list.
    pub fn from_classes(classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { classes, index }
    }

    #[inline]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Column index of a class, if it is part of the universe.
    #[inline]
    pub fn position(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Write one row's encoding into `out` (length must equal `len()`).
    ///
    /// A label occurring several times keeps the largest weight among its
    /// positions. Labels outside the universe are ignored.
    pub fn encode_into(&self, labels: &[String], weighting: &LabelWeighting, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.classes.len());
        out.iter_mut().for_each(|v| *v = 0.0);
        for (position, label) in labels.iter().enumerate() {
            if let Some(col) = self.position(label) {
                let w = weighting.weight_at(position);
                if w > out[col] {
                    out[col] = w;
                }
            }
        }
    }

    pub fn encode(&self, labels: &[String], weighting: &LabelWeighting) -> Vec<f32> {
        let mut row = vec![0.0; self.classes.len()];
        self.encode_into(labels, weighting, &mut row);
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_classes_sorted_union() {
        let rows = vec![labels(&["sports", "baseball"]), labels(&["action", "sports"])];
        let mlb = MultiLabelBinarizer::fit(rows.iter());
        assert_eq!(mlb.classes(), &["action", "baseball", "sports"]);
    }

    #[test]
    fn test_weighted_encoding() {
        let rows = vec![
            labels(&["baseball", "shounen", "sports"]),
            labels(&["action", "adventure"]),
        ];
        let mlb = MultiLabelBinarizer::fit(rows.iter());
        let weighting = LabelWeighting::Positional(vec![3.0, 2.0]);

        let first = mlb.encode(&rows[0], &weighting);
        assert_eq!(first[mlb.position("baseball").unwrap()], 3.0);
        assert_eq!(first[mlb.position("shounen").unwrap()], 2.0);
        assert_eq!(first[mlb.position("sports").unwrap()], 1.0);
        assert_eq!(first[mlb.position("action").unwrap()], 0.0);

        let second = mlb.encode(&rows[1], &weighting);
        assert_eq!(second[mlb.position("action").unwrap()], 3.0);
        assert_eq!(second[mlb.position("adventure").unwrap()], 2.0);
    }

    #[test]
    fn test_unweighted_encoding() {
        let rows = vec![labels(&["action", "shounen"]), labels(&["comedy"])];
        let mlb = MultiLabelBinarizer::fit(rows.iter());

        let first = mlb.encode(&rows[0], &LabelWeighting::Presence);
        assert_eq!(first[mlb.position("action").unwrap()], 1.0);
        assert_eq!(first[mlb.position("shounen").unwrap()], 1.0);
        assert_eq!(first[mlb.position("comedy").unwrap()], 0.0);
    }

    #[test]
    fn test_duplicate_label_takes_max_weight() {
        let row = labels(&["sports", "drama", "sports"]);
        let mlb = MultiLabelBinarizer::fit(std::iter::once(&row));
        let encoded = mlb.encode(&row, &LabelWeighting::Positional(vec![3.0, 2.0]));
        assert_eq!(encoded[mlb.position("sports").unwrap()], 3.0);
        assert_eq!(encoded[mlb.position("drama").unwrap()], 2.0);
    }

    #[test]
    fn test_unknown_labels_ignored() {
        let mlb = MultiLabelBinarizer::from_classes(labels(&["action"]));
        let encoded = mlb.encode(&labels(&["romance", "action"]), &LabelWeighting::Presence);
        assert_eq!(encoded, vec![1.0]);
    }
}
