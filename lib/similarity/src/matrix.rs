//! Square similarity matrix indexed by item id on both axes

use ahash::AHashMap;
use mangarec_core::{Error, ItemId, Result};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Persisted form: ids plus row-major values
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSimilarityMatrix {
    ids: Vec<ItemId>,
    values: Vec<f32>,
}

/// N x N similarity values with a zero diagonal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSimilarityMatrix", into = "RawSimilarityMatrix")]
pub struct SimilarityMatrix {
    ids: Vec<ItemId>,
    index: AHashMap<ItemId, usize>,
    values: Vec<f32>,
}

impl TryFrom<RawSimilarityMatrix> for SimilarityMatrix {
    type Error = Error;

    fn try_from(raw: RawSimilarityMatrix) -> Result<Self> {
        SimilarityMatrix::new(raw.ids, raw.values)
    }
}

impl From<SimilarityMatrix> for RawSimilarityMatrix {
    fn from(m: SimilarityMatrix) -> Self {
        RawSimilarityMatrix { ids: m.ids, values: m.values }
    }
}

impl PartialEq for SimilarityMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids && self.values == other.values
    }
}

/// Order by descending score, then ascending id.
#[inline]
fn rank_order(a: &(ItemId, f32), b: &(ItemId, f32)) -> Ordering {
    OrderedFloat(b.1)
        .cmp(&OrderedFloat(a.1))
        .then_with(|| a.0.cmp(&b.0))
}

impl SimilarityMatrix {
    /// Build from ids and row-major values; rejects non-square shapes,
    /// repeated ids and non-finite values.
    pub fn new(ids: Vec<ItemId>, values: Vec<f32>) -> Result<Self> {
        let n = ids.len();
        if n * n != values.len() {
            return Err(Error::SchemaMismatch(format!(
                "similarity matrix with {} ids needs {} values, got {}",
                n,
                n * n,
                values.len()
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::SchemaMismatch(format!(
                "similarity between items {} and {} is not finite",
                ids[pos / n],
                ids[pos % n]
            )));
        }
        let mut index = AHashMap::with_capacity(n);
        for (i, id) in ids.iter().enumerate() {
            if index.insert(*id, i).is_some() {
                return Err(Error::SchemaMismatch(format!(
                    "similarity matrix lists item {} twice",
                    id
                )));
            }
        }
        Ok(Self { ids, index, values })
    }

    /// Build from nested rows, mainly for fixtures.
    pub fn from_rows(ids: Vec<ItemId>, rows: &[Vec<f32>]) -> Result<Self> {
        let values = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::new(ids, values)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    #[inline]
    pub fn contains(&self, id: ItemId) -> bool {
        self.index.contains_key(&id)
    }

    #[inline]
    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    #[inline]
    pub fn row_at(&self, i: usize) -> &[f32] {
        let n = self.ids.len();
        &self.values[i * n..(i + 1) * n]
    }

    pub fn row(&self, id: ItemId) -> Option<&[f32]> {
        self.position(id).map(|i| self.row_at(i))
    }

    pub fn get(&self, a: ItemId, b: ItemId) -> Option<f32> {
        let (i, j) = (self.position(a)?, self.position(b)?);
        Some(self.values[i * self.ids.len() + j])
    }

    /// The `n` items most similar to `id`, best first.
    ///
    /// Ties go to the smaller id. The item itself is never returned, and
    /// asking for more than exist returns every other item. `None` when the
    /// id has no row.
    pub fn top_n(&self, id: ItemId, n: usize) -> Option<Vec<(ItemId, f32)>> {
        let row = self.row(id)?;
        let mut candidates: Vec<(ItemId, f32)> = self
            .ids
            .iter()
            .copied()
            .zip(row.iter().copied())
            .filter(|(other, _)| *other != id)
            .collect();

        let n = n.min(candidates.len());
        if n == 0 {
            return Some(Vec::new());
        }
        if n < candidates.len() {
            candidates.select_nth_unstable_by(n - 1, rank_order);
            candidates.truncate(n);
        }
        candidates.sort_by(rank_order);
        Some(candidates)
    }

    /// Largest `|M[i][j] - M[j][i]|` over all pairs.
    pub fn max_asymmetry(&self) -> f32 {
        let n = self.ids.len();
        let mut worst = 0.0f32;
        for i in 0..n {
            for j in (i + 1)..n {
                worst = worst.max((self.values[i * n + j] - self.values[j * n + i]).abs());
            }
        }
        worst
    }

    pub fn is_symmetric(&self, tolerance: f32) -> bool {
        self.max_asymmetry() <= tolerance
    }

    pub fn diagonal_is_zero(&self) -> bool {
        let n = self.ids.len();
        (0..n).all(|i| self.values[i * n + i] == 0.0)
    }
}
