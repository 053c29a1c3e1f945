//! Similarity Engine
//!
//! Full pairwise cosine similarity over a feature matrix. Rows are
//! independent, so each output row is computed on its own rayon task. Cost
//! is O(N^2 * D) time and O(N^2) memory.

use crate::kernel::{cosine_with_norms, norm};
use crate::matrix::SimilarityMatrix;
use mangarec_core::{FeatureMatrix, Result};
use rayon::prelude::*;
use tracing::info;

/// Cosine similarity between every pair of rows, diagonal zeroed.
///
/// Item ids stay as the matrix keys and never enter the computation.
pub fn compute_similarity(features: &FeatureMatrix) -> Result<SimilarityMatrix> {
    let n = features.len();
    let started = std::time::Instant::now();

    let norms: Vec<f32> = (0..n).into_par_iter().map(|i| norm(features.row(i))).collect();

    let mut values = vec![0.0f32; n * n];
    if n > 0 {
        values.par_chunks_mut(n).enumerate().for_each(|(i, out)| {
            let a = features.row(i);
            for (j, slot) in out.iter_mut().enumerate() {
                *slot = if i == j {
                    0.0
                } else {
                    cosine_with_norms(a, features.row(j), norms[i], norms[j])
                };
            }
        });
    }

    info!(
        items = n,
        features = features.dim(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "computed similarity matrix"
    );

    SimilarityMatrix::new(features.ids().to_vec(), values)
}
