//! # mangarec Similarity
//!
//! Item-to-item similarity for mangarec.
//!
//! ## Features
//!
//! - **Similarity Engine**: Full pairwise cosine similarity over a feature matrix, diagonal zeroed
//! - **Top-N Lookup**: Deterministic neighbor selection (score desc, id asc)
//! - **Title Resolution**: Exact case-insensitive match with a thresholded fuzzy fallback
//!
//! ## Example
//!
//! ```rust
//! use mangarec_core::FeatureMatrix;
//! use mangarec_similarity::compute_similarity;
//!
//! let features = FeatureMatrix::new(vec![1, 2, 3], 2, vec![1.0, 0.0, 0.9, 0.1, 0.0, 1.0]).unwrap();
//! let sim = compute_similarity(&features).unwrap();
//!
//! assert_eq!(sim.get(1, 1), Some(0.0));
//! assert_eq!(sim.top_n(1, 1).unwrap()[0].0, 2);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Features   │────>│   Engine    │────>│ Similarity  │
//! │ (N x D)     │     │  (cosine)   │     │   Matrix    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!       ┌─────────────┐                   ┌─────────────┐
//!       │  Resolver   │──── item id ─────>│   top_n     │
//!       │ (title→id)  │                   │             │
//!       └─────────────┘                   └─────────────┘
//! ```

pub mod kernel;
pub mod matrix;
pub mod engine;
pub mod fuzzy;
pub mod resolver;

pub use matrix::SimilarityMatrix;
pub use engine::compute_similarity;
pub use resolver::{MatchKind, ResolverConfig, TitleMatch, TitleResolver, DEFAULT_THRESHOLD};
