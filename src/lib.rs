//! # mangarec
//!
//! A content-based manga recommender.
//!
//! mangarec turns catalog records into a standardized feature matrix,
//! precomputes full pairwise cosine similarity, and serves top-N lookups
//! for a free-text title.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! mangarec build --records data/manga.jsonl --store ./artifacts
//! mangarec serve --store ./artifacts --http-port 8000
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use mangarec::prelude::*;
//!
//! let records: Vec<MangaRecord> = read_json_records("data/manga.jsonl").unwrap();
//! let store = ArtifactStore::new("./artifacts").unwrap();
//! run_pipeline(&records, &[], &store, &EncoderConfig::default()).unwrap();
//!
//! let service = RecommendationService::load(store, ServiceConfig::default()).unwrap();
//! for rec in service.recommend("Naruto", Some(5)).unwrap().items {
//!     println!("{} ({})", rec.title, rec.similarity);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `mangarec-core` - Records, attribute validation, Feature Encoder, metadata
//! - `mangarec-similarity` - Similarity Engine, similarity matrix, Title Resolver
//! - `mangarec-storage` - Versioned artifact store
//! - `mangarec-api` - Recommendation Service and REST endpoint

pub mod pipeline;

// Re-export core types
pub use mangarec_core::{
    read_json_records, EncoderConfig, Error, Exclusion, ExclusionReason, FeatureArtifact,
    FeatureEncoder, FeatureMatrix, FeatureSchema, ItemId, MangaRecord, MetadataTable,
    NotFoundReason, Result, ScalerState, UserInteraction,
};

// Re-export similarity
pub use mangarec_similarity::{compute_similarity, ResolverConfig, SimilarityMatrix, TitleResolver};

// Re-export storage
pub use mangarec_storage::{ArtifactStatus, ArtifactStore};

// Re-export API
pub use mangarec_api::{Recommendation, RecommendationService, RestApi, ServiceConfig};

pub use pipeline::{run_pipeline, run_pipeline_as, PipelineReport};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        read_json_records, compute_similarity, run_pipeline,
        EncoderConfig, FeatureEncoder, FeatureMatrix, MangaRecord, MetadataTable,
        SimilarityMatrix, TitleResolver, ResolverConfig,
        ArtifactStore, RecommendationService, ServiceConfig,
        Error, Result,
    };
}
