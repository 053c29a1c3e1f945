//! # mangarec Core
//!
//! Core library for the mangarec recommender.
//!
//! This crate turns cleaned catalog records into the numeric artifacts the
//! similarity engine consumes:
//!
//! - [`MangaRecord`] - A cleaned catalog entry
//! - [`FeatureEncoder`] - Validates records and builds the feature matrix
//! - [`FeatureSchema`] - Ordered column list persisted with every matrix
//! - [`ScalerState`] - Fitted per-column mean/scale for the numeric columns
//! - [`MetadataTable`] - Display fields joined back after retrieval
//!
//! ## Example
//!
//! ```rust
//! use mangarec_core::{FeatureEncoder, MangaRecord, PartialDate, TitleVariants};
//!
//! let records = vec![MangaRecord {
//!     id: Some(1),
//!     title: TitleVariants::english("Major"),
//!     tags: Some(vec!["baseball".into(), "shounen".into(), "sports".into()]),
//!     genres: Some(vec!["Sports".into()]),
//!     popularity: Some(5000.0),
//!     chapters: Some(747.0),
//!     average_score: Some(78.0),
//!     start_date: Some(PartialDate::new(1994, 8)),
//!     ..Default::default()
//! }];
//!
//! let outcome = FeatureEncoder::default().encode(&records).unwrap();
//! let col = outcome.schema().column_index("tag:baseball").unwrap();
//! assert_eq!(outcome.matrix().row(0)[col], 3.0);
//! ```

pub mod error;
pub mod record;
pub mod source;
pub mod attributes;
pub mod binarizer;
pub mod scaler;
pub mod feature;
pub mod encoder;
pub mod metadata;
pub mod interaction;

pub use error::{Error, NotFoundReason, Result};
pub use record::{ItemId, MangaRecord, PartialDate, TitleVariants};
pub use source::{parse_json_records, read_json_records};
pub use attributes::{Exclusion, ExclusionReason};
pub use binarizer::{LabelWeighting, MultiLabelBinarizer};
pub use scaler::{ColumnScale, ScalerState};
pub use feature::{ColumnKind, FeatureArtifact, FeatureColumn, FeatureMatrix, FeatureSchema};
pub use encoder::{EncodeOutcome, EncoderConfig, ExclusionReport, FeatureEncoder};
pub use metadata::{MetadataRow, MetadataTable};
pub use interaction::{encode_interactions, InteractionFeatures, ListStatus, UserInteraction};
