//! Feature Encoder
//!
//! Turns cleaned records into a numeric matrix:
//!
//! ```text
//! records ──validate──> valid rows ──fit──> (schema, scaler)
//!                           │                     │
//!                           └──────transform<─────┘──> FeatureMatrix
//! ```
//!
//! `encode` is fit followed by the same `transform` used for persisted
//! artifacts, so re-applying a stored schema and scaler to the same input
//! reproduces the matrix exactly.

use crate::attributes::{validate_all, Exclusion, ExclusionReason, ValidatedRecord};
use crate::binarizer::{LabelWeighting, MultiLabelBinarizer};
use crate::feature::{FeatureArtifact, FeatureMatrix, FeatureSchema, NUMERIC_COLUMNS};
use crate::record::MangaRecord;
use crate::scaler::ScalerState;
use crate::source::read_json_records;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Encoder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Positional tag weights; `None` encodes plain presence.
    #[serde(default)]
    pub tag_weights: Option<Vec<f32>>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            tag_weights: Some(vec![3.0, 2.0]),
        }
    }
}

impl EncoderConfig {
    pub fn unweighted() -> Self {
        Self { tag_weights: None }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(weights) = &self.tag_weights {
            if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w <= 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "tag weights must be positive, got {}",
                    w
                )));
            }
        }
        Ok(())
    }

    pub fn weighting(&self) -> LabelWeighting {
        match &self.tag_weights {
            Some(w) => LabelWeighting::Positional(w.clone()),
            None => LabelWeighting::Presence,
        }
    }
}

/// Result of one encoding pass
#[derive(Debug, Clone)]
pub struct EncodeOutcome {
    pub artifact: FeatureArtifact,
    pub exclusions: Vec<Exclusion>,
}

impl EncodeOutcome {
    pub fn matrix(&self) -> &FeatureMatrix {
        &self.artifact.matrix
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.artifact.schema
    }

    pub fn scaler(&self) -> &ScalerState {
        &self.artifact.scaler
    }

    pub fn report(&self) -> ExclusionReport {
        ExclusionReport::from_exclusions(self.artifact.matrix.len(), &self.exclusions)
    }
}

/// Counts of included and excluded records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionReport {
    pub included: usize,
    pub excluded: usize,
    /// Excluded records per reason, keyed by the reason's display text
    pub by_reason: BTreeMap<String, usize>,
    pub exclusions: Vec<Exclusion>,
}

impl ExclusionReport {
    pub fn from_exclusions(included: usize, exclusions: &[Exclusion]) -> Self {
        let mut by_reason = BTreeMap::new();
        for e in exclusions {
            *by_reason.entry(e.reason.to_string()).or_insert(0) += 1;
        }
        Self {
            included,
            excluded: exclusions.len(),
            by_reason,
            exclusions: exclusions.to_vec(),
        }
    }

    pub fn count(&self, reason: &ExclusionReason) -> usize {
        self.by_reason.get(&reason.to_string()).copied().unwrap_or(0)
    }
}

/// Builds feature matrices from cleaned records
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    config: EncoderConfig,
}

impl FeatureEncoder {
    pub fn new(config: EncoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Fit schema and scaler on an in-memory table and encode it.
    pub fn encode(&self, records: &[MangaRecord]) -> Result<EncodeOutcome> {
        let (valid, exclusions) = validate_all(records);

        let tags = MultiLabelBinarizer::fit(valid.iter().map(|r| &r.tags));
        let genres = MultiLabelBinarizer::fit(valid.iter().map(|r| &r.genres));
        let schema = FeatureSchema::new(tags.classes(), genres.classes(), self.config.weighting());

        let samples: Vec<Vec<f64>> = (0..NUMERIC_COLUMNS.len())
            .map(|c| valid.iter().map(|r| r.numeric()[c]).collect())
            .collect();
        let scaler = ScalerState::fit(&NUMERIC_COLUMNS, &samples)?;

        let matrix = transform_validated(&valid, &schema, &scaler)?;

        info!(
            included = matrix.len(),
            excluded = exclusions.len(),
            columns = schema.dim(),
            tags = tags.len(),
            genres = genres.len(),
            "encoded feature matrix"
        );
        let outcome = EncodeOutcome {
            artifact: FeatureArtifact { schema, scaler, matrix },
            exclusions,
        };
        for (reason, count) in &outcome.report().by_reason {
            info!(%reason, count, "excluded records");
        }
        Ok(outcome)
    }

    /// Fit and encode records read from a JSON or JSON-lines file.
    pub fn encode_path<P: AsRef<Path>>(&self, path: P) -> Result<EncodeOutcome> {
        let records: Vec<MangaRecord> = read_json_records(path.as_ref())?;
        debug!(path = %path.as_ref().display(), records = records.len(), "loaded records");
        self.encode(&records)
    }

    /// Apply persisted artifacts to records without refitting anything.
    ///
    /// Tags and genres outside the schema's universe are ignored.
    pub fn transform(
        records: &[MangaRecord],
        schema: &FeatureSchema,
        scaler: &ScalerState,
    ) -> Result<(FeatureMatrix, Vec<Exclusion>)> {
        schema.validate(scaler)?;
        let (valid, exclusions) = validate_all(records);
        let matrix = transform_validated(&valid, schema, scaler)?;
        Ok((matrix, exclusions))
    }
}

fn transform_validated(
    valid: &[ValidatedRecord],
    schema: &FeatureSchema,
    scaler: &ScalerState,
) -> Result<FeatureMatrix> {
    let tags = MultiLabelBinarizer::from_classes(schema.tag_classes());
    let genres = MultiLabelBinarizer::from_classes(schema.genre_classes());
    let scales: Vec<_> = NUMERIC_COLUMNS
        .iter()
        .map(|name| {
            scaler
                .column(name)
                .ok_or_else(|| Error::SchemaMismatch(format!("scaler has no column '{}'", name)))
        })
        .collect::<Result<_>>()?;

    let dim = schema.dim();
    let tag_start = NUMERIC_COLUMNS.len() + 1;
    let genre_start = tag_start + tags.len();
    debug_assert_eq!(genre_start + genres.len(), dim);

    let mut values = vec![0.0f32; valid.len() * dim];
    for (record, row) in valid.iter().zip(values.chunks_exact_mut(dim)) {
        for (c, (value, scale)) in record.numeric().iter().zip(&scales).enumerate() {
            row[c] = scale.apply(*value) as f32;
        }
        row[NUMERIC_COLUMNS.len()] = if record.is_adult { 1.0 } else { 0.0 };
        tags.encode_into(&record.tags, &schema.tag_weighting, &mut row[tag_start..genre_start]);
        genres.encode_into(&record.genres, &LabelWeighting::Presence, &mut row[genre_start..]);
    }

    FeatureMatrix::new(valid.iter().map(|r| r.id).collect(), dim, values)
}
