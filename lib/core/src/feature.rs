//! Feature matrix and feature schema
//!
//! The schema is the ordered column list a matrix was produced with. It is
//! versioned together with its matrix and scaler; a different item set
//! yields a different tag/genre universe and therefore a different schema.

use crate::binarizer::LabelWeighting;
use crate::record::ItemId;
use crate::scaler::ScalerState;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub const POPULARITY: &str = "popularity";
pub const CHAPTERS: &str = "chapters";
pub const AVERAGE_SCORE: &str = "average_score";
pub const RELEASE_YEAR: &str = "release_year";
pub const IS_ADULT: &str = "is_adult";

pub const TAG_PREFIX: &str = "tag:";
pub const GENRE_PREFIX: &str = "genre:";

/// Scaled numeric columns, in output order.
pub const NUMERIC_COLUMNS: [&str; 4] = [POPULARITY, CHAPTERS, AVERAGE_SCORE, RELEASE_YEAR];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Standardized by the scaler
    Numeric,
    /// 0/1, never scaled
    Binary,
    /// Tag indicator (possibly position-weighted)
    Tag,
    /// Genre indicator
    Genre,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered, named columns of a feature matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    #[serde(default = "default_version")]
    pub version: u32,
    pub columns: Vec<FeatureColumn>,
    #[serde(default)]
    pub tag_weighting: LabelWeighting,
}

fn default_version() -> u32 {
    1
}

impl FeatureSchema {
    /// Build the canonical layout: numeric, adult flag, tags, genres.
    pub fn new(tags: &[String], genres: &[String], tag_weighting: LabelWeighting) -> Self {
        let mut columns: Vec<FeatureColumn> = NUMERIC_COLUMNS
            .iter()
            .map(|name| FeatureColumn { name: name.to_string(), kind: ColumnKind::Numeric })
            .collect();
        columns.push(FeatureColumn { name: IS_ADULT.to_string(), kind: ColumnKind::Binary });
        columns.extend(tags.iter().map(|t| FeatureColumn {
            name: format!("{}{}", TAG_PREFIX, t),
            kind: ColumnKind::Tag,
        }));
        columns.extend(genres.iter().map(|g| FeatureColumn {
            name: format!("{}{}", GENRE_PREFIX, g),
            kind: ColumnKind::Genre,
        }));

        Self {
            version: 1,
            columns,
            tag_weighting,
        }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    fn labels_of(&self, kind: ColumnKind, prefix: &str) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.strip_prefix(prefix).unwrap_or(&c.name).to_string())
            .collect()
    }

    /// Tag universe without the column prefix, in column order.
    pub fn tag_classes(&self) -> Vec<String> {
        self.labels_of(ColumnKind::Tag, TAG_PREFIX)
    }

    pub fn genre_classes(&self) -> Vec<String> {
        self.labels_of(ColumnKind::Genre, GENRE_PREFIX)
    }

    /// Check the fixed prefix layout and that the scaler covers exactly the
    /// numeric columns.
    pub fn validate(&self, scaler: &ScalerState) -> Result<()> {
        let head: Vec<&str> = self.columns.iter().take(NUMERIC_COLUMNS.len() + 1).map(|c| c.name.as_str()).collect();
        let expected: Vec<&str> = NUMERIC_COLUMNS.iter().copied().chain(std::iter::once(IS_ADULT)).collect();
        if head != expected {
            return Err(Error::SchemaMismatch(format!(
                "feature schema starts with {:?}, expected {:?}",
                head, expected
            )));
        }

        let scaled: Vec<&str> = scaler.columns.iter().map(|c| c.name.as_str()).collect();
        if scaled != NUMERIC_COLUMNS {
            return Err(Error::SchemaMismatch(format!(
                "scaler covers {:?}, expected {:?}",
                scaled, NUMERIC_COLUMNS
            )));
        }
        Ok(())
    }
}

/// Row-major numeric matrix, one row per item id
///
/// Item identity is kept as a key alongside the rows, never as a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    ids: Vec<ItemId>,
    dim: usize,
    values: Vec<f32>,
}

impl FeatureMatrix {
    pub fn new(ids: Vec<ItemId>, dim: usize, values: Vec<f32>) -> Result<Self> {
        if ids.len() * dim != values.len() {
            return Err(Error::InvalidInput(format!(
                "feature matrix of {} rows x {} columns cannot hold {} values",
                ids.len(),
                dim,
                values.len()
            )));
        }
        Ok(Self { ids, dim, values })
    }

    pub fn empty(dim: usize) -> Self {
        Self { ids: Vec::new(), dim, values: Vec::new() }
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
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    #[inline]
    pub fn row(&self, index: usize) -> &[f32] {
        &self.values[index * self.dim..(index + 1) * self.dim]
    }

    pub fn row_by_id(&self, id: ItemId) -> Option<&[f32]> {
        self.ids.iter().position(|&i| i == id).map(|idx| self.row(idx))
    }

    pub fn rows(&self) -> impl Iterator<Item = (ItemId, &[f32])> + '_ {
        self.ids.iter().copied().zip(self.values.chunks_exact(self.dim.max(1)))
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

/// The persisted output of one encoding run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureArtifact {
    pub schema: FeatureSchema,
    pub scaler: ScalerState,
    pub matrix: FeatureMatrix,
}

impl FeatureArtifact {
    /// Reject bundles whose parts disagree with each other.
    pub fn validate(&self) -> Result<()> {
        self.schema.validate(&self.scaler)?;
        if self.schema.dim() != self.matrix.dim() {
            return Err(Error::SchemaMismatch(format!(
                "schema has {} columns but matrix rows have {}",
                self.schema.dim(),
                self.matrix.dim()
            )));
        }
        Ok(())
    }
}
