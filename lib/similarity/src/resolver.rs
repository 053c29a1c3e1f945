//! Title Resolver
//!
//! Maps a free-text query to an item id. An exact case-insensitive title
//! match wins; otherwise the best fuzzy ratio is accepted when it clears
//! the configured threshold. Ties go to the earliest metadata row.

use crate::fuzzy::{normalize, ratio};
use crate::matrix::SimilarityMatrix;
use mangarec_core::{Error, ItemId, MetadataTable, NotFoundReason, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Minimum fuzzy score (0-100) a candidate needs to be accepted
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

/// A query resolved to a metadata row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleMatch {
    pub id: ItemId,
    pub title: String,
    /// 100 for exact matches
    pub score: f64,
    pub kind: MatchKind,
}

#[derive(Debug, Clone, Default)]
pub struct TitleResolver {
    config: ResolverConfig,
}

impl TitleResolver {
    pub fn new(config: ResolverConfig) -> Result<Self> {
        if !(0.0..=100.0).contains(&config.threshold) {
            return Err(Error::InvalidConfig(format!(
                "fuzzy threshold must be within 0..=100, got {}",
                config.threshold
            )));
        }
        Ok(Self { config })
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    /// Find the metadata row a query refers to.
    pub fn match_title(&self, query: &str, metadata: &MetadataTable) -> Result<TitleMatch> {
        let needle = normalize(query);

        if let Some(row) = metadata.rows().iter().find(|r| normalize(&r.title) == needle) {
            return Ok(TitleMatch {
                id: row.id,
                title: row.title.clone(),
                score: 100.0,
                kind: MatchKind::Exact,
            });
        }

        let mut best: Option<(usize, f64)> = None;
        for (i, row) in metadata.rows().iter().enumerate() {
            let score = ratio(&needle, &normalize(&row.title));
            // strict comparison keeps the first of equal scores
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }

        match best {
            Some((i, score)) if score >= self.config.threshold => {
                let row = &metadata.rows()[i];
                debug!(query, matched = %row.title, score, "fuzzy title match");
                Ok(TitleMatch {
                    id: row.id,
                    title: row.title.clone(),
                    score,
                    kind: MatchKind::Fuzzy,
                })
            }
            other => Err(Error::NotFound(NotFoundReason::NoCloseMatch {
                query: query.to_string(),
                best_score: other.map(|(_, s)| s).unwrap_or(0.0),
            })),
        }
    }

    /// Resolve a query to an id that also has similarity data.
    pub fn resolve(
        &self,
        query: &str,
        metadata: &MetadataTable,
        similarity: &SimilarityMatrix,
    ) -> Result<TitleMatch> {
        let found = self.match_title(query, metadata)?;
        if !similarity.contains(found.id) {
            return Err(Error::NotFound(NotFoundReason::MissingSimilarity {
                id: found.id,
                title: found.title,
            }));
        }
        Ok(found)
    }
}
