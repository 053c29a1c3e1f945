//! Recommendation Service
//!
//! Owns the similarity matrix and metadata table for the process. Both are
//! held as one immutable [`Catalog`] snapshot; queries clone the `Arc` and
//! never take a lock for longer than that, `reload()` swaps the pointer.

use mangarec_core::{Error, ItemId, MetadataTable, NotFoundReason, Result};
use mangarec_similarity::{ResolverConfig, SimilarityMatrix, TitleMatch, TitleResolver};
use mangarec_storage::ArtifactStore;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_TOP_N: usize = 5;

/// Largest tolerated `|M[i][j] - M[j][i]|` in a loaded matrix
const SYMMETRY_TOLERANCE: f32 = 1e-5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub resolver: ResolverConfig,
    pub default_top_n: usize,
    /// Extra attempts after the first failed artifact load
    pub load_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            default_top_n: DEFAULT_TOP_N,
            load_retries: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_top_n == 0 {
            return Err(Error::InvalidConfig("default_top_n must be positive".to_string()));
        }
        Ok(())
    }
}

/// One recommended item, ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Rounded to two decimals
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub query: String,
    pub matched: TitleMatch,
    pub items: Vec<Recommendation>,
}

/// A validated similarity matrix and metadata table from one store version.
#[derive(Debug)]
pub struct Catalog {
    version: String,
    similarity: SimilarityMatrix,
    metadata: MetadataTable,
}

impl Catalog {
    /// Check the pair is consistent enough to serve.
    pub fn new(version: String, similarity: SimilarityMatrix, metadata: MetadataTable) -> Result<Self> {
        if let Some(id) = similarity.ids().iter().find(|id| !metadata.contains(**id)) {
            return Err(Error::SchemaMismatch(format!(
                "similarity matrix item {} has no metadata row",
                id
            )));
        }
        if !similarity.diagonal_is_zero() {
            return Err(Error::SchemaMismatch("similarity diagonal is not zero".to_string()));
        }
        let skew = similarity.max_asymmetry();
        if skew > SYMMETRY_TOLERANCE {
            return Err(Error::SchemaMismatch(format!(
                "similarity matrix is not symmetric (max skew {})",
                skew
            )));
        }
        Ok(Self { version, similarity, metadata })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn metadata(&self) -> &MetadataTable {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.similarity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.similarity.is_empty()
    }
}

fn upstream(context: &str, err: anyhow::Error) -> Error {
    Error::UpstreamUnavailable(format!("{}: {:#}", context, err))
}

fn fetch_catalog(store: &ArtifactStore) -> Result<Catalog> {
    let similarity = store
        .load_latest_similarity()
        .map_err(|e| upstream("loading similarity matrix", e))?;

    // Prefer the metadata written by the same pipeline run
    let metadata = match store.load_metadata(&similarity.version) {
        Ok(metadata) => metadata,
        Err(err) => {
            let latest = store
                .load_latest_metadata()
                .map_err(|e| upstream("loading metadata", e))?;
            warn!(
                similarity = %similarity.version,
                metadata = %latest.version,
                "metadata of the similarity version unreadable, using newest metadata: {:#}",
                err
            );
            latest.value
        }
    };

    Catalog::new(similarity.version, similarity.value, metadata)
}

pub struct RecommendationService {
    config: ServiceConfig,
    resolver: TitleResolver,
    store: Option<ArtifactStore>,
    catalog: RwLock<Arc<Catalog>>,
}

impl RecommendationService {
    /// Serve an in-memory pair. Such a service has nothing to reload from.
    pub fn from_parts(
        similarity: SimilarityMatrix,
        metadata: MetadataTable,
        config: ServiceConfig,
    ) -> Result<Self> {
        config.validate()?;
        let resolver = TitleResolver::new(config.resolver.clone())?;
        let catalog = Catalog::new("in-memory".to_string(), similarity, metadata)?;
        Ok(Self {
            config,
            resolver,
            store: None,
            catalog: RwLock::new(Arc::new(catalog)),
        })
    }

    /// Load the latest artifacts from `store`.
    ///
    /// An unreachable store is retried `load_retries` times; an inconsistent
    /// pair fails immediately.
    pub fn load(store: ArtifactStore, config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        let resolver = TitleResolver::new(config.resolver.clone())?;
        let catalog = Self::load_with_retries(&store, &config).map_err(|e| {
            error!("failed to load recommendation artifacts: {}", e);
            e
        })?;
        info!(
            version = catalog.version(),
            items = catalog.len(),
            "recommendation service ready"
        );
        Ok(Self {
            config,
            resolver,
            store: Some(store),
            catalog: RwLock::new(Arc::new(catalog)),
        })
    }

    fn load_with_retries(store: &ArtifactStore, config: &ServiceConfig) -> Result<Catalog> {
        let mut attempt = 0;
        loop {
            match fetch_catalog(store) {
                Err(Error::UpstreamUnavailable(msg)) if attempt < config.load_retries => {
                    attempt += 1;
                    warn!(attempt, retries = config.load_retries, "artifact store unavailable: {}", msg);
                    std::thread::sleep(config.retry_backoff);
                }
                other => return other,
            }
        }
    }

    /// Swap in the newest stored artifacts. On failure the current catalog
    /// keeps serving.
    pub fn reload(&self) -> Result<Arc<Catalog>> {
        let store = self.store.as_ref().ok_or_else(|| {
            Error::UpstreamUnavailable("service has no artifact store to reload from".to_string())
        })?;
        let fresh = Arc::new(Self::load_with_retries(store, &self.config)?);
        let previous = std::mem::replace(&mut *self.catalog.write(), fresh.clone());
        info!(from = previous.version(), to = fresh.version(), items = fresh.len(), "catalog reloaded");
        Ok(fresh)
    }

    /// Current catalog snapshot
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.read().clone()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The `top_n` items most similar to the title `query` names.
    ///
    /// `None` uses the configured default. Asking for more neighbors than
    /// exist returns all of them.
    pub fn recommend(&self, query: &str, top_n: Option<usize>) -> Result<Recommendations> {
        let top_n = top_n.unwrap_or(self.config.default_top_n);
        if top_n == 0 {
            return Err(Error::InvalidInput("top_n must be a positive integer".to_string()));
        }

        let catalog = self.catalog();
        let matched = self
            .resolver
            .resolve(query, catalog.metadata(), catalog.similarity())
            .map_err(|e| {
                debug!(query, "no recommendation: {}", e);
                e
            })?;

        let neighbors = catalog.similarity().top_n(matched.id, top_n).ok_or_else(|| {
            Error::NotFound(NotFoundReason::MissingSimilarity {
                id: matched.id,
                title: matched.title.clone(),
            })
        })?;

        let items = neighbors
            .into_iter()
            .filter_map(|(id, score)| {
                let row = catalog.metadata().get(id)?;
                Some(Recommendation {
                    id,
                    title: row.title.clone(),
                    description: row.description.clone(),
                    tags: row.tags.clone(),
                    similarity: round2(score),
                })
            })
            .collect();

        Ok(Recommendations {
            query: query.to_string(),
            matched,
            items,
        })
    }
}

#[inline]
fn round2(score: f32) -> f64 {
    (score as f64 * 100.0).round() / 100.0
}
