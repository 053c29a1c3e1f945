//! Typed access to the pipeline's artifacts

use crate::store::{ArtifactDescription, ArtifactStatus, ArtifactStore};
use anyhow::Result;
use mangarec_core::{ExclusionReport, FeatureArtifact, InteractionFeatures, MetadataTable};
use mangarec_similarity::SimilarityMatrix;

pub const METADATA_FILE: &str = "manga_metadata.json.gz";
pub const FEATURES_FILE: &str = "manga_features.json.gz";
pub const EXCLUSIONS_FILE: &str = "exclusions.json.gz";
pub const INTERACTIONS_FILE: &str = "interaction_features.json.gz";
pub const SIMILARITY_FILE: &str = "cosine_sim.bin.gz";

/// An artifact together with the version it was read from
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub version: String,
    pub value: T,
}

impl ArtifactStore {
    pub fn save_metadata(&self, version: &str, metadata: &MetadataTable) -> Result<ArtifactDescription> {
        self.put_json(ArtifactStatus::Cleaned, version, METADATA_FILE, metadata)
    }

    pub fn load_metadata(&self, version: &str) -> Result<MetadataTable> {
        self.get_json(ArtifactStatus::Cleaned, version, METADATA_FILE)
    }

    pub fn load_latest_metadata(&self) -> Result<Versioned<MetadataTable>> {
        let version = self.latest_version_with(ArtifactStatus::Cleaned, METADATA_FILE)?;
        let value = self.load_metadata(&version)?;
        Ok(Versioned { version, value })
    }

    /// Feature matrix, schema and scaler are stored as one bundle so they
    /// can never drift apart.
    pub fn save_features(&self, version: &str, features: &FeatureArtifact) -> Result<ArtifactDescription> {
        self.put_json(ArtifactStatus::Features, version, FEATURES_FILE, features)
    }

    pub fn load_features(&self, version: &str) -> Result<FeatureArtifact> {
        let artifact: FeatureArtifact = self.get_json(ArtifactStatus::Features, version, FEATURES_FILE)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn load_latest_features(&self) -> Result<Versioned<FeatureArtifact>> {
        let version = self.latest_version_with(ArtifactStatus::Features, FEATURES_FILE)?;
        let value = self.load_features(&version)?;
        Ok(Versioned { version, value })
    }

    pub fn save_exclusions(&self, version: &str, report: &ExclusionReport) -> Result<ArtifactDescription> {
        self.put_json(ArtifactStatus::Features, version, EXCLUSIONS_FILE, report)
    }

    pub fn load_exclusions(&self, version: &str) -> Result<ExclusionReport> {
        self.get_json(ArtifactStatus::Features, version, EXCLUSIONS_FILE)
    }

    pub fn save_interactions(&self, version: &str, rows: &[InteractionFeatures]) -> Result<ArtifactDescription> {
        self.put_json(ArtifactStatus::Features, version, INTERACTIONS_FILE, &rows)
    }

    pub fn load_interactions(&self, version: &str) -> Result<Vec<InteractionFeatures>> {
        self.get_json(ArtifactStatus::Features, version, INTERACTIONS_FILE)
    }

    pub fn save_similarity(&self, version: &str, matrix: &SimilarityMatrix) -> Result<ArtifactDescription> {
        self.put_bincode(ArtifactStatus::Models, version, SIMILARITY_FILE, matrix)
    }

    pub fn load_similarity(&self, version: &str) -> Result<SimilarityMatrix> {
        self.get_bincode(ArtifactStatus::Models, version, SIMILARITY_FILE)
    }

    pub fn load_latest_similarity(&self) -> Result<Versioned<SimilarityMatrix>> {
        let version = self.latest_version_with(ArtifactStatus::Models, SIMILARITY_FILE)?;
        let value = self.load_similarity(&version)?;
        Ok(Versioned { version, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mangarec_core::{EncoderConfig, FeatureEncoder, MangaRecord, PartialDate, TitleVariants};

    fn records() -> Vec<MangaRecord> {
        (1..=4)
            .map(|i| MangaRecord {
                id: Some(i),
                title: TitleVariants::english(&format!("Title {}", i)),
                tags: Some(vec![format!("tag{}", i % 2), "shared".to_string()]),
                genres: Some(vec!["Drama".to_string()]),
                popularity: Some(1000.0 * i as f64),
                chapters: Some(if i == 2 { -1.0 } else { 50.0 }),
                average_score: Some(60.0 + i as f64),
                start_date: Some(PartialDate::new(2000 + i as i32, 1)),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_persisted_schema_and_scaler_reproduce_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let records = records();
        let outcome = FeatureEncoder::new(EncoderConfig::default()).unwrap().encode(&records).unwrap();

        store.save_features("2024-03-01", &outcome.artifact).unwrap();
        let loaded = store.load_latest_features().unwrap();
        assert_eq!(loaded.version, "2024-03-01");
        assert_eq!(loaded.value, outcome.artifact);

        let (matrix, _) =
            FeatureEncoder::transform(&records, &loaded.value.schema, &loaded.value.scaler).unwrap();
        assert_eq!(matrix, outcome.artifact.matrix);
    }

    #[test]
    fn test_similarity_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let sim = SimilarityMatrix::from_rows(vec![3, 5], &[vec![0.0, 0.25], vec![0.25, 0.0]]).unwrap();
        store.save_similarity("2024-03-01-10-00-00", &sim).unwrap();
        let loaded = store.load_latest_similarity().unwrap();
        assert_eq!(loaded.value, sim);
        assert_eq!(loaded.value.get(5, 3), Some(0.25));
    }

    #[test]
    fn test_metadata_latest_picks_newest() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let old = MetadataTable::from_records(&records()[..1]);
        let new = MetadataTable::from_records(&records());
        store.save_metadata("2024-01-01", &old).unwrap();
        store.save_metadata("2024-06-01", &new).unwrap();
        let latest = store.load_latest_metadata().unwrap();
        assert_eq!(latest.version, "2024-06-01");
        assert_eq!(latest.value.len(), 4);
    }
}
