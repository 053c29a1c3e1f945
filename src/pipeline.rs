//! Batch pipeline: records in, versioned artifacts out.

use mangarec_core::{
    encode_interactions, Error, EncoderConfig, FeatureEncoder, MangaRecord, MetadataTable, Result,
    UserInteraction,
};
use mangarec_similarity::compute_similarity;
use mangarec_storage::{new_version, ArtifactStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Summary of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Stamp every artifact of the run was written under
    pub version: String,
    pub records: usize,
    pub metadata_rows: usize,
    pub encoded: usize,
    pub excluded: usize,
    pub excluded_by_reason: BTreeMap<String, usize>,
    pub feature_columns: usize,
    pub interactions: usize,
}

fn store_error(err: anyhow::Error) -> Error {
    Error::UpstreamUnavailable(format!("{:#}", err))
}

/// Encode `records`, compute their similarity and persist every artifact
/// under a fresh version stamp.
pub fn run_pipeline(
    records: &[MangaRecord],
    interactions: &[UserInteraction],
    store: &ArtifactStore,
    config: &EncoderConfig,
) -> Result<PipelineReport> {
    run_pipeline_as(&new_version(), records, interactions, store, config)
}

/// Same as [`run_pipeline`] with an explicit version stamp.
pub fn run_pipeline_as(
    version: &str,
    records: &[MangaRecord],
    interactions: &[UserInteraction],
    store: &ArtifactStore,
    config: &EncoderConfig,
) -> Result<PipelineReport> {
    let metadata = MetadataTable::from_records(records);
    let outcome = FeatureEncoder::new(config.clone())?.encode(records)?;
    let similarity = compute_similarity(outcome.matrix())?;
    let interaction_rows = encode_interactions(interactions);
    let report = outcome.report();

    // models last: a stored matrix implies its metadata is already there
    store.save_metadata(version, &metadata).map_err(store_error)?;
    store.save_features(version, &outcome.artifact).map_err(store_error)?;
    store.save_exclusions(version, &report).map_err(store_error)?;
    if !interaction_rows.is_empty() {
        store.save_interactions(version, &interaction_rows).map_err(store_error)?;
    }
    store.save_similarity(version, &similarity).map_err(store_error)?;

    info!(
        version,
        encoded = report.included,
        excluded = report.excluded,
        "pipeline run stored"
    );

    Ok(PipelineReport {
        version: version.to_string(),
        records: records.len(),
        metadata_rows: metadata.len(),
        encoded: report.included,
        excluded: report.excluded,
        excluded_by_reason: report.by_reason,
        feature_columns: outcome.schema().dim(),
        interactions: interaction_rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mangarec_core::{ListStatus, PartialDate, TitleVariants};
    use mangarec_storage::ArtifactStatus;

    fn record(id: u64, title: &str, year: Option<i32>) -> MangaRecord {
        MangaRecord {
            id: Some(id),
            title: TitleVariants::english(title),
            tags: Some(vec!["Shounen".to_string(), "Action".to_string()]),
            genres: Some(vec!["Adventure".to_string()]),
            popularity: Some(100.0 * id as f64),
            chapters: Some(20.0),
            average_score: Some(70.0),
            start_date: year.map(|y| PartialDate::new(y, 4)),
            ..Default::default()
        }
    }

    #[test]
    fn test_pipeline_writes_one_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let records = vec![record(1, "A", Some(2001)), record(2, "B", None), record(3, "C", Some(2010))];
        let interactions = vec![UserInteraction {
            user_id: 7,
            media_id: 1,
            status: Some(ListStatus::Current),
            score: Some(50.0),
            progress: Some(3),
        }];

        let report = run_pipeline_as("2024-04-01-00-00-00", &records, &interactions, &store, &EncoderConfig::default())
            .unwrap();
        assert_eq!(report.records, 3);
        assert_eq!(report.metadata_rows, 3);
        assert_eq!(report.encoded, 2);
        assert_eq!(report.excluded, 1);
        assert_eq!(report.interactions, 1);

        for status in [ArtifactStatus::Cleaned, ArtifactStatus::Features, ArtifactStatus::Models] {
            assert_eq!(store.latest_version(status).unwrap(), "2024-04-01-00-00-00");
        }
        let sim = store.load_similarity(&report.version).unwrap();
        assert_eq!(sim.ids(), &[1, 3]);
        assert_eq!(store.load_interactions(&report.version).unwrap().len(), 1);
    }
}
