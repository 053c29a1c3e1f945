//! Display metadata
//!
//! One row per item with the fields shown next to a recommendation. Used
//! only after retrieval, never for ranking.

use crate::record::{ItemId, MangaRecord};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Rows in input order with an id index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<MetadataRow>", into = "Vec<MetadataRow>")]
pub struct MetadataTable {
    rows: Vec<MetadataRow>,
    index: AHashMap<ItemId, usize>,
}

impl PartialEq for MetadataTable {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
    }
}

impl From<Vec<MetadataRow>> for MetadataTable {
    fn from(rows: Vec<MetadataRow>) -> Self {
        let mut index = AHashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            index.entry(row.id).or_insert(i);
        }
        Self { rows, index }
    }
}

impl From<MetadataTable> for Vec<MetadataRow> {
    fn from(table: MetadataTable) -> Self {
        table.rows
    }
}

impl MetadataTable {
    /// Build from every record that has an id and a resolvable title.
    ///
    /// Independent of feature exclusions: an item can be displayable while
    /// having no feature vector. The first record with an id owns it, as in
    /// the encoder, even when that record has no title.
    pub fn from_records(records: &[MangaRecord]) -> Self {
        let mut seen = ahash::AHashSet::with_capacity(records.len());
        let rows = records
            .iter()
            .filter_map(|r| {
                let id = r.id?;
                if !seen.insert(id) {
                    return None;
                }
                let title = r.title.resolve()?;
                Some(MetadataRow {
                    id,
                    title: title.to_string(),
                    description: r.description.clone().unwrap_or_default(),
                    tags: r.tag_names(),
                })
            })
            .collect::<Vec<_>>();
        Self::from(rows)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn rows(&self) -> &[MetadataRow] {
        &self.rows
    }

    #[inline]
    pub fn get(&self, id: ItemId) -> Option<&MetadataRow> {
        self.index.get(&id).map(|&i| &self.rows[i])
    }

    #[inline]
    pub fn contains(&self, id: ItemId) -> bool {
        self.index.contains_key(&id)
    }
}
