//! Cleaned catalog records
//!
//! These mirror the shape of the cleaned-records source. Every attribute is
//! optional at the type level; the encoder's attribute schema decides which
//! ones are required.

use serde::{Deserialize, Serialize};

/// Stable item identity shared by every pipeline stage.
pub type ItemId = u64;

/// Chapter count meaning "unknown" in the source data.
pub const UNKNOWN_CHAPTERS: f64 = -1.0;

/// Language variants of an item's title
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TitleVariants {
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub romaji: Option<String>,
    #[serde(default)]
    pub native: Option<String>,
}

impl TitleVariants {
    pub fn english(title: &str) -> Self {
        Self {
            english: Some(title.to_string()),
            ..Default::default()
        }
    }

    /// Pick the display title: english, else native.
    ///
    /// Blank variants count as missing so an item never ends up with an
    /// empty title.
    pub fn resolve(&self) -> Option<&str> {
        non_blank(self.english.as_deref()).or_else(|| non_blank(self.native.as_deref()))
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// A date with month granularity
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartialDate {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
}

impl PartialDate {
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            day: None,
        }
    }

    /// Release year, only when both year and a valid month are present.
    pub fn release_year(&self) -> Option<i32> {
        match (self.year, self.month) {
            (Some(year), Some(month)) if (1..=12).contains(&month) => Some(year),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.year.is_some() && self.month.is_some() && self.day.is_some()
    }
}

/// One cleaned catalog entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MangaRecord {
    pub id: Option<ItemId>,
    #[serde(default)]
    pub title: TitleVariants,
    /// Ordered; position drives tag weighting.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub chapters: Option<f64>,
    #[serde(default)]
    pub average_score: Option<f64>,
    #[serde(default)]
    pub start_date: Option<PartialDate>,
    #[serde(default)]
    pub end_date: Option<PartialDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_adult: Option<bool>,
}

impl MangaRecord {
    /// Tags with blanks dropped, order and duplicates kept.
    pub fn tag_names(&self) -> Vec<String> {
        clean_labels(self.tags.as_deref())
    }

    pub fn genre_names(&self) -> Vec<String> {
        clean_labels(self.genres.as_deref())
    }

    /// Whether the series has a complete end date.
    pub fn is_finished(&self) -> bool {
        self.end_date.map(|d| d.is_complete()).unwrap_or(false)
    }
}

fn clean_labels(labels: Option<&[String]>) -> Vec<String> {
    labels
        .unwrap_or_default()
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_prefers_english() {
        let title = TitleVariants {
            english: Some("Monster".to_string()),
            romaji: Some("Monster".to_string()),
            native: Some("モンスター".to_string()),
        };
        assert_eq!(title.resolve(), Some("Monster"));
    }

    #[test]
    fn test_title_falls_back_to_native_not_romaji() {
        let title = TitleVariants {
            english: Some("  ".to_string()),
            romaji: Some("Shingeki no Kyojin".to_string()),
            native: Some("進撃の巨人".to_string()),
        };
        assert_eq!(title.resolve(), Some("進撃の巨人"));

        let romaji_only = TitleVariants {
            romaji: Some("Shingeki no Kyojin".to_string()),
            ..Default::default()
        };
        assert_eq!(romaji_only.resolve(), None);
    }

    #[test]
    fn test_release_year_requires_month() {
        assert_eq!(PartialDate::new(1999, 7).release_year(), Some(1999));
        let year_only = PartialDate { year: Some(1999), month: None, day: None };
        assert_eq!(year_only.release_year(), None);
        assert_eq!(PartialDate::new(1999, 13).release_year(), None);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "id": 30002,
            "title": {"english": "Berserk", "native": "ベルセルク"},
            "tags": ["Dark Fantasy", " ", "Gore"],
            "genres": ["Action"],
            "popularity": 250000,
            "chapters": -1,
            "averageScore": 93,
            "startDate": {"year": 1989, "month": 8, "day": 25},
            "isAdult": false
        }"#;
        let record: MangaRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, Some(30002));
        assert_eq!(record.average_score, Some(93.0));
        assert_eq!(record.tag_names(), vec!["Dark Fantasy", "Gore"]);
        assert_eq!(record.start_date.and_then(|d| d.release_year()), Some(1989));
        assert!(!record.is_finished());
    }
}
