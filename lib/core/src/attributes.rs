//! Attribute schema for encoding
//!
//! Every record is checked once against an explicit list of required and
//! optional attributes before any feature is built. Records that fail are
//! excluded with a structured reason instead of being patched up.

use crate::record::{ItemId, MangaRecord, UNKNOWN_CHAPTERS};
use serde::{Deserialize, Serialize};

/// Attributes a record must carry to get a feature vector.
pub const REQUIRED_ATTRIBUTES: [&str; 6] = [
    "id",
    "title",
    "popularity",
    "chapters",
    "averageScore",
    "startDate",
];

/// Optional attributes and the default used when they are absent.
pub const OPTIONAL_ATTRIBUTES: [(&str, &str); 4] = [
    ("tags", "[]"),
    ("genres", "[]"),
    ("isAdult", "false"),
    ("description", "\"\""),
];

/// Why a record got no feature vector
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    MissingAttribute { attribute: String },
    /// Neither an english nor a native title
    MissingTitle,
    /// Start date without a year or a valid month
    UnparseableDate,
    NegativeValue { attribute: String },
    NonFinite { attribute: String },
    DuplicateId,
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::MissingAttribute { attribute } => write!(f, "missing {}", attribute),
            ExclusionReason::MissingTitle => write!(f, "missing title"),
            ExclusionReason::UnparseableDate => write!(f, "unparseable start date"),
            ExclusionReason::NegativeValue { attribute } => write!(f, "negative {}", attribute),
            ExclusionReason::NonFinite { attribute } => write!(f, "non-finite {}", attribute),
            ExclusionReason::DuplicateId => write!(f, "duplicate id"),
        }
    }
}

/// One excluded input record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    /// Position in the input sequence
    pub index: usize,
    pub id: Option<ItemId>,
    pub reason: ExclusionReason,
}

/// A record that passed validation, with pre-scaling numeric values
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    pub id: ItemId,
    pub title: String,
    pub tags: Vec<String>,
    pub genres: Vec<String>,
    /// `ln(1 + popularity)`
    pub popularity: f64,
    /// `ln(1 + chapters)`, unknown chapters count as 0
    pub chapters: f64,
    pub average_score: f64,
    pub release_year: f64,
    pub is_adult: bool,
}

impl ValidatedRecord {
    /// Numeric values in `NUMERIC_COLUMNS` order.
    pub fn numeric(&self) -> [f64; 4] {
        [self.popularity, self.chapters, self.average_score, self.release_year]
    }
}

fn missing(attribute: &str) -> ExclusionReason {
    ExclusionReason::MissingAttribute { attribute: attribute.to_string() }
}

fn finite(attribute: &str, value: Option<f64>) -> Result<f64, ExclusionReason> {
    let value = value.ok_or_else(|| missing(attribute))?;
    if !value.is_finite() {
        return Err(ExclusionReason::NonFinite { attribute: attribute.to_string() });
    }
    Ok(value)
}

/// Validate one record.
///
/// Negative popularity is invalid. Chapters accept the `-1` "unknown"
/// sentinel (mapped to 0 before the log transform); any other negative
/// count is invalid.
pub fn validate(record: &MangaRecord) -> Result<ValidatedRecord, ExclusionReason> {
    let id = record.id.ok_or_else(|| missing("id"))?;
    let title = record.title.resolve().ok_or(ExclusionReason::MissingTitle)?.to_string();

    let popularity = finite("popularity", record.popularity)?;
    if popularity < 0.0 {
        return Err(ExclusionReason::NegativeValue { attribute: "popularity".to_string() });
    }

    let mut chapters = finite("chapters", record.chapters)?;
    if chapters == UNKNOWN_CHAPTERS {
        chapters = 0.0;
    } else if chapters < 0.0 {
        return Err(ExclusionReason::NegativeValue { attribute: "chapters".to_string() });
    }

    let average_score = finite("averageScore", record.average_score)?;

    let release_year = record
        .start_date
        .ok_or_else(|| missing("startDate"))?
        .release_year()
        .ok_or(ExclusionReason::UnparseableDate)?;

    Ok(ValidatedRecord {
        id,
        title,
        tags: record.tag_names(),
        genres: record.genre_names(),
        popularity: popularity.ln_1p(),
        chapters: chapters.ln_1p(),
        average_score,
        release_year: release_year as f64,
        is_adult: record.is_adult.unwrap_or(false),
    })
}

/// Validate a batch, keeping the first record for each id.
pub fn validate_all(records: &[MangaRecord]) -> (Vec<ValidatedRecord>, Vec<Exclusion>) {
    let mut seen = ahash::AHashSet::with_capacity(records.len());
    let mut valid = Vec::with_capacity(records.len());
    let mut excluded = Vec::new();

    for (index, record) in records.iter().enumerate() {
        // the first record carrying an id owns it, valid or not
        let claimed = record.id.map_or(true, |id| seen.insert(id));
        let outcome = if claimed {
            validate(record)
        } else {
            Err(ExclusionReason::DuplicateId)
        };
        match outcome {
            Ok(v) => valid.push(v),
            Err(reason) => {
                tracing::debug!(index, id = ?record.id, %reason, "record excluded");
                excluded.push(Exclusion { index, id: record.id, reason });
            }
        }
    }

    (valid, excluded)
}
