//! User-interaction features
//!
//! Status one-hot columns plus an interaction strength per (user, item).
//! These are persisted alongside the item features for a future
//! personalization path; the retrieval path does not read them.

use crate::record::ItemId;
use serde::{Deserialize, Serialize};

/// Reading-list status of a user for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListStatus {
    Current,
    Planning,
    Completed,
    Dropped,
    Paused,
    Repeating,
}

impl ListStatus {
    pub const ALL: [ListStatus; 6] = [
        ListStatus::Current,
        ListStatus::Planning,
        ListStatus::Completed,
        ListStatus::Dropped,
        ListStatus::Paused,
        ListStatus::Repeating,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListStatus::Current => "CURRENT",
            ListStatus::Planning => "PLANNING",
            ListStatus::Completed => "COMPLETED",
            ListStatus::Dropped => "DROPPED",
            ListStatus::Paused => "PAUSED",
            ListStatus::Repeating => "REPEATING",
        }
    }

    /// Engagement implied by the status, in [0, 1].
    pub fn weight(&self) -> f32 {
        match self {
            ListStatus::Completed | ListStatus::Repeating => 1.0,
            ListStatus::Current => 0.8,
            ListStatus::Paused => 0.5,
            ListStatus::Planning => 0.3,
            ListStatus::Dropped => 0.1,
        }
    }
}

/// One cleaned user list entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInteraction {
    pub user_id: u64,
    pub media_id: ItemId,
    pub status: Option<ListStatus>,
    /// 0–100, 0 meaning unscored
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub progress: Option<u32>,
}

/// Encoded interaction row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionFeatures {
    pub user_id: u64,
    pub media_id: ItemId,
    /// One-hot over `ListStatus::ALL`
    pub status: [f32; 6],
    /// `status weight x score / 100`
    pub strength: f32,
    pub progress: u32,
}

/// Encode interactions; entries without a status are skipped.
pub fn encode_interactions(interactions: &[UserInteraction]) -> Vec<InteractionFeatures> {
    interactions
        .iter()
        .filter_map(|i| {
            let status = i.status?;
            let mut one_hot = [0.0f32; 6];
            if let Some(pos) = ListStatus::ALL.iter().position(|s| *s == status) {
                one_hot[pos] = 1.0;
            }
            let score = i.score.filter(|s| s.is_finite()).unwrap_or(0.0).clamp(0.0, 100.0);
            Some(InteractionFeatures {
                user_id: i.user_id,
                media_id: i.media_id,
                status: one_hot,
                strength: status.weight() * score / 100.0,
                progress: i.progress.unwrap_or(0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_is_status_times_score() {
        let rows = encode_interactions(&[
            UserInteraction { user_id: 1, media_id: 10, status: Some(ListStatus::Completed), score: Some(90.0), progress: Some(120) },
            UserInteraction { user_id: 1, media_id: 11, status: Some(ListStatus::Dropped), score: Some(40.0), progress: None },
            UserInteraction { user_id: 2, media_id: 10, status: None, score: Some(70.0), progress: None },
        ]);
        assert_eq!(rows.len(), 2);
        assert!((rows[0].strength - 0.9).abs() < 1e-6);
        assert_eq!(rows[0].status, [0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        assert!((rows[1].strength - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_status_wire_format() {
        let i: UserInteraction =
            serde_json::from_str(r#"{"userId": 3, "mediaId": 30, "status": "REPEATING", "score": 85}"#).unwrap();
        assert_eq!(i.status, Some(ListStatus::Repeating));
        assert_eq!(i.status.unwrap().as_str(), "REPEATING");
    }
}
