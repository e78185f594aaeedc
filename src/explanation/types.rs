use crate::utils::Grade;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall verdict on one mating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    HighlyRecommended,
    Recommended,
    Acceptable,
    NotRecommended,
}

impl RecommendationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RecommendationStatus::HighlyRecommended => "Highly recommended",
            RecommendationStatus::Recommended => "Recommended",
            RecommendationStatus::Acceptable => "Acceptable",
            RecommendationStatus::NotRecommended => "Not recommended",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            RecommendationStatus::HighlyRecommended | RecommendationStatus::Recommended => "✅",
            RecommendationStatus::Acceptable => "⚠️",
            RecommendationStatus::NotRecommended => "❌",
        }
    }
}

impl fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Verdict plus talking points for one mating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub status: RecommendationStatus,
    pub message: String,
    pub positives: Vec<String>,
    pub negatives: Vec<String>,
    pub grade: Grade,
    /// Average combined reliability of the score (0-100)
    pub confidence: f64,
}
