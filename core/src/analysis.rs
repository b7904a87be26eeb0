use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// AI-derived summary over a batch of tickets. Recomputed per dashboard view,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResult {
    pub summary: String,
    pub common_issues: Vec<String>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// How urgently a ticket needs an admin reply. "unknown" is reserved for the
/// degraded path when no analysis could be produced at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    Medium,
    Low,
    Unknown,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::High => "high",
            Urgency::Medium => "medium",
            Urgency::Low => "low",
            Urgency::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AI-derived analysis of a single ticket. Recomputed per detail view,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TicketInsight {
    pub urgency: Urgency,
    pub category_suggestion: String,
    pub response_suggestion: String,
    pub related_improvements: Vec<String>,
}
