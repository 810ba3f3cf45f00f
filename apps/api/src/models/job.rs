use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::criteria::{CriteriaText, JobCriteria};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// JobCriteria stored as JSONB; None until criteria are defined.
    pub criteria: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl JobRow {
    pub fn parsed_criteria(&self) -> Result<Option<JobCriteria>, serde_json::Error> {
        self.criteria
            .as_ref()
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
    }
}

/// Job row joined with per-tier proposal counts for list/detail responses.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobWithCounts {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub criteria: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub proposal_count: i64,
    pub tier1_count: i64,
    pub tier2_count: i64,
    pub tier3_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobCreate {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub criteria: Option<JobCriteria>,
    /// Alternative newline-text form from the criteria wizard; ignored when
    /// structured `criteria` are present.
    #[serde(default)]
    pub criteria_text: Option<CriteriaText>,
}

impl JobCreate {
    /// Structured criteria win over the newline-text form; an all-blank text
    /// form resolves to no criteria at all.
    pub fn resolved_criteria(&self) -> Option<JobCriteria> {
        if let Some(criteria) = &self.criteria {
            return Some(criteria.clone());
        }
        self.criteria_text
            .clone()
            .map(CriteriaText::into_criteria)
            .filter(|criteria| !criteria.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateCriteriaRequest {
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parsed_criteria_roundtrip() {
        let row = JobRow {
            id: Uuid::new_v4(),
            title: "Rust backend engineer".to_string(),
            description: "Build an API".to_string(),
            criteria: Some(json!({
                "must_have": ["3+ years Rust"],
                "nice_to_have": [{"text": "axum experience", "weight": 15}],
                "red_flags": ["No backend experience"]
            })),
            created_at: Utc::now(),
        };

        let criteria = row.parsed_criteria().unwrap().unwrap();
        assert_eq!(criteria.must_have, vec!["3+ years Rust"]);
        assert_eq!(criteria.nice_to_have[0].weight, 15);
    }

    #[test]
    fn test_resolved_criteria_prefers_structured() {
        let request: JobCreate = serde_json::from_value(json!({
            "title": "t",
            "description": "a long enough description",
            "criteria": {"must_have": ["Rust"], "nice_to_have": [], "red_flags": []},
            "criteria_text": {"must_have": "Python"}
        }))
        .unwrap();
        let criteria = request.resolved_criteria().unwrap();
        assert_eq!(criteria.must_have, vec!["Rust"]);
    }

    #[test]
    fn test_resolved_criteria_from_text_form() {
        let request: JobCreate = serde_json::from_value(json!({
            "title": "t",
            "description": "a long enough description",
            "criteria_text": {"nice_to_have": "API experience | 20"}
        }))
        .unwrap();
        let criteria = request.resolved_criteria().unwrap();
        assert_eq!(criteria.nice_to_have[0].text, "API experience");
        assert_eq!(criteria.nice_to_have[0].weight, 20);
    }

    #[test]
    fn test_resolved_criteria_blank_text_is_none() {
        let request: JobCreate = serde_json::from_value(json!({
            "title": "t",
            "description": "a long enough description",
            "criteria_text": {"must_have": "\n  \n"}
        }))
        .unwrap();
        assert!(request.resolved_criteria().is_none());
    }

    #[test]
    fn test_parsed_criteria_none_when_unset() {
        let row = JobRow {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: "d".to_string(),
            criteria: None,
            created_at: Utc::now(),
        };
        assert!(row.parsed_criteria().unwrap().is_none());
    }
}
