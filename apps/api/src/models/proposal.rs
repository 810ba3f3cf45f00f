use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Workflow state of a proposal. tier1/2/3 are set by automatic scoring;
/// approved/rejected are human decisions and outrank automatic transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Tier1,
    Tier2,
    Tier3,
    Approved,
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Tier1 => "tier1",
            ProposalStatus::Tier2 => "tier2",
            ProposalStatus::Tier3 => "tier3",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ProposalStatus::Pending),
            "tier1" => Some(ProposalStatus::Tier1),
            "tier2" => Some(ProposalStatus::Tier2),
            "tier3" => Some(ProposalStatus::Tier3),
            "approved" => Some(ProposalStatus::Approved),
            "rejected" => Some(ProposalStatus::Rejected),
            _ => None,
        }
    }

    /// True for statuses set by a human, which automatic scoring must not clobber.
    pub fn is_decided(&self) -> bool {
        matches!(self, ProposalStatus::Approved | ProposalStatus::Rejected)
    }

    pub fn for_tier(tier: i16) -> Self {
        match tier {
            1 => ProposalStatus::Tier1,
            2 => ProposalStatus::Tier2,
            _ => ProposalStatus::Tier3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub title: String,
    #[serde(default)]
    pub desc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreelancerProfile {
    pub freelancer_id: String,
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    /// 0-100 percentage reported by the platform.
    #[serde(default)]
    pub job_success_score: Option<i32>,
    #[serde(default)]
    pub total_earnings: Option<f64>,
    #[serde(default)]
    pub top_rated_status: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub portfolio_items: Vec<PortfolioItem>,
    #[serde(default)]
    pub work_history_summary: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProposalRow {
    pub id: Uuid,
    pub job_id: Uuid,
    /// FreelancerProfile stored as JSONB.
    pub freelancer: Value,
    pub cover_letter: String,
    pub bid_amount: f64,
    pub estimated_duration: Option<String>,
    pub screening_answers: Option<String>,
    pub ai_score: Option<i32>,
    pub ai_tier: Option<i16>,
    pub ai_reasoning: Option<String>,
    pub ai_recommendation: Option<String>,
    pub ai_red_flags: Option<Value>,
    pub ai_strengths: Option<Value>,
    pub status: String,
    pub chat_history: Option<Value>,
    pub interview_questions: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl ProposalRow {
    pub fn profile(&self) -> Result<FreelancerProfile, serde_json::Error> {
        serde_json::from_value(self.freelancer.clone())
    }

    /// Stored status string as the typed enum. Unknown strings are treated
    /// as pending rather than rejected outright.
    pub fn parsed_status(&self) -> ProposalStatus {
        ProposalStatus::parse(&self.status).unwrap_or(ProposalStatus::Pending)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProposalCreate {
    pub job_id: Uuid,
    pub freelancer: FreelancerProfile,
    pub cover_letter: String,
    pub bid_amount: f64,
    #[serde(default)]
    pub estimated_duration: Option<String>,
    #[serde(default)]
    pub screening_answers: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewQuestion {
    #[serde(rename = "type")]
    pub qtype: String,
    pub question: String,
    #[serde(default, deserialize_with = "string_or_joined_list")]
    pub context: Option<String>,
    #[serde(default, deserialize_with = "string_or_joined_list")]
    pub expected_answer: Option<String>,
}

/// Providers sometimes return a list of strings where a single string was
/// asked for; join instead of failing the whole guide.
fn string_or_joined_list<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Array(items) => {
            let joined: Vec<String> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    other => Some(other.to_string()),
                })
                .collect();
            Some(joined.join("; "))
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            ProposalStatus::Pending,
            ProposalStatus::Tier1,
            ProposalStatus::Tier2,
            ProposalStatus::Tier3,
            ProposalStatus::Approved,
            ProposalStatus::Rejected,
        ] {
            assert_eq!(ProposalStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProposalStatus::parse("archived"), None);
    }

    #[test]
    fn test_decided_statuses() {
        assert!(ProposalStatus::Approved.is_decided());
        assert!(ProposalStatus::Rejected.is_decided());
        assert!(!ProposalStatus::Tier1.is_decided());
        assert!(!ProposalStatus::Pending.is_decided());
    }

    #[test]
    fn test_profile_deserializes_with_minimal_fields() {
        let value = json!({
            "freelancer_id": "import-jane-doe-1",
            "name": "Jane Doe",
            "title": "Senior Developer"
        });
        let profile: FreelancerProfile = serde_json::from_value(value).unwrap();
        assert_eq!(profile.name, "Jane Doe");
        assert!(profile.skills.is_empty());
        assert!(profile.hourly_rate.is_none());
    }

    #[test]
    fn test_interview_question_tolerates_list_answers() {
        let value = json!({
            "type": "Technical",
            "question": "How do you handle backpressure?",
            "context": ["queue depth", "consumer lag"],
            "expected_answer": "Bounded channels"
        });
        let question: InterviewQuestion = serde_json::from_value(value).unwrap();
        assert_eq!(question.context.as_deref(), Some("queue depth; consumer lag"));
        assert_eq!(question.expected_answer.as_deref(), Some("Bounded channels"));
    }
}
