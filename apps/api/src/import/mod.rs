//! Bulk Import Parser — turns unstructured pasted text or uploaded files
//! into reviewable applicant candidates.
//!
//! Parsing never persists anything; a human reviews the candidates and
//! confirms in a separate, explicit step. Confidence is a provider-reported
//! signal, not a correctness guarantee.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::{Event, EventSink};
use crate::import::prompts::{PARSE_PROMPT_TEMPLATE, PARSE_SYSTEM};
use crate::models::proposal::{FreelancerProfile, PortfolioItem, ProposalCreate};
use crate::provider::{PromptMode, ProviderAdapter, ProviderRequest};
use crate::store;

pub mod handlers;
pub mod prompts;

/// Fallbacks applied when confirming applicants whose parse missed fields.
const FALLBACK_COVER_LETTER: &str = "No cover letter provided (imported via bulk import)";
const MIN_COVER_LETTER_LEN: usize = 10;

#[derive(Debug, Deserialize)]
pub struct BulkImportRequest {
    pub job_id: Uuid,
    pub raw_text: String,
    #[serde(default)]
    pub input_format_hint: Option<String>,
}

/// An unconfirmed, AI-extracted candidate awaiting human review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedApplicant {
    pub freelancer: FreelancerProfile,
    #[serde(default)]
    pub cover_letter: String,
    #[serde(default)]
    pub bid_amount: f64,
    #[serde(default)]
    pub estimated_duration: Option<String>,
    #[serde(default)]
    pub screening_answers: Option<String>,
    /// Provider-reported parse confidence in [0,1].
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub parse_notes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkImportParseResponse {
    pub applicants: Vec<ParsedApplicant>,
    pub total_found: usize,
    pub parse_warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkImportConfirmRequest {
    pub job_id: Uuid,
    pub applicants: Vec<ParsedApplicant>,
    #[serde(default)]
    pub auto_analyze: bool,
}

#[derive(Debug, Serialize)]
pub struct ImportFailure {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BulkImportConfirmResponse {
    pub imported_count: usize,
    pub proposal_ids: Vec<Uuid>,
    pub failed: Vec<ImportFailure>,
}

/// Raw provider payload: flat applicant objects plus batch-level warnings.
#[derive(Debug, Deserialize)]
struct RawParsedBatch {
    #[serde(default)]
    applicants: Vec<Value>,
    #[serde(default)]
    warnings: Vec<String>,
}

/// Parses raw text into applicant candidates via the provider. Nothing is
/// written to the store.
pub async fn parse_raw_applicants(
    provider: &ProviderAdapter,
    raw_text: &str,
    job_description: &str,
    format_hint: Option<&str>,
) -> Result<BulkImportParseResponse, AppError> {
    let format_hint_line = format_hint
        .map(|hint| format!("\nFORMAT HINT: the input appears to be in {hint} format.\n"))
        .unwrap_or_default();
    let job_context: String = job_description.chars().take(500).collect();

    let prompt = PARSE_PROMPT_TEMPLATE
        .replace("{format_hint_line}", &format_hint_line)
        .replace("{job_context}", &job_context)
        .replace("{raw_text}", raw_text);

    let request = ProviderRequest::new(PromptMode::ParseApplicants, PARSE_SYSTEM, prompt);
    let batch: RawParsedBatch = provider.generate_structured(&request).await?;

    let applicants: Vec<ParsedApplicant> = batch
        .applicants
        .iter()
        .enumerate()
        .map(|(i, raw)| applicant_from_raw(raw, i))
        .collect();

    info!("Parsed {} applicants from raw text", applicants.len());

    Ok(BulkImportParseResponse {
        total_found: applicants.len(),
        applicants,
        parse_warnings: batch.warnings,
    })
}

/// Maps one flat provider object into a typed candidate, with the defensive
/// fallbacks the provider contract allows for (explicit nulls, missing
/// fields, out-of-range confidence).
fn applicant_from_raw(raw: &Value, index: usize) -> ParsedApplicant {
    let fallback_name = format!("Unknown Applicant #{}", index + 1);
    let name = non_empty_str(raw, "name").unwrap_or(fallback_name);

    let freelancer = FreelancerProfile {
        freelancer_id: non_empty_str(raw, "freelancer_id")
            .unwrap_or_else(|| format!("import-{}", index + 1)),
        name,
        title: non_empty_str(raw, "title").unwrap_or_else(|| "Freelancer".to_string()),
        hourly_rate: raw.get("hourly_rate").and_then(Value::as_f64),
        job_success_score: raw
            .get("job_success_score")
            .and_then(Value::as_i64)
            .map(|s| s.clamp(0, 100) as i32),
        total_earnings: raw.get("total_earnings").and_then(Value::as_f64),
        top_rated_status: non_empty_str(raw, "top_rated_status"),
        skills: string_list(raw, "skills"),
        bio: non_empty_str(raw, "bio"),
        certifications: string_list(raw, "certifications"),
        portfolio_items: raw
            .get("portfolio_items")
            .and_then(|v| serde_json::from_value::<Vec<PortfolioItem>>(v.clone()).ok())
            .unwrap_or_default(),
        work_history_summary: non_empty_str(raw, "work_history_summary"),
        profile_url: non_empty_str(raw, "profile_url"),
    };

    ParsedApplicant {
        freelancer,
        cover_letter: non_empty_str(raw, "cover_letter").unwrap_or_default(),
        bid_amount: raw.get("bid_amount").and_then(Value::as_f64).unwrap_or(0.0),
        estimated_duration: non_empty_str(raw, "estimated_duration"),
        screening_answers: non_empty_str(raw, "screening_answers"),
        confidence: raw
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.5)
            .clamp(0.0, 1.0),
        parse_notes: string_list(raw, "parse_notes"),
    }
}

fn non_empty_str(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn string_list(raw: &Value, key: &str) -> Vec<String> {
    raw.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Persists reviewed applicants as proposals. Individual failures are
/// collected, never abort the rest of the batch.
pub async fn confirm_import(
    pool: &PgPool,
    events: &dyn EventSink,
    request: &BulkImportConfirmRequest,
) -> Result<BulkImportConfirmResponse, AppError> {
    if store::jobs::get(pool, request.job_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Job {} not found",
            request.job_id
        )));
    }

    let mut proposal_ids = Vec::new();
    let mut failed = Vec::new();

    for applicant in &request.applicants {
        let create = proposal_from_applicant(request.job_id, applicant);
        match store::proposals::insert(pool, &create).await {
            Ok(proposal) => {
                proposal_ids.push(proposal.id);
                events.publish(Event::activity(
                    "proposal_imported",
                    format!("Imported {} via bulk import", applicant.freelancer.name),
                    json!({ "proposal_id": proposal.id, "job_id": request.job_id }),
                ));
            }
            Err(e) => {
                warn!("Failed to import {}: {e}", applicant.freelancer.name);
                failed.push(ImportFailure {
                    name: applicant.freelancer.name.clone(),
                    error: e.public().1,
                });
            }
        }
    }

    events.publish(Event::activity(
        "bulk_import_complete",
        format!(
            "Bulk import complete: {} imported, {} failed",
            proposal_ids.len(),
            failed.len()
        ),
        json!({ "job_id": request.job_id, "count": proposal_ids.len() }),
    ));

    Ok(BulkImportConfirmResponse {
        imported_count: proposal_ids.len(),
        proposal_ids,
        failed,
    })
}

/// Applies confirm-time fallbacks so imports with gaps still satisfy the
/// proposal invariants (non-trivial cover letter, positive bid).
fn proposal_from_applicant(job_id: Uuid, applicant: &ParsedApplicant) -> ProposalCreate {
    ProposalCreate {
        job_id,
        freelancer: applicant.freelancer.clone(),
        cover_letter: if applicant.cover_letter.len() >= MIN_COVER_LETTER_LEN {
            applicant.cover_letter.clone()
        } else {
            FALLBACK_COVER_LETTER.to_string()
        },
        bid_amount: if applicant.bid_amount > 0.0 {
            applicant.bid_amount
        } else {
            0.01
        },
        estimated_duration: applicant.estimated_duration.clone(),
        screening_answers: applicant.screening_answers.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applicant_from_full_raw_object() {
        let raw = json!({
            "freelancer_id": "import-jane-doe-1",
            "name": "Jane Doe",
            "title": "Senior Developer",
            "hourly_rate": 50.0,
            "job_success_score": 95,
            "skills": ["Python", "Rust"],
            "bio": "Experienced developer",
            "cover_letter": "I am excited to apply for this position.",
            "bid_amount": 2000.0,
            "confidence": 0.85,
            "parse_notes": ["hourly_rate estimated from bid"]
        });

        let applicant = applicant_from_raw(&raw, 0);
        assert_eq!(applicant.freelancer.name, "Jane Doe");
        assert_eq!(applicant.freelancer.skills, vec!["Python", "Rust"]);
        assert_eq!(applicant.bid_amount, 2000.0);
        assert_eq!(applicant.confidence, 0.85);
        assert_eq!(applicant.parse_notes.len(), 1);
    }

    #[test]
    fn test_applicant_fallbacks_for_nulls() {
        // Explicit nulls, not just missing keys; the provider does both.
        let raw = json!({
            "name": null,
            "title": null,
            "cover_letter": null,
            "bid_amount": null,
            "confidence": null
        });

        let applicant = applicant_from_raw(&raw, 2);
        assert_eq!(applicant.freelancer.name, "Unknown Applicant #3");
        assert_eq!(applicant.freelancer.title, "Freelancer");
        assert_eq!(applicant.freelancer.freelancer_id, "import-3");
        assert_eq!(applicant.cover_letter, "");
        assert_eq!(applicant.bid_amount, 0.0);
        assert_eq!(applicant.confidence, 0.5);
    }

    #[test]
    fn test_confidence_clamped_into_unit_interval() {
        let high = applicant_from_raw(&json!({"name": "A", "confidence": 1.7}), 0);
        assert_eq!(high.confidence, 1.0);
        let low = applicant_from_raw(&json!({"name": "A", "confidence": -0.2}), 0);
        assert_eq!(low.confidence, 0.0);
    }

    #[test]
    fn test_confirm_fallbacks() {
        let applicant = ParsedApplicant {
            freelancer: FreelancerProfile {
                freelancer_id: "import-1".to_string(),
                name: "A".to_string(),
                title: "Freelancer".to_string(),
                hourly_rate: None,
                job_success_score: None,
                total_earnings: None,
                top_rated_status: None,
                skills: vec![],
                bio: None,
                certifications: vec![],
                portfolio_items: vec![],
                work_history_summary: None,
                profile_url: None,
            },
            cover_letter: "hi".to_string(), // below the minimum
            bid_amount: 0.0,
            estimated_duration: None,
            screening_answers: None,
            confidence: 0.4,
            parse_notes: vec![],
        };

        let create = proposal_from_applicant(Uuid::new_v4(), &applicant);
        assert_eq!(create.cover_letter, FALLBACK_COVER_LETTER);
        assert!(create.bid_amount > 0.0);
    }
}
