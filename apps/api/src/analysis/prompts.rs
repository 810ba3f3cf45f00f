// All LLM prompt constants and builders for the analysis module.

use crate::criteria::JobCriteria;
use crate::models::job::JobRow;
use crate::models::proposal::{FreelancerProfile, ProposalRow};

/// System prompt for proposal evaluation — enforces JSON-only output.
pub const EVALUATION_SYSTEM: &str =
    "You are an expert technical recruiter evaluating freelance proposals \
    against hiring criteria. Be thorough, honest, and critical; only truly \
    qualified candidates deserve high scores. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Evaluation prompt template. Placeholders are filled by
/// `build_evaluation_prompt`.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Evaluate this freelancer's proposal for the following job.

JOB DESCRIPTION:
{job_description}

HIRING CRITERIA:

Must-have requirements (the candidate FAILS if any one is not met):
{must_have}

Nice-to-have (weighted preferences, award points per weight):
{nice_to_have}

Red flags to watch for:
{red_flags}

APPLICANT PROFILE:
{profile}

COVER LETTER:
{cover_letter}

BID AMOUNT: {bid_amount}

INSTRUCTIONS:
1. Evaluate the storefront: does the bio, portfolio, and certification list
   establish the freelancer as an expert in the niche this job needs?
2. Evaluate the pitch: is the cover letter personalized and does it address
   the specific needs of the job description?
3. Alignment check: a top candidate has both a strong storefront and a
   tailored pitch.
4. Value assessment: compare the bid amount against the budget implied by the
   job description and against the freelancer's profile rate.
5. Calculate a score from 0 to 100:
   - Must-haves are pass/fail; if ANY fails, set passes_must_have to false
     and cap the score at 60.
   - Nice-to-haves add points proportional to their weights.
   - Red flags deduct points.
6. Write 2-3 sentences of reasoning, list specific strengths and red flags,
   and give a clear recommendation.

Return ONLY a JSON object with this exact structure:
{
  "score": 0-100,
  "passes_must_have": true or false,
  "reasoning": "2-3 sentence summary explaining the score",
  "recommendation": "specific action to take",
  "red_flags": ["concerning items"],
  "strengths": ["positive attributes"]
}"#;

/// System prompt for interview question generation.
pub const INTERVIEW_SYSTEM: &str =
    "You are an expert technical interviewer preparing tailored questions for \
    a specific candidate. \
    You MUST respond with a valid JSON array only. \
    Do NOT include any text outside the JSON array. \
    Do NOT use markdown code fences.";

/// Interview prompt template. Placeholders are filled by
/// `interview::build_interview_prompt`.
pub const INTERVIEW_PROMPT_TEMPLATE: &str = r#"Create tailored interview questions for this candidate.

JOB DESCRIPTION:
{job_description}

CANDIDATE: {candidate_name}
SKILLS: {skills}
BIO:
{bio}

COVER LETTER:
{cover_letter}

Generate exactly:
- {behavioral_count} Behavioral question(s)
- {technical_count} Technical question(s)
- {red_flag_count} Red Flag / gap-analysis question(s)
- {soft_skill_count} Soft Skill / cultural question(s)
{custom_focus_line}

Return a JSON ARRAY of objects with keys:
  "type": "Behavioral" | "Technical" | "Red Flag" | "Soft Skill",
  "question": the question to ask,
  "context": why to ask it / what to look for,
  "expected_answer": for Technical questions only, what a good answer covers (null otherwise)"#;

/// System prompt for the investigator chat. The candidate context is baked in
/// per request; prior turns ride along as chat history.
pub const INVESTIGATOR_SYSTEM_TEMPLATE: &str = r#"You are "The Investigator", an expert recruiting assistant. Answer questions about this candidate based STRICTLY on the profile below. If the profile does not support an answer, say so instead of guessing. Keep answers concise.

CANDIDATE: {candidate_name}
TITLE: {candidate_title}
SKILLS: {skills}
BIO:
{bio}

WORK HISTORY:
{work_history}

COVER LETTER:
{cover_letter}

JOB BEING FILLED:
{job_description}"#;

/// Fills the evaluation template from a job, its rubric, and a proposal.
pub fn build_evaluation_prompt(
    job: &JobRow,
    criteria: &JobCriteria,
    proposal: &ProposalRow,
    profile: &FreelancerProfile,
) -> String {
    let must_have = bullet_list(&criteria.must_have);
    let nice_to_have = if criteria.nice_to_have.is_empty() {
        "(none listed)".to_string()
    } else {
        criteria
            .nice_to_have
            .iter()
            .map(|item| format!("- {} (+{} points)", item.text, item.weight))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let red_flags = bullet_list(&criteria.red_flags);

    EVALUATION_PROMPT_TEMPLATE
        .replace("{job_description}", &job.description)
        .replace("{must_have}", &must_have)
        .replace("{nice_to_have}", &nice_to_have)
        .replace("{red_flags}", &red_flags)
        .replace("{profile}", &profile_block(profile))
        .replace("{cover_letter}", &proposal.cover_letter)
        .replace("{bid_amount}", &format!("${:.2}", proposal.bid_amount))
}

/// Renders the applicant profile as the labelled block the evaluation prompt
/// embeds. Missing optional fields render as N/A so the model never sees
/// empty labels.
pub fn profile_block(profile: &FreelancerProfile) -> String {
    let mut lines = vec![
        format!("Name: {}", profile.name),
        format!("Title: {}", profile.title),
        format!(
            "Hourly Rate: {}",
            profile
                .hourly_rate
                .map(|r| format!("${r:.2}"))
                .unwrap_or_else(|| "N/A".to_string())
        ),
        format!(
            "Job Success Score: {}",
            profile
                .job_success_score
                .map(|s| format!("{s}%"))
                .unwrap_or_else(|| "N/A".to_string())
        ),
        format!(
            "Total Earnings: {}",
            profile
                .total_earnings
                .map(|e| format!("${e:.0}"))
                .unwrap_or_else(|| "N/A".to_string())
        ),
        format!(
            "Top Rated Status: {}",
            profile.top_rated_status.as_deref().unwrap_or("None")
        ),
        format!(
            "Skills: {}",
            if profile.skills.is_empty() {
                "No skills listed".to_string()
            } else {
                profile.skills.join(", ")
            }
        ),
        format!("Bio: {}", profile.bio.as_deref().unwrap_or("N/A")),
    ];

    if !profile.certifications.is_empty() {
        lines.push(format!(
            "Certifications: {}",
            profile.certifications.join(", ")
        ));
    }
    if !profile.portfolio_items.is_empty() {
        let items = profile
            .portfolio_items
            .iter()
            .map(|item| format!("- {}: {}", item.title, item.desc))
            .collect::<Vec<_>>()
            .join("\n");
        lines.push(format!("Portfolio Highlights:\n{items}"));
    }
    lines.push(format!(
        "Work History: {}",
        profile.work_history_summary.as_deref().unwrap_or("N/A")
    ));

    lines.join("\n")
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        "(none listed)".to_string()
    } else {
        items
            .iter()
            .map(|item| format!("- {item}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::NiceToHave;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn sample_profile() -> FreelancerProfile {
        FreelancerProfile {
            freelancer_id: "fl-1".to_string(),
            name: "Jane Doe".to_string(),
            title: "Senior Rust Developer".to_string(),
            hourly_rate: Some(65.0),
            job_success_score: Some(97),
            total_earnings: None,
            top_rated_status: Some("Top Rated".to_string()),
            skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            bio: Some("Ten years building backend services.".to_string()),
            certifications: vec![],
            portfolio_items: vec![],
            work_history_summary: None,
            profile_url: None,
        }
    }

    fn sample_proposal(profile: &FreelancerProfile) -> ProposalRow {
        ProposalRow {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            freelancer: serde_json::to_value(profile).unwrap(),
            cover_letter: "I have shipped three similar APIs.".to_string(),
            bid_amount: 1500.0,
            estimated_duration: Some("2 weeks".to_string()),
            screening_answers: None,
            ai_score: None,
            ai_tier: None,
            ai_reasoning: None,
            ai_recommendation: None,
            ai_red_flags: None,
            ai_strengths: None,
            status: "pending".to_string(),
            chat_history: None,
            interview_questions: None,
            created_at: Utc::now(),
        }
    }

    fn sample_job() -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            title: "Rust API Developer".to_string(),
            description: "Build a proposal triage API in Rust.".to_string(),
            criteria: Some(json!({})),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_evaluation_prompt_fills_all_placeholders() {
        let profile = sample_profile();
        let proposal = sample_proposal(&profile);
        let criteria = JobCriteria {
            must_have: vec!["3+ years Rust".to_string()],
            nice_to_have: vec![NiceToHave {
                text: "axum experience".to_string(),
                weight: 20,
            }],
            red_flags: vec!["Copy-pasted cover letter".to_string()],
        };

        let prompt = build_evaluation_prompt(&sample_job(), &criteria, &proposal, &profile);

        assert!(prompt.contains("Build a proposal triage API in Rust."));
        assert!(prompt.contains("- 3+ years Rust"));
        assert!(prompt.contains("- axum experience (+20 points)"));
        assert!(prompt.contains("- Copy-pasted cover letter"));
        assert!(prompt.contains("I have shipped three similar APIs."));
        assert!(prompt.contains("$1500.00"));
        assert!(!prompt.contains("{job_description}"));
        assert!(!prompt.contains("{must_have}"));
    }

    #[test]
    fn test_empty_criteria_render_as_none_listed() {
        let profile = sample_profile();
        let proposal = sample_proposal(&profile);
        let prompt =
            build_evaluation_prompt(&sample_job(), &JobCriteria::default(), &proposal, &profile);
        assert!(prompt.contains("(none listed)"));
    }

    #[test]
    fn test_profile_block_uses_na_fallbacks() {
        let mut profile = sample_profile();
        profile.hourly_rate = None;
        profile.bio = None;
        profile.skills.clear();

        let block = profile_block(&profile);
        assert!(block.contains("Hourly Rate: N/A"));
        assert!(block.contains("Bio: N/A"));
        assert!(block.contains("No skills listed"));
        assert!(block.contains("Job Success Score: 97%"));
    }
}
