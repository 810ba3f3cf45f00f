//! Deterministic offline backend for development and demos without API cost.
//!
//! Responses are seeded from the prompt bytes, so the same input always
//! produces the same output.

use async_trait::async_trait;
use serde_json::json;

use crate::provider::{PromptMode, ProviderError, ProviderRequest, TextBackend};

pub struct MockBackend;

impl MockBackend {
    fn seed(prompt: &str) -> u64 {
        prompt.bytes().fold(0u64, |acc, b| acc.wrapping_add(b as u64))
    }

    fn evaluation(prompt: &str) -> String {
        let seed = Self::seed(prompt);
        let score = 40 + (seed % 59); // 40..=98
        let recommendation = if score >= 85 {
            "Interview"
        } else if score >= 70 {
            "Review"
        } else {
            "Reject"
        };
        let red_flags: Vec<&str> = if score < 60 {
            vec!["Generic cover letter"]
        } else {
            vec![]
        };

        json!({
            "score": score,
            "passes_must_have": true,
            "reasoning": "[mock analysis] Deterministic evaluation generated without an AI provider. \
                Skills and cover letter were matched against the criteria heuristically.",
            "recommendation": recommendation,
            "red_flags": red_flags,
            "strengths": ["Quick learner", "Good availability"]
        })
        .to_string()
    }

    fn criteria() -> String {
        json!({
            "must_have": ["Relevant prior experience", "Available to start immediately"],
            "nice_to_have": [
                {"text": "Previous startup experience", "weight": 20},
                {"text": "Familiarity with remote work", "weight": 10}
            ],
            "red_flags": ["Poor communication", "Incomplete profile"]
        })
        .to_string()
    }

    fn parsed_applicants(prompt: &str) -> String {
        // The parse prompt embeds the raw text after this marker; fall back to
        // the whole prompt when it is absent.
        let raw = prompt
            .split("RAW TEXT TO PARSE:")
            .nth(1)
            .unwrap_or(prompt)
            .trim_matches(|c| c == '-' || c == '\n' || c == ' ');

        let applicants: Vec<serde_json::Value> = raw
            .split("---")
            .map(str::trim)
            .filter(|section| section.len() > 20)
            .enumerate()
            .map(|(i, section)| {
                let first_line = section.lines().next().unwrap_or("").trim();
                let name = if (2..=60).contains(&first_line.len()) {
                    first_line.trim_matches(|c| c == '#' || c == '*' || c == ':').trim()
                } else {
                    ""
                };
                let name = if name.is_empty() {
                    format!("Unknown Applicant #{}", i + 1)
                } else {
                    name.to_string()
                };

                json!({
                    "freelancer_id": format!("import-mock-{}", i + 1),
                    "name": name,
                    "title": "Freelancer",
                    "skills": ["Python", "JavaScript", "React"],
                    "bio": section.chars().take(200).collect::<String>(),
                    "cover_letter": if section.len() > 50 { section } else { "" },
                    "bid_amount": 500 + (Self::seed(section) % 4500),
                    "estimated_duration": "1-2 weeks",
                    "confidence": 0.6,
                    "parse_notes": ["[mock] heuristic parse, not AI-extracted"]
                })
            })
            .collect();

        json!({
            "applicants": applicants,
            "warnings": ["[mock mode] using the mock parser - data is heuristic, not AI-extracted"]
        })
        .to_string()
    }

    fn interview_questions() -> String {
        json!([
            {
                "type": "Behavioral",
                "question": "Walk me through the most challenging project in your portfolio.",
                "context": "Looking for ability to handle pressure and technical depth.",
                "expected_answer": null
            },
            {
                "type": "Technical",
                "question": "How would you handle a race condition in an async service?",
                "context": "Critical for our backend architecture.",
                "expected_answer": "Should mention locks or message-passing synchronization."
            },
            {
                "type": "Red Flag",
                "question": "I noticed a gap in your work history. Can you walk me through that period?",
                "context": "Check whether the gap hides anything relevant.",
                "expected_answer": null
            }
        ])
        .to_string()
    }

    fn chat_reply(prompt: &str) -> String {
        let lower = prompt.to_lowercase();
        if lower.contains("python") {
            return "The candidate's bio mentions extensive Python experience, \
                specifically with Django and FastAPI."
                .to_string();
        }
        if lower.contains("aws") {
            return "The profile does not explicitly mention AWS, but lists \
                'Cloud Deployment' as a skill."
                .to_string();
        }
        "Based on the stored profile, the candidate looks like a reasonable match \
            for the role. Ask about recent project history to confirm."
            .to_string()
    }
}

#[async_trait]
impl TextBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-v1"
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        Ok(match request.mode {
            PromptMode::Score => Self::evaluation(&request.prompt),
            PromptMode::ExtractCriteria => Self::criteria(),
            PromptMode::ParseApplicants => Self::parsed_applicants(&request.prompt),
            PromptMode::Interview => Self::interview_questions(),
            PromptMode::Chat => Self::chat_reply(&request.prompt),
        })
    }
}
