// LLM prompt constants for criteria extraction.
// Reuses the cross-cutting JSON-only fragment from provider::prompts.

/// System prompt for criteria extraction — enforces JSON-only output.
pub const EXTRACTION_SYSTEM: &str =
    "You are an expert technical recruiter analyzing job descriptions. \
    Extract hiring criteria as structured data. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Extraction prompt template. Replace `{job_description}` before sending.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"Analyze the following job description and extract key hiring criteria.

Return a JSON object with this EXACT structure (no extra fields):
{
  "must_have": ["list of 3-7 absolute hard requirements"],
  "nice_to_have": [
    {"text": "requirement description", "weight": 15}
  ],
  "red_flags": ["list of 3-5 warning signs or negative indicators mentioned or implied"]
}

Rules:
- must_have: requirements the posting treats as non-negotiable ("required",
  "must have", minimum years of experience).
- nice_to_have: preferences and bonuses, each with an integer weight from 5
  to 25 where 20+ means the posting emphasizes it heavily.
- red_flags: disqualifying signals a screener should watch for in proposals.

JOB DESCRIPTION:
{job_description}"#;
