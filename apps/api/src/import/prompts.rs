// LLM prompt constants for the bulk import parser.

/// System prompt for applicant parsing — enforces JSON-only output.
pub const PARSE_SYSTEM: &str =
    "You are an expert data parser for a recruitment platform. \
    You convert messy applicant text into structured profiles. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Parse prompt template. Replace `{format_hint_line}`, `{job_context}` and
/// `{raw_text}` before sending. The mock backend keys off the
/// `RAW TEXT TO PARSE:` marker, keep it intact.
pub const PARSE_PROMPT_TEMPLATE: &str = r#"Parse the following raw text into structured applicant profiles.

The text may contain data for ONE or MULTIPLE applicants, in any format:
CSV, markdown table, plain text, copy-pasted from a website, JSON, an email
thread, or completely unstructured notes.
{format_hint_line}
JOB CONTEXT (the posting these applicants responded to):
{job_context}

For EACH applicant you can identify, extract as many of these fields as possible:
- name (string, required - use "Unknown Applicant #N" if not found)
- title (string, their professional title/headline)
- hourly_rate (number, in USD)
- job_success_score (integer, 0-100 percentage)
- total_earnings (number, in USD)
- top_rated_status (string: "Top Rated Plus", "Top Rated", or null)
- skills (array of strings)
- bio (string, their profile overview/summary)
- certifications (array of strings)
- portfolio_items (array of objects with "title" and "desc" keys)
- work_history_summary (string)
- profile_url (string)
- cover_letter (string, their proposal/cover letter text)
- bid_amount (number, their proposed rate/bid for this job)
- estimated_duration (string, e.g. "2 weeks")
- screening_answers (string)

RULES:
1. If a field is not present in the text, use null (not an empty string).
2. Generate a freelancer_id for each applicant: "import-<name-slug>-<index>".
3. Parse skills from any mention of technologies, tools, or competencies.
4. Set a "confidence" score (0.0 to 1.0) per applicant based on how much
   data you could extract. Low confidence is a signal, not an error.
5. Add a "parse_notes" array with any warnings
   (e.g. "bid_amount not found, defaulting to 0").
6. If the text is clearly NOT applicant data, return an empty applicants
   array with a warning.

Return valid JSON with this exact structure:
{
    "applicants": [
        {
            "freelancer_id": "import-jane-doe-1",
            "name": "Jane Doe",
            "title": "Senior Developer",
            "hourly_rate": 50.0,
            "job_success_score": 95,
            "total_earnings": 50000.0,
            "top_rated_status": "Top Rated",
            "skills": ["Python", "JavaScript"],
            "bio": "Experienced developer...",
            "certifications": [],
            "portfolio_items": [],
            "work_history_summary": "5 years of experience...",
            "profile_url": null,
            "cover_letter": "I am excited to apply...",
            "bid_amount": 2000.0,
            "estimated_duration": "2 weeks",
            "screening_answers": null,
            "confidence": 0.85,
            "parse_notes": ["hourly_rate estimated from bid"]
        }
    ],
    "warnings": []
}

RAW TEXT TO PARSE:
---
{raw_text}
---"#;
