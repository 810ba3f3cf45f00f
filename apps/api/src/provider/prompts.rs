// Cross-cutting prompt fragments. Each module that builds provider prompts
// defines its own prompts.rs alongside it; only the retry reminder is shared.

/// Appended to the prompt on the single schema-validation retry after a
/// provider response failed to parse.
pub const STRICT_JSON_RETRY: &str = "REMINDER: Your previous reply could not be parsed. \
    Respond with ONLY the JSON structure described above. \
    No prose, no markdown fences, no commentary of any kind.";
