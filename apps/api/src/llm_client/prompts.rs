// Shared prompt fragments used by every structured call.
// Stage-specific prompts live in pipeline/prompts.rs.

use serde_json::Value;

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appends the JSON-only rule and the target schema to a stage's system prompt.
pub fn with_schema(system: &str, schema_name: &str, schema: &Value) -> String {
    format!(
        "{system}\n\n{JSON_ONLY_SYSTEM}\n\n\
        The JSON object MUST conform to the `{schema_name}` JSON schema below. \
        Every required field must be present and non-empty.\n\
        {schema:#}"
    )
}
