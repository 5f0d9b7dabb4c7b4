//! Schema coercion — the only place untyped model output becomes a typed value.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// A type the structured generation client can ask the model to produce.
///
/// `json_schema` is embedded in the system prompt; `validate` covers the
/// constraints serde cannot express (non-blank required text and the like).
pub trait StructuredOutput: DeserializeOwned + Send + 'static {
    const SCHEMA_NAME: &'static str;

    fn json_schema() -> Value;

    fn validate(&self) -> Result<(), SchemaError> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("output is not a valid {schema} JSON object: {source}")]
    Malformed {
        schema: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{schema}.{field}: {reason}")]
    Invalid {
        schema: &'static str,
        field: String,
        reason: String,
    },
}

impl SchemaError {
    pub fn invalid(schema: &'static str, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            schema,
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Parses raw model text into `T` and runs its semantic validation.
pub fn coerce<T: StructuredOutput>(raw: &str) -> Result<T, SchemaError> {
    let text = strip_json_fences(raw);
    let value: T = serde_json::from_str(text).map_err(|source| SchemaError::Malformed {
        schema: T::SCHEMA_NAME,
        source,
    })?;
    value.validate()?;
    Ok(value)
}

/// Rejects empty or whitespace-only text in a required field.
pub fn require_text(schema: &'static str, field: &str, value: &str) -> Result<(), SchemaError> {
    if value.trim().is_empty() {
        return Err(SchemaError::invalid(schema, field, "must not be blank"));
    }
    Ok(())
}

/// Treats an explicit `null` the same as a missing field.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts any JSON for the field and falls back to `T::default()` when it
/// does not fit. Used for fields that are always overwritten locally.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub(crate) fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
