use thiserror::Error;

use crate::llm_client::LlmError;
use crate::models::ConfigError;

/// Terminal failure of one pipeline run. Each stage has its own prefix so
/// callers can tell the failure domains apart from the message alone.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Caller's fault: blank document text or bad options. No stage ran.
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("JD analysis failed: {0}")]
    Analysis(#[source] LlmError),

    #[error("Question generation failed: {0}")]
    Generation(#[source] LlmError),
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::Validation(e.to_string())
    }
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "VALIDATION_ERROR",
            PipelineError::Analysis(_) => "ANALYSIS_ERROR",
            PipelineError::Generation(_) => "GENERATION_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_prefixes_are_distinct() {
        let a = PipelineError::Analysis(LlmError::EmptyContent).to_string();
        let g = PipelineError::Generation(LlmError::EmptyContent).to_string();
        assert!(a.starts_with("JD analysis failed:"));
        assert!(g.starts_with("Question generation failed:"));
    }

    #[test]
    fn test_config_error_becomes_validation() {
        let e: PipelineError = ConfigError::NoCategories.into();
        assert_eq!(e.code(), "VALIDATION_ERROR");
        assert!(e.to_string().starts_with("Invalid input:"));
    }
}
