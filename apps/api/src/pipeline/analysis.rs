//! Analysis stage — raw JD text in, `JobDescriptionAnalysis` out. All or nothing.

use tracing::{error, info};

use crate::llm_client::{Prompt, StructuredClient};
use crate::models::JobDescriptionAnalysis;
use crate::pipeline::error::PipelineError;
use crate::pipeline::prompts::ANALYSIS_SYSTEM;

/// Asks the model to analyze `jd_text`. The caller guarantees the text is
/// not blank; any client failure is rewrapped as `PipelineError::Analysis`.
pub async fn analyze_jd(
    client: &StructuredClient,
    jd_text: &str,
    temperature: f32,
) -> Result<JobDescriptionAnalysis, PipelineError> {
    let prompt = Prompt {
        system: ANALYSIS_SYSTEM.to_string(),
        user: jd_text.to_string(),
    };

    match client
        .generate::<JobDescriptionAnalysis>(&prompt, temperature)
        .await
    {
        Ok(analysis) => {
            info!(
                "JD analyzed: role='{}', seniority='{}', {} skills",
                analysis.role_title,
                analysis.seniority_level,
                analysis.key_skills.len()
            );
            Ok(analysis)
        }
        Err(e) => {
            error!("Error in JD analysis stage: {e}");
            Err(PipelineError::Analysis(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::llm_client::testing::{Reply, ScriptedBackend};
    use crate::llm_client::RetryPolicy;

    fn client(backend: &Arc<ScriptedBackend>) -> StructuredClient {
        StructuredClient::new(backend.clone(), RetryPolicy::new(1, Duration::from_secs(5)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_jd_text_is_the_grounding_content() {
        let backend = ScriptedBackend::new(vec![Reply::json(json!({
            "role_title": "Site Reliability Engineer",
            "experience_range": "3-5 years",
            "role_summary": "Keeps production healthy.",
            "seniority_level": "Mid"
        }))]);
        let a = analyze_jd(&client(&backend), "We need an SRE.", 0.3)
            .await
            .unwrap();
        assert_eq!(a.role_title, "Site Reliability Engineer");

        let req = &backend.requests()[0];
        assert_eq!(req.user, "We need an SRE.");
        assert!(req.system.starts_with(ANALYSIS_SYSTEM));
        assert_eq!(req.schema, "JobDescriptionAnalysis");
        assert!((req.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_prefixed_as_analysis_error() {
        let backend = ScriptedBackend::new(vec![Reply::text("nope"), Reply::text("still nope")]);
        let err = analyze_jd(&client(&backend), "Some JD", 0.3)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Analysis(_)));
        assert!(err.to_string().starts_with("JD analysis failed:"));
        assert_eq!(backend.total_calls(), 2);
    }
}
