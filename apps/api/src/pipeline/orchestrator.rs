//! Pipeline Orchestrator — a fixed two-step state machine.
//!
//! Start → (Analyzed | AnalysisFailed) → (Done | GenerationFailed)
//!
//! Each step consumes the current state and returns the next one. Steps that
//! do not apply to the incoming state pass it through untouched, which is how
//! a failed analysis skips generation. No retries happen here; those live in
//! the structured client.

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::LlmSettings;
use crate::llm_client::StructuredClient;
use crate::models::{
    GenerationConfig, InterviewQuestion, InterviewQuestionSet, JobDescriptionAnalysis,
};
use crate::pipeline::analysis::analyze_jd;
use crate::pipeline::error::PipelineError;
use crate::pipeline::questions::generate_questions;

/// Transient state of one run. Owned by a single request, never shared.
#[derive(Debug)]
pub enum PipelineState {
    Start {
        raw_text: String,
        config: GenerationConfig,
    },
    /// Rejected by the entry guard; no stage ran.
    Rejected { error: PipelineError },
    Analyzed {
        analysis: JobDescriptionAnalysis,
        config: GenerationConfig,
    },
    AnalysisFailed { error: PipelineError },
    Done {
        analysis: JobDescriptionAnalysis,
        questions: Vec<InterviewQuestion>,
    },
    GenerationFailed {
        analysis: JobDescriptionAnalysis,
        error: PipelineError,
    },
}

impl PipelineState {
    /// Entry guard: blank text is the caller's fault, not a model failure.
    pub fn start(raw_text: &str, config: GenerationConfig) -> Self {
        if raw_text.trim().is_empty() {
            return PipelineState::Rejected {
                error: PipelineError::Validation(
                    "the document contains no text to analyze".to_string(),
                ),
            };
        }
        PipelineState::Start {
            raw_text: raw_text.to_string(),
            config,
        }
    }

    pub fn phase(&self) -> &'static str {
        match self {
            PipelineState::Start { .. } => "start",
            PipelineState::Rejected { .. } => "rejected",
            PipelineState::Analyzed { .. } => "analyzed",
            PipelineState::AnalysisFailed { .. } => "analysis_failed",
            PipelineState::Done { .. } => "done",
            PipelineState::GenerationFailed { .. } => "generation_failed",
        }
    }

    /// Collapses the state into the caller-facing terminal record.
    pub fn into_outcome(self) -> PipelineOutcome {
        match self {
            PipelineState::Done {
                analysis,
                questions,
            } => PipelineOutcome::Completed {
                analysis,
                questions,
            },
            PipelineState::Rejected { error } | PipelineState::AnalysisFailed { error } => {
                PipelineOutcome::Failed {
                    analysis: None,
                    error,
                }
            }
            PipelineState::GenerationFailed { analysis, error } => PipelineOutcome::Failed {
                analysis: Some(analysis),
                error,
            },
            // Both steps always run, so these only appear if a caller stops early.
            PipelineState::Start { .. } => PipelineOutcome::Failed {
                analysis: None,
                error: PipelineError::Validation("pipeline was never started".to_string()),
            },
            PipelineState::Analyzed { analysis, .. } => PipelineOutcome::Failed {
                analysis: Some(analysis),
                error: PipelineError::Validation(
                    "question generation was never attempted".to_string(),
                ),
            },
        }
    }
}

/// Terminal output of a run: success with questions, or failure with an
/// error. Never both, never neither.
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed {
        analysis: JobDescriptionAnalysis,
        questions: Vec<InterviewQuestion>,
    },
    Failed {
        analysis: Option<JobDescriptionAnalysis>,
        error: PipelineError,
    },
}

impl PipelineOutcome {
    pub fn analysis(&self) -> Option<&JobDescriptionAnalysis> {
        match self {
            PipelineOutcome::Completed { analysis, .. } => Some(analysis),
            PipelineOutcome::Failed { analysis, .. } => analysis.as_ref(),
        }
    }

    pub fn questions(&self) -> Option<&[InterviewQuestion]> {
        match self {
            PipelineOutcome::Completed { questions, .. } => Some(questions),
            PipelineOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            PipelineOutcome::Completed { .. } => None,
            PipelineOutcome::Failed { error, .. } => Some(error),
        }
    }

    /// Caller-facing assembly. Failures carry no partial data.
    pub fn into_question_set(self, model: &str) -> Result<InterviewQuestionSet, PipelineError> {
        match self {
            PipelineOutcome::Completed {
                analysis,
                questions,
            } => Ok(InterviewQuestionSet::assemble(analysis, questions, model)),
            PipelineOutcome::Failed { error, .. } => Err(error),
        }
    }
}

/// Stage temperatures, taken from configuration.
#[derive(Debug, Clone, Copy)]
struct Temperatures {
    analysis: f32,
    generation: f32,
}

/// The two-stage pipeline. Cheap to clone; holds only read-only handles.
#[derive(Clone)]
pub struct Pipeline {
    client: StructuredClient,
    temperatures: Temperatures,
    model: String,
}

impl Pipeline {
    pub fn new(client: StructuredClient, settings: &LlmSettings, model: impl Into<String>) -> Self {
        Self {
            client,
            temperatures: Temperatures {
                analysis: settings.analysis_temperature,
                generation: settings.generation_temperature,
            },
            model: model.into(),
        }
    }

    /// Canonical model identifier stamped into results.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Runs analysis then generation. Always returns a terminal outcome.
    pub async fn run(&self, raw_text: &str, config: GenerationConfig) -> PipelineOutcome {
        let run_id = Uuid::new_v4();
        info!(
            "[{run_id}] pipeline started: {} chars, {} {} questions",
            raw_text.len(),
            config.num_questions(),
            config.difficulty()
        );

        let state = PipelineState::start(raw_text, config);
        let state = self.analyze_step(run_id, state).await;
        let state = self.generate_step(run_id, state).await;

        let phase = state.phase();
        let outcome = state.into_outcome();
        match (outcome.questions(), outcome.error()) {
            (Some(questions), _) => {
                info!("[{run_id}] pipeline done: {} questions", questions.len())
            }
            (None, Some(error)) => warn!(
                "[{run_id}] pipeline ended in phase '{phase}' (analysis kept: {}): {error}",
                outcome.analysis().is_some()
            ),
            (None, None) => {}
        }

        outcome
    }

    /// Runs only the analysis stage, behind the same entry guard.
    pub async fn analyze(&self, raw_text: &str) -> Result<JobDescriptionAnalysis, PipelineError> {
        if let PipelineState::Rejected { error } =
            PipelineState::start(raw_text, GenerationConfig::default())
        {
            return Err(error);
        }
        analyze_jd(&self.client, raw_text, self.temperatures.analysis).await
    }

    async fn analyze_step(&self, run_id: Uuid, state: PipelineState) -> PipelineState {
        let PipelineState::Start { raw_text, config } = state else {
            return state;
        };

        info!("[{run_id}] analyzing");
        match analyze_jd(&self.client, &raw_text, self.temperatures.analysis).await {
            Ok(analysis) => PipelineState::Analyzed { analysis, config },
            Err(error) => PipelineState::AnalysisFailed { error },
        }
    }

    async fn generate_step(&self, run_id: Uuid, state: PipelineState) -> PipelineState {
        // Anything but a successful analysis passes through untouched.
        let PipelineState::Analyzed { analysis, config } = state else {
            return state;
        };

        info!("[{run_id}] generating");
        match generate_questions(
            &self.client,
            &analysis,
            &config,
            self.temperatures.generation,
            &self.model,
        )
        .await
        {
            Ok(questions) => PipelineState::Done {
                analysis,
                questions,
            },
            Err(error) => PipelineState::GenerationFailed { analysis, error },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::{json, Value};

    use super::*;
    use crate::llm_client::testing::{Reply, ScriptedBackend};
    use crate::llm_client::RetryPolicy;
    use crate::models::config::{Difficulty, QuestionCategory};
    use crate::models::question::fixtures::question_set;

    const MODEL: &str = "llama-3.3-70b-versatile";
    const JD: &str = "Senior Backend Engineer. We are hiring a backend engineer with \
        5 years Python, AWS, and distributed systems experience.";

    fn analysis_reply() -> Value {
        json!({
            "role_title": "Senior Backend Engineer",
            "company_name": null,
            "experience_range": "5 years",
            "key_skills": [
                {"name": "Python", "proficiency": "Expert", "category": "Technical"},
                {"name": "AWS", "proficiency": "Advanced", "category": "Tool"}
            ],
            "responsibilities": ["Build distributed services"],
            "role_summary": "Designs and runs backend systems on AWS.",
            "seniority_level": "Senior"
        })
    }

    fn pipeline(backend: &Arc<ScriptedBackend>) -> Pipeline {
        let client = StructuredClient::new(
            backend.clone(),
            RetryPolicy::new(1, Duration::from_secs(30)),
        );
        Pipeline::new(client, &LlmSettings::default(), MODEL)
    }

    fn tech_behavioral(n: u32) -> GenerationConfig {
        GenerationConfig::new(
            Difficulty::Medium,
            n,
            vec![QuestionCategory::Technical, QuestionCategory::Behavioral],
        )
        .unwrap()
    }

    fn assert_exclusive(outcome: &PipelineOutcome) {
        assert!(outcome.questions().is_some() != outcome.error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_happy_path_backend_engineer() {
        let cats = [QuestionCategory::Technical, QuestionCategory::Behavioral];
        let backend = ScriptedBackend::new(vec![
            Reply::json(analysis_reply()),
            Reply::json(question_set(5, &cats)),
        ]);
        let outcome = pipeline(&backend).run(JD, tech_behavioral(5)).await;
        assert_exclusive(&outcome);

        let analysis = outcome.analysis().unwrap();
        assert!(analysis.role_title.contains("Backend Engineer"));

        let questions = outcome.questions().unwrap();
        assert_eq!(questions.len(), 5);
        assert!(questions.iter().all(|q| cats.contains(&q.category)));

        let set = outcome.into_question_set(MODEL).unwrap();
        assert_eq!(set.total_questions, set.questions.len());
        assert_eq!(set.model_used, MODEL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stage_temperatures_come_from_settings() {
        let cats = [QuestionCategory::Technical];
        let backend = ScriptedBackend::new(vec![
            Reply::json(analysis_reply()),
            Reply::json(question_set(3, &cats)),
        ]);
        let config = GenerationConfig::new(Difficulty::Easy, 3, cats.to_vec()).unwrap();
        pipeline(&backend).run(JD, config).await;

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].schema, "JobDescriptionAnalysis");
        assert_eq!(requests[1].schema, "InterviewQuestionSet");
        assert!(requests[0].temperature < requests[1].temperature);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_text_rejected_without_calling_model() {
        let backend = ScriptedBackend::new(vec![]);
        let outcome = pipeline(&backend)
            .run("  \n\t ", GenerationConfig::default())
            .await;
        assert_exclusive(&outcome);
        assert!(matches!(outcome.error(), Some(PipelineError::Validation(_))));
        assert!(outcome.analysis().is_none());
        assert_eq!(backend.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_analysis_never_invokes_generation() {
        let backend = ScriptedBackend::new(vec![
            Reply::text("I cannot help with that."),
            Reply::json(json!({"role_title": ""})),
        ]);
        let outcome = pipeline(&backend).run(JD, tech_behavioral(5)).await;
        assert_exclusive(&outcome);

        let error = outcome.error().unwrap();
        assert!(error.to_string().starts_with("JD analysis failed:"));
        assert!(outcome.analysis().is_none());
        assert_eq!(backend.calls_for("JobDescriptionAnalysis"), 2);
        assert_eq!(backend.calls_for("InterviewQuestionSet"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_timeouts_fail_the_run() {
        let backend = ScriptedBackend::new(vec![
            Reply::json(analysis_reply()),
            Reply::Hang,
            Reply::Hang,
        ]);
        let outcome = pipeline(&backend).run(JD, tech_behavioral(5)).await;
        assert_exclusive(&outcome);

        let error = outcome.error().unwrap();
        assert!(matches!(error, PipelineError::Generation(_)));
        assert!(error.to_string().starts_with("Question generation failed:"));
        assert!(error.to_string().contains("timed out"));
        assert!(outcome.questions().is_none());
        assert!(outcome.analysis().is_some());
        assert_eq!(backend.calls_for("InterviewQuestionSet"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_reflects_upstream_analysis_not_model_echo() {
        let cats = [QuestionCategory::Technical, QuestionCategory::Behavioral];
        let mut reply = question_set(5, &cats);
        reply["model_used"] = json!("gpt-something");
        reply["jd_analysis"] = json!({
            "role_title": "Stale Title",
            "experience_range": "n/a",
            "role_summary": "stale",
            "seniority_level": "Junior"
        });
        let backend = ScriptedBackend::new(vec![Reply::json(analysis_reply()), Reply::json(reply)]);

        let outcome = pipeline(&backend).run(JD, tech_behavioral(5)).await;
        let stage_one = outcome.analysis().cloned().unwrap();
        let set = outcome.into_question_set(MODEL).unwrap();

        assert_eq!(set.model_used, MODEL);
        assert_eq!(set.jd_analysis, stage_one);
        assert_eq!(set.jd_analysis.role_title, "Senior Backend Engineer");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_outcome_assembles_to_error_only() {
        let backend = ScriptedBackend::new(vec![Reply::status(401, "invalid api key")]);
        let outcome = pipeline(&backend).run(JD, tech_behavioral(5)).await;
        let err = outcome.into_question_set(MODEL).unwrap_err();
        assert!(matches!(err, PipelineError::Analysis(_)));
        assert_eq!(backend.total_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_only_shares_entry_guard() {
        let backend = ScriptedBackend::new(vec![Reply::json(analysis_reply())]);
        let p = pipeline(&backend);
        assert!(matches!(
            p.analyze("   ").await,
            Err(PipelineError::Validation(_))
        ));
        assert_eq!(backend.total_calls(), 0);

        let analysis = p.analyze(JD).await.unwrap();
        assert_eq!(analysis.seniority_level, "Senior");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_one_run_leaves_concurrent_run_intact() {
        let cats = [QuestionCategory::Technical, QuestionCategory::Behavioral];
        let hanging_backend =
            ScriptedBackend::new(vec![Reply::json(analysis_reply()), Reply::Hang, Reply::Hang]);
        let mut other_analysis = analysis_reply();
        other_analysis["role_title"] = json!("Data Platform Engineer");
        let healthy_backend = ScriptedBackend::new(vec![
            Reply::json(other_analysis),
            Reply::json(question_set(3, &cats)),
        ]);

        let hanging = pipeline(&hanging_backend);
        let healthy = pipeline(&healthy_backend);
        let aborted = tokio::spawn(async move { hanging.run(JD, tech_behavioral(5)).await });
        let survivor = tokio::spawn(async move { healthy.run(JD, tech_behavioral(3)).await });

        // Wait until the first run is stuck inside its generation call.
        while hanging_backend.calls_for("InterviewQuestionSet") == 0 {
            tokio::task::yield_now().await;
        }
        aborted.abort();
        assert!(aborted.await.unwrap_err().is_cancelled());

        let outcome = survivor.await.unwrap();
        assert_exclusive(&outcome);
        assert_eq!(
            outcome.analysis().unwrap().role_title,
            "Data Platform Engineer"
        );
        assert_eq!(outcome.questions().unwrap().len(), 3);

        // The dropped run never retries once cancelled.
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(hanging_backend.calls_for("InterviewQuestionSet"), 1);
        assert_eq!(healthy_backend.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_generation_step_is_passthrough_after_failure() {
        let state = PipelineState::AnalysisFailed {
            error: PipelineError::Analysis(crate::llm_client::LlmError::EmptyContent),
        };
        let backend = ScriptedBackend::new(vec![]);
        let state = pipeline(&backend)
            .generate_step(Uuid::new_v4(), state)
            .await;
        assert_eq!(state.phase(), "analysis_failed");
        assert_eq!(backend.total_calls(), 0);
    }
}
