//! Question generation stage — (analysis, config) in, validated questions out.
//!
//! Post-processing is always local: ids are renumbered, and the timestamp,
//! model identifier and `jd_analysis` are overwritten whatever the model sent.

use tracing::{error, info};

use crate::llm_client::{Prompt, SchemaError, StructuredClient, StructuredOutput};
use crate::models::question::now_iso8601;
use crate::models::{
    GenerationConfig, InterviewQuestion, InterviewQuestionSet, JobDescriptionAnalysis,
};
use crate::pipeline::error::PipelineError;
use crate::pipeline::prompts::{GENERATION_SYSTEM_TEMPLATE, GENERATION_USER_TEMPLATE};

/// Generates `config.num_questions()` questions grounded in `analysis`.
/// Any client failure is rewrapped as `PipelineError::Generation`.
pub async fn generate_questions(
    client: &StructuredClient,
    analysis: &JobDescriptionAnalysis,
    config: &GenerationConfig,
    temperature: f32,
    model: &str,
) -> Result<Vec<InterviewQuestion>, PipelineError> {
    let prompt = build_generation_prompt(analysis, config);

    let result = client
        .generate_checked(&prompt, temperature, |set: &InterviewQuestionSet| {
            check_question_set(set, config)
        })
        .await;

    match result {
        Ok(set) => {
            let set = finalize_question_set(set, analysis, model);
            info!(
                "Generated {} questions for '{}'",
                set.total_questions, set.jd_analysis.role_title
            );
            Ok(set.questions)
        }
        Err(e) => {
            error!("Error in question generation stage: {e}");
            Err(PipelineError::Generation(e))
        }
    }
}

/// Rejects a set that does not match the requested count or categories, so
/// the client retries instead of returning a truncated or off-topic set.
pub fn check_question_set(
    set: &InterviewQuestionSet,
    config: &GenerationConfig,
) -> Result<(), SchemaError> {
    const S: &str = InterviewQuestionSet::SCHEMA_NAME;
    let expected = config.num_questions() as usize;

    if set.questions.len() != expected {
        return Err(SchemaError::invalid(
            S,
            "questions",
            format!(
                "expected exactly {expected} questions, got {}",
                set.questions.len()
            ),
        ));
    }

    for (i, q) in set.questions.iter().enumerate() {
        if !config.categories().contains(&q.category) {
            return Err(SchemaError::invalid(
                S,
                format!("questions[{i}].category"),
                format!("'{}' is not one of the requested categories", q.category),
            ));
        }
    }

    Ok(())
}

/// Overwrites every locally-owned field of a model-produced set.
pub fn finalize_question_set(
    mut set: InterviewQuestionSet,
    analysis: &JobDescriptionAnalysis,
    model: &str,
) -> InterviewQuestionSet {
    for (i, q) in set.questions.iter_mut().enumerate() {
        q.id = i as u32 + 1;
    }
    set.total_questions = set.questions.len();
    set.generation_timestamp = now_iso8601();
    set.model_used = model.to_string();
    set.jd_analysis = analysis.clone();
    set
}

fn build_generation_prompt(analysis: &JobDescriptionAnalysis, config: &GenerationConfig) -> Prompt {
    let categories = config
        .categories()
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ");

    let skills = analysis.skill_names();
    let skills = if skills.is_empty() {
        "(none listed)".to_string()
    } else {
        skills
    };

    let system = GENERATION_SYSTEM_TEMPLATE
        .replace("{num_questions}", &config.num_questions().to_string())
        .replace("{difficulty}", config.difficulty().label())
        .replace("{categories}", &categories)
        .replace("{skills}", &skills);

    let user = GENERATION_USER_TEMPLATE
        .replace("{role}", &analysis.role_title)
        .replace("{seniority}", &analysis.seniority_level)
        .replace("{experience}", &analysis.experience_range)
        .replace("{summary}", &analysis.role_summary)
        .replace("{responsibilities}", &bullet_list(&analysis.responsibilities))
        .replace(
            "{skills_detail}",
            &bullet_list(
                &analysis
                    .key_skills
                    .iter()
                    .map(|s| format!("{} ({}, {})", s.name, s.proficiency, s.category))
                    .collect::<Vec<_>>(),
            ),
        );

    Prompt { system, user }
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "- (none listed)".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::llm_client::schema::coerce;
    use crate::llm_client::testing::{Reply, ScriptedBackend};
    use crate::llm_client::RetryPolicy;
    use crate::models::question::fixtures::question_set;
    use crate::models::analysis::SkillRequirement;
    use crate::models::config::{Difficulty, QuestionCategory};

    fn analysis() -> JobDescriptionAnalysis {
        JobDescriptionAnalysis {
            role_title: "Senior Backend Engineer".to_string(),
            experience_range: "5+ years".to_string(),
            key_skills: vec![SkillRequirement {
                name: "Python".to_string(),
                proficiency: "Expert".to_string(),
                category: "Technical".to_string(),
            }],
            responsibilities: vec!["Design APIs".to_string()],
            role_summary: "Builds backend services on AWS.".to_string(),
            seniority_level: "Senior".to_string(),
            ..Default::default()
        }
    }

    fn config(n: u32) -> GenerationConfig {
        GenerationConfig::new(
            Difficulty::Hard,
            n,
            vec![QuestionCategory::Technical, QuestionCategory::Behavioral],
        )
        .unwrap()
    }

    fn client(backend: &Arc<ScriptedBackend>) -> StructuredClient {
        StructuredClient::new(backend.clone(), RetryPolicy::new(1, Duration::from_secs(5)))
    }

    #[test]
    fn test_prompt_embeds_config_and_analysis() {
        let prompt = build_generation_prompt(&analysis(), &config(7));
        assert!(prompt.system.contains("exactly 7 interview questions"));
        assert!(prompt.system.contains("Difficulty: Hard"));
        assert!(prompt.system.contains("Categories: Technical, Behavioral"));
        assert!(prompt.system.contains("Target Skills: Python"));
        assert!(prompt.user.contains("Role: Senior Backend Engineer"));
        assert!(prompt.user.contains("- Design APIs"));
        assert!(prompt.user.contains("- Python (Expert, Technical)"));
        assert!(!prompt.system.contains('{'));
        assert!(!prompt.user.contains('{'));
    }

    #[test]
    fn test_prompt_handles_empty_lists() {
        let a = JobDescriptionAnalysis {
            key_skills: vec![],
            responsibilities: vec![],
            ..analysis()
        };
        let prompt = build_generation_prompt(&a, &config(3));
        assert!(prompt.system.contains("Target Skills: (none listed)"));
        assert!(prompt.user.contains("- (none listed)"));
    }

    #[test]
    fn test_check_rejects_wrong_count() {
        let set: InterviewQuestionSet =
            coerce(&question_set(4, &[QuestionCategory::Technical]).to_string()).unwrap();
        let err = check_question_set(&set, &config(5)).unwrap_err();
        assert!(err.to_string().contains("expected exactly 5 questions, got 4"));
    }

    #[test]
    fn test_check_rejects_unrequested_category() {
        let set: InterviewQuestionSet = coerce(
            &question_set(3, &[QuestionCategory::Technical, QuestionCategory::CultureFit])
                .to_string(),
        )
        .unwrap();
        let err = check_question_set(&set, &config(3)).unwrap_err();
        assert!(err.to_string().contains("questions[1].category"));
    }

    #[test]
    fn test_finalize_overrides_model_echo() {
        let mut value = question_set(3, &[QuestionCategory::Technical]);
        value["model_used"] = json!("some-other-model");
        value["generation_timestamp"] = json!("1999-01-01T00:00:00");
        value["total_questions"] = json!(99);
        value["jd_analysis"] = json!({
            "role_title": "Paraphrased Title",
            "experience_range": "lots",
            "role_summary": "model paraphrase",
            "seniority_level": "Senior"
        });
        value["questions"][0]["id"] = json!(7);
        value["questions"][1]["id"] = json!(7);
        let set: InterviewQuestionSet = coerce(&value.to_string()).unwrap();
        assert_eq!(set.jd_analysis.role_title, "Paraphrased Title");

        let upstream = analysis();
        let set = finalize_question_set(set, &upstream, "llama-3.3-70b-versatile");
        assert_eq!(set.model_used, "llama-3.3-70b-versatile");
        assert_eq!(set.jd_analysis, upstream);
        assert_eq!(set.total_questions, 3);
        assert_ne!(set.generation_timestamp, "1999-01-01T00:00:00");
        let ids: Vec<u32> = set.questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_reply_is_retried_then_accepted() {
        let cats = [QuestionCategory::Technical, QuestionCategory::Behavioral];
        let backend = ScriptedBackend::new(vec![
            Reply::json(question_set(4, &cats)),
            Reply::json(question_set(5, &cats)),
        ]);
        let questions = generate_questions(&client(&backend), &analysis(), &config(5), 0.7, "m")
            .await
            .unwrap();
        assert_eq!(questions.len(), 5);
        assert_eq!(backend.calls_for("InterviewQuestionSet"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_returns_truncated_set() {
        let cats = [QuestionCategory::Technical];
        let backend = ScriptedBackend::new(vec![
            Reply::json(question_set(4, &cats)),
            Reply::json(question_set(4, &cats)),
        ]);
        let err = generate_questions(&client(&backend), &analysis(), &config(5), 0.7, "m")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)));
        assert!(err.to_string().starts_with("Question generation failed:"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_integer_ids_are_accepted_and_renumbered() {
        let mut reply = question_set(3, &[QuestionCategory::Technical]);
        reply["questions"][0]["id"] = json!("Q1");
        reply["questions"][1]["id"] = json!(-4);
        reply["questions"][2]
            .as_object_mut()
            .unwrap()
            .remove("id");
        let backend = ScriptedBackend::new(vec![Reply::json(reply)]);

        let config = GenerationConfig::new(
            Difficulty::Medium,
            3,
            vec![QuestionCategory::Technical],
        )
        .unwrap();
        let questions = generate_questions(&client(&backend), &analysis(), &config, 0.7, "m")
            .await
            .unwrap();

        let ids: Vec<u32> = questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(backend.calls_for("InterviewQuestionSet"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uses_generation_temperature() {
        let cats = [QuestionCategory::Behavioral];
        let backend = ScriptedBackend::new(vec![Reply::json(question_set(3, &cats))]);
        generate_questions(&client(&backend), &analysis(), &config(3), 0.7, "m")
            .await
            .unwrap();
        let req = &backend.requests()[0];
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(req.schema, "InterviewQuestionSet");
    }
}
