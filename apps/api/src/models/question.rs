use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::llm_client::schema::{
    lenient, null_as_default, require_text, SchemaError, StructuredOutput,
};
use crate::models::analysis::JobDescriptionAnalysis;
use crate::models::config::{Difficulty, QuestionCategory};

/// Three-tier rubric for scoring a candidate's answer. All tiers required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationCriteria {
    pub excellent: String,
    pub acceptable: String,
    pub poor: String,
}

/// A single interview question with its complete context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    /// Sequential, starting at 1. Renumbered locally after generation, so
    /// whatever the model sends here is accepted.
    #[serde(default, deserialize_with = "lenient")]
    pub id: u32,
    pub question: String,
    pub category: QuestionCategory,
    pub difficulty: Difficulty,
    pub why_ask: String,
    pub expected_answer: String,
    pub evaluation_criteria: EvaluationCriteria,
    #[serde(default, deserialize_with = "null_as_default")]
    pub follow_up_questions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relevant_skills: Vec<String>,
}

impl InterviewQuestion {
    fn validate_at(&self, index: usize) -> Result<(), SchemaError> {
        const S: &str = InterviewQuestionSet::SCHEMA_NAME;
        let field = |name: &str| format!("questions[{index}].{name}");
        require_text(S, &field("question"), &self.question)?;
        require_text(S, &field("why_ask"), &self.why_ask)?;
        require_text(S, &field("expected_answer"), &self.expected_answer)?;
        let rubric = &self.evaluation_criteria;
        require_text(S, &field("evaluation_criteria.excellent"), &rubric.excellent)?;
        require_text(S, &field("evaluation_criteria.acceptable"), &rubric.acceptable)?;
        require_text(S, &field("evaluation_criteria.poor"), &rubric.poor)?;
        Ok(())
    }
}

/// Complete set of generated interview questions with metadata.
///
/// `jd_analysis`, `total_questions`, `generation_timestamp` and `model_used`
/// are owned locally: whatever the model echoes for them is tolerated on
/// input and overwritten before the set leaves the generation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestionSet {
    #[serde(default, deserialize_with = "lenient")]
    pub jd_analysis: JobDescriptionAnalysis,
    pub questions: Vec<InterviewQuestion>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_questions: usize,
    #[serde(default, deserialize_with = "lenient")]
    pub generation_timestamp: String,
    #[serde(default, deserialize_with = "lenient")]
    pub model_used: String,
}

impl InterviewQuestionSet {
    /// Assembles the caller-facing set: `total_questions` is derived from the
    /// list and the timestamp is taken now.
    pub fn assemble(
        jd_analysis: JobDescriptionAnalysis,
        questions: Vec<InterviewQuestion>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            jd_analysis,
            total_questions: questions.len(),
            questions,
            generation_timestamp: now_iso8601(),
            model_used: model_used.into(),
        }
    }
}

pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl StructuredOutput for InterviewQuestionSet {
    const SCHEMA_NAME: &'static str = "InterviewQuestionSet";

    fn json_schema() -> Value {
        let categories: Vec<&str> = QuestionCategory::ALL.iter().map(|c| c.label()).collect();
        json!({
            "type": "object",
            "required": ["questions"],
            "properties": {
                "questions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": [
                            "question", "category", "difficulty", "why_ask",
                            "expected_answer", "evaluation_criteria",
                            "follow_up_questions", "relevant_skills"
                        ],
                        "properties": {
                            "id": {"type": "integer", "description": "Sequential question number starting at 1"},
                            "question": {"type": "string", "description": "The interview question text"},
                            "category": {"type": "string", "enum": categories},
                            "difficulty": {"type": "string", "enum": ["Easy", "Medium", "Hard"]},
                            "why_ask": {"type": "string", "description": "Why this question is relevant to the role"},
                            "expected_answer": {"type": "string", "description": "Ideal / model answer"},
                            "evaluation_criteria": {
                                "type": "object",
                                "required": ["excellent", "acceptable", "poor"],
                                "properties": {
                                    "excellent": {"type": "string", "description": "What an excellent answer looks like"},
                                    "acceptable": {"type": "string", "description": "What a satisfactory answer looks like"},
                                    "poor": {"type": "string", "description": "Red flags or poor answer indicators"}
                                }
                            },
                            "follow_up_questions": {
                                "type": "array", "items": {"type": "string"},
                                "description": "2-3 follow-up probing questions"
                            },
                            "relevant_skills": {
                                "type": "array", "items": {"type": "string"},
                                "description": "Skills this question tests"
                            }
                        }
                    }
                }
            }
        })
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.questions.is_empty() {
            return Err(SchemaError::invalid(
                Self::SCHEMA_NAME,
                "questions",
                "must contain at least one question",
            ));
        }
        for (i, q) in self.questions.iter().enumerate() {
            q.validate_at(i)?;
        }
        Ok(())
    }
}
