use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::llm_client::schema::{null_as_default, require_text, SchemaError, StructuredOutput};

/// A single skill extracted from the JD.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub name: String,
    /// Beginner / Intermediate / Advanced / Expert, kept as text.
    #[serde(default)]
    pub proficiency: String,
    /// Technical / Soft Skill / Domain Knowledge / Tool, kept as text.
    #[serde(default)]
    pub category: String,
}

/// Structured analysis of a job description, produced once by the analysis
/// stage and treated as read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptionAnalysis {
    pub role_title: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    pub experience_range: String,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_skills: Vec<SkillRequirement>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub responsibilities: Vec<String>,
    pub role_summary: String,
    /// Junior / Mid / Senior / Lead / Principal / Executive, kept as text.
    pub seniority_level: String,
    #[serde(default)]
    pub industry: Option<String>,
}

impl StructuredOutput for JobDescriptionAnalysis {
    const SCHEMA_NAME: &'static str = "JobDescriptionAnalysis";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "required": [
                "role_title", "experience_range", "key_skills",
                "responsibilities", "role_summary", "seniority_level"
            ],
            "properties": {
                "role_title": {"type": "string", "description": "Extracted job title"},
                "company_name": {"type": ["string", "null"], "description": "Company name if mentioned"},
                "department": {"type": ["string", "null"], "description": "Department or team"},
                "experience_range": {"type": "string", "description": "Required experience, e.g. '3-5 years'"},
                "education": {"type": ["string", "null"], "description": "Education requirements"},
                "key_skills": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["name", "proficiency", "category"],
                        "properties": {
                            "name": {"type": "string", "description": "Skill name, e.g. 'Python', 'Leadership'"},
                            "proficiency": {"type": "string", "description": "Beginner / Intermediate / Advanced / Expert"},
                            "category": {"type": "string", "description": "Technical / Soft Skill / Domain Knowledge / Tool"}
                        }
                    }
                },
                "responsibilities": {"type": "array", "items": {"type": "string"}},
                "role_summary": {"type": "string", "description": "2-3 sentence summary of what this role entails"},
                "seniority_level": {"type": "string", "description": "Junior / Mid / Senior / Lead / Principal / Executive"},
                "industry": {"type": ["string", "null"], "description": "Industry or domain if identifiable"}
            }
        })
    }

    fn validate(&self) -> Result<(), SchemaError> {
        const S: &str = JobDescriptionAnalysis::SCHEMA_NAME;
        require_text(S, "role_title", &self.role_title)?;
        require_text(S, "experience_range", &self.experience_range)?;
        require_text(S, "role_summary", &self.role_summary)?;
        require_text(S, "seniority_level", &self.seniority_level)?;
        for (i, skill) in self.key_skills.iter().enumerate() {
            require_text(S, &format!("key_skills[{i}].name"), &skill.name)?;
        }
        Ok(())
    }
}

impl JobDescriptionAnalysis {
    /// Comma-separated skill names, for prompts.
    pub fn skill_names(&self) -> String {
        self.key_skills
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
