//! Generation options accepted from the caller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_QUESTIONS: u32 = 3;
pub const MAX_QUESTIONS: u32 = 30;
pub const DEFAULT_QUESTIONS: u32 = 10;

/// Categories used when the caller's list is missing or unparseable.
pub const DEFAULT_CATEGORIES: [QuestionCategory; 3] = [
    QuestionCategory::Technical,
    QuestionCategory::Behavioral,
    QuestionCategory::Situational,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(alias = "easy")]
    Easy,
    #[default]
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "hard")]
    Hard,
}

impl Difficulty {
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ConfigError::UnknownDifficulty(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionCategory {
    #[serde(alias = "technical")]
    Technical,
    #[serde(alias = "behavioral", alias = "Behavioural")]
    Behavioral,
    #[serde(alias = "situational")]
    Situational,
    #[serde(
        rename = "Competency-Based",
        alias = "Competency Based",
        alias = "Competency"
    )]
    CompetencyBased,
    #[serde(rename = "Culture Fit", alias = "Culture-Fit", alias = "Cultural Fit")]
    CultureFit,
}

impl QuestionCategory {
    pub const ALL: [QuestionCategory; 5] = [
        QuestionCategory::Technical,
        QuestionCategory::Behavioral,
        QuestionCategory::Situational,
        QuestionCategory::CompetencyBased,
        QuestionCategory::CultureFit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            QuestionCategory::Technical => "Technical",
            QuestionCategory::Behavioral => "Behavioral",
            QuestionCategory::Situational => "Situational",
            QuestionCategory::CompetencyBased => "Competency-Based",
            QuestionCategory::CultureFit => "Culture Fit",
        }
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuestionCategory {
    type Err = ConfigError;

    /// Exact label match, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("num_questions must be between 3 and 30, got {0}")]
    QuestionCountOutOfRange(i64),

    #[error("num_questions must be an integer, got '{0}'")]
    QuestionCountNotANumber(String),

    #[error("difficulty must be one of Easy, Medium, Hard; got '{0}'")]
    UnknownDifficulty(String),

    #[error("unknown question category '{0}'")]
    UnknownCategory(String),

    #[error("at least one question category is required")]
    NoCategories,
}

/// Parses a comma-separated category list.
///
/// Any unrecognised token, or an empty list, yields `DEFAULT_CATEGORIES`
/// rather than an error. Duplicates are dropped, first occurrence wins.
pub fn parse_categories(input: &str) -> Vec<QuestionCategory> {
    let parsed: Result<Vec<QuestionCategory>, _> = input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(QuestionCategory::from_str)
        .collect();

    match parsed {
        Ok(list) if !list.is_empty() => dedup_ordered(list),
        _ => DEFAULT_CATEGORIES.to_vec(),
    }
}

fn dedup_ordered(list: Vec<QuestionCategory>) -> Vec<QuestionCategory> {
    let mut out = Vec::with_capacity(list.len());
    for c in list {
        if !out.contains(&c) {
            out.push(c);
        }
    }
    out
}

/// Validated generation options. Fields are private so an out-of-range
/// config cannot exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationConfig {
    difficulty: Difficulty,
    num_questions: u32,
    categories: Vec<QuestionCategory>,
}

impl GenerationConfig {
    pub fn new(
        difficulty: Difficulty,
        num_questions: u32,
        categories: Vec<QuestionCategory>,
    ) -> Result<Self, ConfigError> {
        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&num_questions) {
            return Err(ConfigError::QuestionCountOutOfRange(num_questions.into()));
        }
        if categories.is_empty() {
            return Err(ConfigError::NoCategories);
        }
        Ok(Self {
            difficulty,
            num_questions,
            categories: dedup_ordered(categories),
        })
    }

    /// Builds a config from raw form values. Missing values take defaults;
    /// categories go through `parse_categories` and never fail.
    pub fn from_form(
        difficulty: Option<&str>,
        num_questions: Option<&str>,
        categories: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let difficulty = match difficulty.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse()?,
            None => Difficulty::default(),
        };

        let num_questions = match num_questions.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let n: i64 = raw
                    .parse()
                    .map_err(|_| ConfigError::QuestionCountNotANumber(raw.to_string()))?;
                u32::try_from(n).map_err(|_| ConfigError::QuestionCountOutOfRange(n))?
            }
            None => DEFAULT_QUESTIONS,
        };

        let categories = match categories {
            Some(raw) => parse_categories(raw),
            None => DEFAULT_CATEGORIES.to_vec(),
        };

        Self::new(difficulty, num_questions, categories)
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn num_questions(&self) -> u32 {
        self.num_questions
    }

    pub fn categories(&self) -> &[QuestionCategory] {
        &self.categories
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            num_questions: DEFAULT_QUESTIONS,
            categories: DEFAULT_CATEGORIES.to_vec(),
        }
    }
}
