// Data contracts shared by both pipeline stages and the HTTP layer.

pub mod analysis;
pub mod config;
pub mod question;

pub use analysis::JobDescriptionAnalysis;
pub use config::{ConfigError, GenerationConfig};
pub use question::{InterviewQuestion, InterviewQuestionSet};
