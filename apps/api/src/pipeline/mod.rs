//! Interview Question Pipeline.
//!
//! Two dependent LLM stages behind one entry point:
//!   1. `analysis`  — raw JD text → `JobDescriptionAnalysis`
//!   2. `questions` — analysis + `GenerationConfig` → `Vec<InterviewQuestion>`
//!
//! `orchestrator` sequences them and guarantees a terminal outcome that
//! carries either questions or an error, never both.

pub mod analysis;
pub mod error;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod questions;

pub use error::PipelineError;
pub use orchestrator::Pipeline;
