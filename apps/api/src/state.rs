use crate::config::Config;
use crate::pipeline::Pipeline;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is read-only; per-run state lives inside `Pipeline::run`.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Pipeline,
}
