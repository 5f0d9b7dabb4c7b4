//! Structured generation — "produce a `T` from this prompt", with a bounded
//! retry budget and a per-attempt timeout.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::config::LlmSettings;
use crate::llm_client::prompts::with_schema;
use crate::llm_client::schema::{coerce, SchemaError, StructuredOutput};
use crate::llm_client::{CompletionBackend, CompletionRequest, LlmError};

const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry and timeout policy applied to every structured call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Clamped to at least 1.
    pub max_retries: u32,
    pub timeout: Duration,
    /// Delay before the first retry; doubles on every further retry.
    pub backoff_base: Duration,
    /// Ceiling for any single backoff delay.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, timeout: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            timeout,
            backoff_base: DEFAULT_BACKOFF_BASE,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }

    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self::new(settings.max_retries, settings.timeout)
    }

    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        // Exponential backoff: base, 2x base, 4x base... capped at max_backoff
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .min(self.max_backoff)
    }
}

/// Stage-supplied instruction plus grounding content.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Schema-agnostic adapter shared by both pipeline stages. Holds no mutable
/// state, so one instance serves every concurrent request.
#[derive(Clone)]
pub struct StructuredClient {
    backend: Arc<dyn CompletionBackend>,
    policy: RetryPolicy,
}

impl StructuredClient {
    pub fn new(backend: Arc<dyn CompletionBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub async fn generate<T: StructuredOutput>(
        &self,
        prompt: &Prompt,
        temperature: f32,
    ) -> Result<T, LlmError> {
        self.generate_checked(prompt, temperature, |_: &T| Ok(()))
            .await
    }

    /// Like `generate`, with an extra caller check. A value failing `check`
    /// counts as a schema mismatch and consumes one attempt.
    pub async fn generate_checked<T, F>(
        &self,
        prompt: &Prompt,
        temperature: f32,
        check: F,
    ) -> Result<T, LlmError>
    where
        T: StructuredOutput,
        F: Fn(&T) -> Result<(), SchemaError> + Send + Sync,
    {
        let request = CompletionRequest {
            system: with_schema(&prompt.system, T::SCHEMA_NAME, &T::json_schema()),
            user: prompt.user.clone(),
            temperature,
            schema: T::SCHEMA_NAME,
        };

        let attempts = self.policy.attempts();
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.policy.delay_before(attempt);
                warn!(
                    "{} attempt {}/{} failed, retrying after {}ms...",
                    T::SCHEMA_NAME,
                    attempt,
                    attempts,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.attempt(&request, &check).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    warn!("{} attempt {} failed: {}", T::SCHEMA_NAME, attempt + 1, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts,
            last: Box::new(last_error.unwrap_or(LlmError::EmptyContent)),
        })
    }

    async fn attempt<T, F>(&self, request: &CompletionRequest, check: &F) -> Result<T, LlmError>
    where
        T: StructuredOutput,
        F: Fn(&T) -> Result<(), SchemaError> + Send + Sync,
    {
        let raw = tokio::time::timeout(self.policy.timeout, self.backend.complete(request))
            .await
            .map_err(|_| LlmError::Timeout(self.policy.timeout))??;

        let value = coerce::<T>(&raw)?;
        check(&value)?;
        Ok(value)
    }
}
