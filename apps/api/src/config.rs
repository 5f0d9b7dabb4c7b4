use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Upper bound for LLM_MAX_RETRIES.
pub const MAX_LLM_RETRIES: u32 = 10;

const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
/// Canonical model identifier, stamped into every generated question set.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Application configuration loaded from environment variables.
/// Read once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm: LlmSettings,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

/// Sampling and retry knobs for the structured generation client.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    /// Low temperature used by the analysis stage.
    pub analysis_temperature: f32,
    /// Higher temperature used by the question generation stage.
    pub generation_temperature: f32,
    /// Retries after the first attempt. Always at least 1.
    pub max_retries: u32,
    pub timeout: Duration,
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            analysis_temperature: 0.3,
            generation_temperature: 0.7,
            max_retries: 2,
            timeout: Duration::from_secs(60),
            max_tokens: 8192,
        }
    }
}

// Hand-written so the API key never reaches a log line.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("llm_api_key", &"<redacted>")
            .field("llm_api_url", &self.llm_api_url)
            .field("llm_model", &self.llm_model)
            .field("llm", &self.llm)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = LlmSettings::default();
        let llm = LlmSettings {
            analysis_temperature: parse_env(
                "LLM_ANALYSIS_TEMPERATURE",
                defaults.analysis_temperature,
            )?,
            generation_temperature: parse_env(
                "LLM_GENERATION_TEMPERATURE",
                defaults.generation_temperature,
            )?,
            max_retries: parse_env("LLM_MAX_RETRIES", defaults.max_retries)?,
            timeout: Duration::from_secs(parse_env(
                "LLM_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
            max_tokens: parse_env("LLM_MAX_TOKENS", defaults.max_tokens)?,
        };
        llm.validate()?;

        Ok(Config {
            llm_api_key: require_env("GROQ_API_KEY")?,
            llm_api_url: std::env::var("LLM_API_URL")
                .unwrap_or_else(|_| DEFAULT_LLM_API_URL.to_string()),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            llm,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            port: parse_env("PORT", 8000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl LlmSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            bail!("LLM_MAX_RETRIES must be at least 1");
        }
        if self.max_retries > MAX_LLM_RETRIES {
            bail!(
                "LLM_MAX_RETRIES must be at most {MAX_LLM_RETRIES}, got {}",
                self.max_retries
            );
        }
        if self.timeout.is_zero() {
            bail!("LLM_TIMEOUT_SECS must be greater than 0");
        }
        for (name, t) in [
            ("LLM_ANALYSIS_TEMPERATURE", self.analysis_temperature),
            ("LLM_GENERATION_TEMPERATURE", self.generation_temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                bail!("{name} must be between 0.0 and 2.0, got {t}");
            }
        }
        Ok(())
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}
