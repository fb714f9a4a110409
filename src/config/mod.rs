use std::env;
use std::fmt;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the shortlisting pipeline.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub pipeline: PipelineConfig,
    pub evaluator: EvaluatorConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let max_payload_bytes = env::var("MAX_PAYLOAD_BYTES")
            .unwrap_or_else(|_| "102400".to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidMaxPayloadBytes)?;
        if max_payload_bytes == 0 {
            return Err(ConfigError::InvalidMaxPayloadBytes);
        }

        let minimum_score = env::var("SHORTLIST_MIN_SCORE")
            .unwrap_or_else(|_| "2".to_string())
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidMinimumScore)?;

        let provider = env::var("EVALUATOR_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let model = env::var("EVALUATOR_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let max_retries = env::var("EVALUATOR_MAX_RETRIES")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidMaxRetries)?;
        if max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries);
        }

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            pipeline: PipelineConfig {
                max_payload_bytes,
                minimum_score,
            },
            evaluator: EvaluatorConfig {
                provider,
                model,
                max_retries,
                retry_base_delay: Duration::from_secs(1),
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Settings governing compression bounds and shortlist qualification.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_payload_bytes: usize,
    pub minimum_score: u32,
}

/// Settings for the external text-completion evaluator.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    pub provider: String,
    pub model: String,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidMaxPayloadBytes,
    InvalidMinimumScore,
    InvalidMaxRetries,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidMaxPayloadBytes => {
                write!(f, "MAX_PAYLOAD_BYTES must be a positive integer")
            }
            ConfigError::InvalidMinimumScore => {
                write!(f, "SHORTLIST_MIN_SCORE must be a non-negative integer")
            }
            ConfigError::InvalidMaxRetries => {
                write!(f, "EVALUATOR_MAX_RETRIES must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
