use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::shortlist::service::ProcessingError;

/// Top-level error surfaced by embedding applications.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("processing error: {0}")]
    Processing(#[from] ProcessingError),
}
