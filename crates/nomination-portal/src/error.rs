use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::nomination::ServiceError;
use std::fmt;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Failures that end the process: startup, serving, or a command-line walkthrough.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Portal(ServiceError),
    Demo {
        stage: &'static str,
        source: BoxedError,
    },
}

impl AppError {
    pub fn demo(stage: &'static str, source: impl Into<BoxedError>) -> Self {
        Self::Demo {
            stage,
            source: source.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Portal(err) => write!(f, "portal error: {}", err),
            AppError::Demo { stage, source } => write!(f, "demo stopped at {stage}: {source}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Portal(err) => Some(err),
            AppError::Demo { source, .. } => Some(&**source),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        Self::Portal(value)
    }
}
