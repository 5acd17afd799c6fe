use crate::core::normalizer::ConnectionDefect;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Model request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Model API returned status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("Unusable model response: {message}")]
    UpstreamResponse { message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Malformed connection #{index} '{raw}': {defect}")]
    MalformedConnection {
        index: usize,
        raw: String,
        defect: ConnectionDefect,
    },

    #[error("Component '{name}' not found in catalog")]
    ComponentNotFound { name: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Upstream,
    MalformedConnection,
    Catalog,
    Configuration,
    Io,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl ProjectError {
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamResponse {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_)
            | Self::UpstreamStatus { .. }
            | Self::UpstreamResponse { .. }
            | Self::SerializationError(_) => ErrorCategory::Upstream,
            Self::MalformedConnection { .. } => ErrorCategory::MalformedConnection,
            Self::ComponentNotFound { .. } => ErrorCategory::Catalog,
            Self::IoError(_) => ErrorCategory::Io,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn is_upstream(&self) -> bool {
        self.category() == ErrorCategory::Upstream
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 上游暫時性錯誤，重試可能成功
            ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Catalog => ErrorSeverity::Low,
            ErrorCategory::MalformedConnection | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::HttpError(_) => "Check network connectivity and the model API endpoint".to_string(),
            Self::UpstreamStatus { status, .. } if *status == 401 || *status == 403 => {
                "Check that the API key is valid (COHERE_API_KEY)".to_string()
            }
            Self::UpstreamStatus { status, .. } if *status == 429 => {
                "The model API is rate limiting requests, wait and try again".to_string()
            }
            Self::UpstreamStatus { .. } => "The model API rejected the request, try again later".to_string(),
            Self::UpstreamResponse { .. } | Self::SerializationError(_) => {
                "The model did not return the expected JSON project, run the query again".to_string()
            }
            Self::MalformedConnection { .. } => {
                "Re-run the query, or use lenient mode (--lenient) to skip malformed wires".to_string()
            }
            Self::ComponentNotFound { name } => {
                format!("Add '{}' to the component catalog or check its spelling", name)
            }
            Self::IoError(_) => "Check that the file exists and is readable".to_string(),
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => {
                "Review the configuration file and command line flags".to_string()
            }
            Self::ProcessingError { .. } => "Inspect the input data for inconsistencies".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Upstream => format!("Could not get a project from the model: {}", self),
            ErrorCategory::MalformedConnection => {
                format!("The model returned a wire we could not read: {}", self)
            }
            ErrorCategory::Catalog => format!("Unknown component: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Io => format!("File access failed: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectError>;
