use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode request body: {0}")]
    Encode(serde_json::Error),

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

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

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    HttpStatus,
    Decode,
    Configuration,
    Validation,
}

impl ClientError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::Transport { .. } => ErrorCategory::Transport,
            ClientError::HttpStatus { .. } => ErrorCategory::HttpStatus,
            ClientError::Decode { .. } | ClientError::InvalidResponse { .. } => {
                ErrorCategory::Decode
            }
            ClientError::IoError(_)
            | ClientError::ConfigError { .. }
            | ClientError::ConfigValidationError { .. }
            | ClientError::InvalidConfigValueError { .. }
            | ClientError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ClientError::Encode(_) | ClientError::ValidationError { .. } => {
                ErrorCategory::Validation
            }
        }
    }

    /// HTTP status reported by the server, if the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ClientError::Transport { .. } => {
                "Could not reach the prestations service. Check the base URL and your connection."
                    .to_string()
            }
            ClientError::HttpStatus { status: 404, .. } => {
                "The requested resource does not exist.".to_string()
            }
            ClientError::HttpStatus { status, .. } if (400..500).contains(status) => {
                format!("The request was rejected by the server (status {}).", status)
            }
            ClientError::HttpStatus { status, .. } => {
                format!("The server failed to handle the request (status {}).", status)
            }
            ClientError::Decode { context, .. } => {
                format!("The server returned an unexpected {} payload.", context)
            }
            ClientError::InvalidResponse { message } => {
                format!("The server returned inconsistent data: {}", message)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
