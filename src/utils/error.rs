use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status} for {endpoint}")]
    Backend { endpoint: String, status: u16 },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unknown category: {id}")]
    UnknownCategory { id: String },

    #[error("Unknown location: {id}")]
    UnknownLocation { id: String },

    #[error("No domain selected")]
    NoDomainSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    Selection,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MapError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MapError::Http(_) | MapError::Backend { .. } => ErrorCategory::Network,
            MapError::Serialization(_) => ErrorCategory::Data,
            MapError::Url(_)
            | MapError::Config { .. }
            | MapError::ConfigValidation { .. }
            | MapError::InvalidConfigValue { .. } => ErrorCategory::Configuration,
            MapError::UnknownCategory { .. }
            | MapError::UnknownLocation { .. }
            | MapError::NoDomainSelected => ErrorCategory::Selection,
            MapError::Io(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Selection => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MapError::Http(_) => "Check that the backend is reachable and try again",
            MapError::Backend { status, .. } if *status >= 500 => {
                "The backend failed to answer; try again later"
            }
            MapError::Backend { .. } => "Check the endpoint paths in the configuration",
            MapError::Serialization(_) => "The backend response did not match the expected JSON shape",
            MapError::Url(_) | MapError::InvalidConfigValue { .. } => {
                "Fix the highlighted configuration value"
            }
            MapError::Config { .. } | MapError::ConfigValidation { .. } => {
                "Make sure the configuration file exists and is valid TOML"
            }
            MapError::UnknownCategory { .. } => "Pick a category listed for the selected domain",
            MapError::UnknownLocation { .. } => "Pick a location from the visible list",
            MapError::NoDomainSelected => "Select a domain first",
            MapError::Io(_) => "Check file permissions and free disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => "Unable to reach the map backend".to_string(),
            ErrorCategory::Data => "Received unreadable map data".to_string(),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Selection => self.to_string(),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_errors_are_retryable_network_errors() {
        let err = MapError::Backend {
            endpoint: "/api/hierarchical/domains/".to_string(),
            status: 503,
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.user_friendly_message(), "Unable to reach the map backend");
    }

    #[test]
    fn test_selection_errors_are_low_severity() {
        let err = MapError::UnknownCategory { id: "X".to_string() };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.user_friendly_message(), "Unknown category: X");
    }
}
