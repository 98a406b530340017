use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Malformed address '{path}': {reason}")]
    MalformedAddress { path: String, reason: String },

    #[error("Illegal update target '{target}': the ledger is never updated directly")]
    IllegalTarget { target: String },

    #[error("Source unavailable for {artifact}: {message}")]
    SourceUnavailable { artifact: String, message: String },

    #[error("Malformed response for {artifact}: {message}")]
    MalformedResponse { artifact: String, message: String },

    #[error("Corrupt ledger '{path}' at row {row}: {message}")]
    LedgerCorrupt {
        path: String,
        row: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, UpdateError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Address,
    Source,
    Ledger,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl UpdateError {
    pub fn malformed_address(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedAddress {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn source_unavailable(artifact: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            artifact: artifact.into(),
            message: message.into(),
        }
    }

    pub fn malformed_response(artifact: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            artifact: artifact.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedAddress { .. } | Self::IllegalTarget { .. } => ErrorCategory::Address,
            Self::SourceUnavailable { .. }
            | Self::MalformedResponse { .. }
            | Self::HttpError(_) => ErrorCategory::Source,
            Self::LedgerCorrupt { .. } => ErrorCategory::Ledger,
            Self::IoError(_) | Self::CsvError(_) => ErrorCategory::Storage,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    /// Adapter-level failures are isolated to one artifact and retried on the
    /// next run; everything else aborts the request.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::SourceUnavailable { .. } | Self::MalformedResponse { .. } | Self::HttpError(_)
        )
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Source => ErrorSeverity::Medium,
            ErrorCategory::Address | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Ledger | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::MalformedAddress { .. } => {
                "Pass a path inside '<start>-<end> Season', at season, team or player depth"
            }
            Self::IllegalTarget { .. } => {
                "Target the artifact or its directory; the ledger is rewritten automatically"
            }
            Self::SourceUnavailable { .. } | Self::HttpError(_) => {
                "Check the network and source endpoint, then re-run; the ledger was left untouched"
            }
            Self::MalformedResponse { .. } => {
                "The source returned unexpected data; check the endpoint template for this artifact"
            }
            Self::LedgerCorrupt { .. } => {
                "Inspect or delete the broken 'log information.csv'; it is rebuilt on the next write"
            }
            Self::IoError(_) | Self::CsvError(_) => {
                "Check that the database directory exists and is writable"
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command-line flags"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MalformedAddress { path, .. } => {
                format!("'{}' is not a season, team or player location", path)
            }
            Self::IllegalTarget { target } => format!("'{}' cannot be updated manually", target),
            Self::LedgerCorrupt { path, .. } => format!("The ledger at '{}' is unreadable", path),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_errors_are_not_fatal() {
        assert!(!UpdateError::source_unavailable("totals.csv", "503").is_fatal());
        assert!(!UpdateError::malformed_response("totals.csv", "empty body").is_fatal());
        assert!(UpdateError::malformed_address("x", "depth 4").is_fatal());
        assert!(UpdateError::IllegalTarget {
            target: "log information.csv".to_string()
        }
        .is_fatal());
    }

    #[test]
    fn test_severity_ordering() {
        let ledger = UpdateError::LedgerCorrupt {
            path: "p".to_string(),
            row: 2,
            message: "bad date".to_string(),
        };
        assert_eq!(ledger.severity(), ErrorSeverity::Critical);
        assert!(ledger.severity() > UpdateError::source_unavailable("a", "b").severity());
    }
}
