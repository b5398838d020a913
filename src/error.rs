use thiserror::Error;

/// Coarse failure classes reported alongside the manual-handling signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A tenant, operation key or technical account is not mapped.
    Configuration,
    /// Job variables or an upstream message could not be interpreted.
    Decode,
    /// The ledger refused the batch, or the failure could not be classified.
    Ledger,
}

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("No tenant payment type id configuration found for {0}")]
    ConfigNotFound(String),
    #[error("Operation {key} is not configured for tenant {tenant}")]
    OperationNotConfigured { tenant: String, key: String },
    #[error("No technical account configured for {key} of tenant {tenant}")]
    TechnicalAccountNotConfigured { tenant: String, key: String },
    #[error("Unknown stage: {0}")]
    UnknownStage(String),
    #[error("Missing job variable: {0}")]
    MissingVariable(&'static str),
    #[error("Invalid job variables: {0}")]
    InvalidVariables(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Decode error: {0}")]
    DecodeError(String),
    #[error("Ledger rejected item {index}: {reason}")]
    LedgerRejected { index: usize, reason: String },
    #[error("Ledger error: {0}")]
    LedgerError(String),
    #[error("Settings error: {0}")]
    SettingsError(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConnectorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigNotFound(_)
            | Self::OperationNotConfigured { .. }
            | Self::TechnicalAccountNotConfigured { .. }
            | Self::SettingsError(_) => ErrorKind::Configuration,
            Self::UnknownStage(_)
            | Self::MissingVariable(_)
            | Self::InvalidVariables(_)
            | Self::ValidationError(_)
            | Self::DecodeError(_) => ErrorKind::Decode,
            // Anything we cannot classify fails closed, same as a ledger refusal.
            Self::LedgerRejected { .. }
            | Self::LedgerError(_)
            | Self::JsonError(_)
            | Self::IoError(_) => ErrorKind::Ledger,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConnectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ConnectorError::ConfigNotFound("T9".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            ConnectorError::MissingVariable("amount").kind(),
            ErrorKind::Decode
        );
        assert_eq!(
            ConnectorError::LedgerRejected {
                index: 0,
                reason: "insufficient funds".into()
            }
            .kind(),
            ErrorKind::Ledger
        );
        let io = ConnectorError::from(std::io::Error::other("broken pipe"));
        assert_eq!(io.kind(), ErrorKind::Ledger);
    }
}
