use crate::session::scope::ScopeId;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ResourceFinalized,
    DuplicatePrimaryKey,
    TableNotFound,
    InvalidConfig,
    InvalidScenario,
    Encode,
    Decode,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ResourceFinalized => "resource_finalized",
            ErrorCode::DuplicatePrimaryKey => "duplicate_primary_key",
            ErrorCode::TableNotFound => "table_not_found",
            ErrorCode::InvalidConfig => "invalid_config",
            ErrorCode::InvalidScenario => "invalid_scenario",
            ErrorCode::Encode => "encode",
            ErrorCode::Decode => "decode",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    /// A submission reached a batch scope (or one of its ancestors) that was
    /// already committed, rolled back or closed.
    #[error("resource finalized: batch scope {scope} is closed")]
    ResourceFinalized { scope: ScopeId },
    #[error("duplicate primary key in table '{table}': {key}")]
    DuplicatePrimaryKey { table: String, key: i64 },
    #[error("table '{table}' not found")]
    TableNotFound { table: String },
    #[error("invalid config: {message}")]
    InvalidConfig { message: String },
    #[error("invalid scenario: {message}")]
    InvalidScenario { message: String },
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl SessionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::ResourceFinalized { .. } => ErrorCode::ResourceFinalized,
            SessionError::DuplicatePrimaryKey { .. } => ErrorCode::DuplicatePrimaryKey,
            SessionError::TableNotFound { .. } => ErrorCode::TableNotFound,
            SessionError::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            SessionError::InvalidScenario { .. } => ErrorCode::InvalidScenario,
            SessionError::Encode(_) => ErrorCode::Encode,
            SessionError::Decode(_) => ErrorCode::Decode,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code().as_str()
    }

    pub fn is_resource_finalized(&self) -> bool {
        matches!(self, SessionError::ResourceFinalized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, SessionError};
    use crate::session::scope::ScopeId;

    #[test]
    fn error_code_strings_are_stable() {
        assert_eq!(ErrorCode::ResourceFinalized.as_str(), "resource_finalized");
        assert_eq!(
            ErrorCode::DuplicatePrimaryKey.as_str(),
            "duplicate_primary_key"
        );
        assert_eq!(ErrorCode::InvalidScenario.as_str(), "invalid_scenario");
    }

    #[test]
    fn error_code_str_matches_variant_mapping() {
        let err = SessionError::ResourceFinalized {
            scope: ScopeId::ROOT,
        };
        assert_eq!(err.code(), ErrorCode::ResourceFinalized);
        assert_eq!(err.code_str(), "resource_finalized");
        assert!(err.is_resource_finalized());

        let err = SessionError::TableNotFound {
            table: "missing".into(),
        };
        assert_eq!(err.code_str(), "table_not_found");
        assert!(!err.is_resource_finalized());
    }
}
