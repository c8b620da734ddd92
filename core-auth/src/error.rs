use crate::types::AccountId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Lookup with an index outside the registry. No provider call is made.
    #[error("Account index {index} is out of range (0..{count})")]
    AccountOutOfRange { index: i64, count: usize },

    /// The account has no usable credential yet.
    #[error("{account} is not authenticated")]
    NotAuthenticated { account: AccountId },

    #[error("{account} has no refresh token")]
    NoRefreshToken { account: AccountId },

    /// Authorization code exchange was rejected or failed. Never retried.
    #[error("Authorization code exchange failed: {0}")]
    AuthExchange(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Stored credential {key} is unreadable: {reason}")]
    TokenCorrupted { key: String, reason: String },

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
