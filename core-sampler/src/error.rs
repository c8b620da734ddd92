use thiserror::Error;

/// Failures that end a stream session early.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Listing failed: {0}")]
    RemoteList(String),

    #[error("Fetching {file_name} ({file_id}) failed: {reason}")]
    Fetch {
        file_id: String,
        file_name: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, SessionError>;
