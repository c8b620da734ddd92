use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
