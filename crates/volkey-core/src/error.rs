use thiserror::Error;

pub type VolkeyResult<T> = Result<T, VolkeyError>;

#[derive(Debug, Error)]
pub enum VolkeyError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
