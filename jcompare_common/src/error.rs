use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid invocation: {0}")]
    Invocation(String),
}

pub type Result<T> = std::result::Result<T, CompareError>;
