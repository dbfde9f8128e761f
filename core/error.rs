use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = CompError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CompError {
    #[error("Class not found: {0}")]
    ClassNotFound(String),

    #[error("Unknown extraction kind: {0}")]
    UnknownKind(String),

    #[error("Invocation Error: {class}.{method}: {message}")]
    Invocation {
        class: String,
        method: String,
        message: String,
    },

    #[error("CSV Error: {0}")]
    Csv(String),

    #[error("File Write Error: Path '{path}', Error: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),
}

impl From<csv::Error> for CompError {
    fn from(err: csv::Error) -> Self {
        CompError::Csv(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for CompError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        CompError::Csv(format!("UTF-8 decoding error: {}", err))
    }
}
