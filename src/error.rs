use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Empty pattern in {0} rules")]
    EmptyPattern(&'static str),

    #[error("Invalid color {0:?}: quotes and angle brackets are not allowed")]
    InvalidColor(String),

    #[error("Unknown fragment id {0}")]
    UnknownFragment(usize),

    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Failed to serialize rules: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
