/// Shared error type used across all resuse crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The accounting file is missing, unreadable, or the read timed out.
    #[error("accounting source unavailable: {0}")]
    SourceUnavailable(String),

    /// The accounting file was read but its contents are not usable.
    #[error("malformed accounting data: {0}")]
    MalformedData(String),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for failures caused by the environment rather than the data,
    /// i.e. worth surfacing as "try again later".
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::SourceUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
