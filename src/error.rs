use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network failure or a non-success status for one request.
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// The page loaded but carried no table. Pagination treats this as the end.
    #[error("no table found at {url}")]
    MissingTable { url: String },

    /// One row or schedule entry could not be read.
    #[error("parse error: {0}")]
    Parse(String),
}

impl ScrapeError {
    pub fn transport(url: &str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn is_missing_table(&self) -> bool {
        matches!(self, Self::MissingTable { .. })
    }
}
