use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaggerError {
    #[error("Tagger request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Tagger returned status {0}")]
    Status(u16),
    #[error("Tagger returned {labels} labels for {offsets} offsets")]
    LengthMismatch { labels: usize, offsets: usize },
    #[error("Invalid lexicon: {0}")]
    Lexicon(String),
}

impl TaggerError {
    /// Whether another attempt could succeed: connection trouble, timeouts,
    /// throttling and 5xx. Bad requests and unreadable bodies are final.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => !(e.is_decode() || e.is_builder()),
            Self::Status(status) => *status == 429 || *status >= 500,
            Self::LengthMismatch { .. } | Self::Lexicon(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum VocabError {
    #[error("{0} vocabulary is empty")]
    Empty(&'static str),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("Invalid label {0:?}: expected O, B-<TYPE> or I-<TYPE>")]
    InvalidLabel(String),
}
