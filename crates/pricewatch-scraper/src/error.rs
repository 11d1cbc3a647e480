use std::path::PathBuf;

use thiserror::Error;

/// Terminal failure of the fetcher after its retry budget is spent, or a
/// capture-mode read failure.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out: {source}")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("transport failure fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("capture file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read capture file {}: {source}", .path.display())]
    CaptureRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid retry policy: {0}")]
    InvalidPolicy(String),
}

impl FetchError {
    pub(crate) fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            FetchError::Timeout {
                url: url.to_owned(),
                source,
            }
        } else {
            FetchError::Transport {
                url: url.to_owned(),
                source,
            }
        }
    }
}

/// Structural failure while recovering facts from a fetched page.
///
/// Missing individual fields are never a `ParseError`; they resolve to
/// sentinel values instead.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("embedded payload not found: {0}")]
    PayloadNotFound(String),

    #[error("malformed embedded payload: {0}")]
    MalformedPayload(String),

    #[error("embedded JSON could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Which step of an extraction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStage {
    Dispatch,
    Fetch,
    Parse,
}

impl std::fmt::Display for ExtractionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionStage::Dispatch => write!(f, "dispatch"),
            ExtractionStage::Fetch => write!(f, "fetch"),
            ExtractionStage::Parse => write!(f, "parse"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionCause {
    #[error("unsupported site '{site}'")]
    UnsupportedSite { site: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Failure of one product extraction, tagged with the stage that failed.
#[derive(Debug, Error)]
#[error("extracting '{product}' failed at {stage} stage: {cause}")]
pub struct ExtractionError {
    pub product: String,
    pub stage: ExtractionStage,
    #[source]
    pub cause: ExtractionCause,
}

impl ExtractionError {
    pub(crate) fn unsupported_site(product: &str, site: &str) -> Self {
        Self {
            product: product.to_owned(),
            stage: ExtractionStage::Dispatch,
            cause: ExtractionCause::UnsupportedSite {
                site: site.to_owned(),
            },
        }
    }

    pub(crate) fn fetch(product: &str, source: FetchError) -> Self {
        Self {
            product: product.to_owned(),
            stage: ExtractionStage::Fetch,
            cause: ExtractionCause::Fetch(source),
        }
    }

    pub(crate) fn parse(product: &str, source: ParseError) -> Self {
        Self {
            product: product.to_owned(),
            stage: ExtractionStage::Parse,
            cause: ExtractionCause::Parse(source),
        }
    }

    /// `true` when the page could not be retrieved; a later run may succeed.
    #[must_use]
    pub fn is_fetch_failure(&self) -> bool {
        self.stage == ExtractionStage::Fetch
    }

    /// `true` when the page was retrieved but its structure was not recognised.
    #[must_use]
    pub fn is_parse_failure(&self) -> bool {
        self.stage == ExtractionStage::Parse
    }
}
