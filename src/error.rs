//! Error types for touchfish operations.
//!
//! Each component has its own error enum so callers can match on the
//! failure class they care about; [`Error`] wraps all of them for code
//! that crosses component boundaries.

use thiserror::Error;

/// Failures while turning an input file into normalized text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestionError {
    #[error("document contains no readable text")]
    EmptyContent,

    #[error("document is not valid UTF-8 text")]
    EncodingError,

    #[error("archive error: {0}")]
    ArchiveError(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("input is {size} bytes, limit is {limit} bytes")]
    OversizeInput { size: u64, limit: u64 },
}

impl IngestionError {
    /// Stable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestionError::EmptyContent => "EmptyContent",
            IngestionError::EncodingError => "EncodingError",
            IngestionError::ArchiveError(_) => "ArchiveError",
            IngestionError::UnsupportedFormat(_) => "UnsupportedFormat",
            IngestionError::OversizeInput { .. } => "OversizeInput",
        }
    }

    /// The single message shown to the user for this failure class.
    pub fn user_message(&self) -> &'static str {
        match self {
            IngestionError::EmptyContent => {
                "The file has no readable content, please choose a file with text in it"
            }
            IngestionError::EncodingError => {
                "The file encoding is not supported, please use a UTF-8 encoded file"
            }
            IngestionError::ArchiveError(_) => "The file may be damaged, please choose it again",
            IngestionError::UnsupportedFormat(_) => "Only .txt, .epub and .pdf files are supported",
            IngestionError::OversizeInput { .. } => {
                "The file is too large, please choose a file smaller than 100MB"
            }
        }
    }
}

/// Failures while delivering a command to the page context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommunicationError {
    #[error("no active tab")]
    NoActiveTab,

    #[error("no receiver in the page, reload the page and try again")]
    NoReceiver,

    #[error("could not inject the page agent: {0}")]
    InjectionFailed(String),

    #[error("page type is not supported: {0}")]
    PageNotSupported(String),

    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("the page rejected the command: {0}")]
    Rejected(String),
}

impl CommunicationError {
    pub fn kind(&self) -> &'static str {
        match self {
            CommunicationError::NoActiveTab => "NoActiveTab",
            CommunicationError::NoReceiver => "NoReceiver",
            CommunicationError::InjectionFailed(_) => "InjectionFailed",
            CommunicationError::PageNotSupported(_) => "PageNotSupported",
            CommunicationError::UnexpectedReply(_) => "UnexpectedReply",
            CommunicationError::Rejected(_) => "Rejected",
        }
    }

    /// Retrying cannot fix this failure.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CommunicationError::PageNotSupported(_)
                | CommunicationError::NoActiveTab
                | CommunicationError::Rejected(_)
        )
    }
}

/// Failures of the library store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("stored value is corrupt: {0}")]
    Corrupt(String),
}

impl StorageError {
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::NotFound(_) => "NotFound",
            StorageError::Backend(_) => "Backend",
            StorageError::Corrupt(_) => "Corrupt",
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Corrupt(err.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// Any touchfish failure.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    Communication(#[from] CommunicationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Ingestion(e) => e.kind(),
            Error::Communication(e) => e.kind(),
            Error::Storage(e) => e.kind(),
            Error::Io(_) => "Io",
            Error::Config(_) => "Config",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
