use std::path::PathBuf;
use thiserror::Error;

/// The archive could not be opened or unpacked. No repository context is
/// produced when this is returned.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a valid zip archive: {0}")]
    Invalid(String),

    #[error("I/O error while extracting archive: {0}")]
    Io(#[from] std::io::Error),
}

/// Something the user must supply before an action can start.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MissingInputError {
    #[error("Please enter your Gemini API key.")]
    ApiKey,

    #[error("Please upload a valid ZIP file.")]
    Archive,

    #[error("Load a repository before asking questions.")]
    RepositoryNotLoaded,

    #[error("Please type a question.")]
    EmptyQuestion,
}

/// A single source file could not be read. Absorbed by the collector.
#[derive(Error, Debug)]
#[error("failed to read {}: {source}", path.display())]
pub struct FileReadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// The generative model call failed; the current turn is abandoned.
#[derive(Error, Debug)]
pub enum ModelRequestError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed model response: {0}")]
    Decode(String),

    #[error("model client has no API key configured")]
    NotConfigured,

    #[error("response cancelled")]
    Cancelled,
}

/// A screenshot could not be turned into a prompt attachment.
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("failed to read image {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported image format for {name}: only PNG and JPEG are accepted")]
    UnsupportedFormat { name: String },

    #[error("failed to decode image {name}: {reason}")]
    Decode { name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum RepoMindError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    MissingInput(#[from] MissingInputError),

    #[error(transparent)]
    ModelRequest(#[from] ModelRequestError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}
