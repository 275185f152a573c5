use serde::Serialize;
use thiserror::Error;

/// Errors raised by the scan-storage collaborator.
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// The scan directory or file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other filesystem failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            IoError::NotFound(err.to_string())
        } else {
            IoError::Storage(err.to_string())
        }
    }
}

/// Errors raised while decoding a volume file.
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// The payload file referenced by a MetaImage header is missing
    #[error("Raw data file not found: {path}")]
    DataFileNotFound { path: String },

    /// A required header key is absent
    #[error("Missing required header key: {0}")]
    MissingKey(&'static str),

    /// A header value could not be interpreted
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    /// The payload holds fewer bytes than the header promises
    #[error("data too small: got {actual} bytes, expected {expected}")]
    DataTooSmall { expected: usize, actual: usize },

    /// The compressed payload could not be inflated
    #[error("Failed to decompress payload: {0}")]
    Decompress(String),

    /// No decoder recognizes the file
    #[error("Unsupported format: {reason}")]
    UnsupportedFormat { reason: String },

    /// The external decoder failed on a file it claims to support
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Errors surfaced by volume loading and slice rendering.
///
/// `NotFound`, `UnsupportedFormat` and `Validation` carry messages meant for
/// the caller. `Internal` keeps its detail for logging only; see
/// [`VolumeError::public_message`].
#[derive(Debug, Clone, Error)]
pub enum VolumeError {
    /// The scan or its source file does not exist
    #[error("{what} not found")]
    NotFound { what: String },

    /// No decoder recognizes the source file
    #[error("Unsupported format: {reason}")]
    UnsupportedFormat { reason: String },

    /// Corrupt payload, bad header, or invalid request parameters
    #[error("{message}")]
    Validation { message: String },

    /// Unexpected decode or runtime failure
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl VolumeError {
    pub fn not_found(what: impl Into<String>) -> Self {
        VolumeError::NotFound { what: what.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        VolumeError::Validation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        VolumeError::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for the error kind.
    pub const fn error_code(&self) -> &'static str {
        match self {
            VolumeError::NotFound { .. } => "not_found",
            VolumeError::UnsupportedFormat { .. } => "unsupported_format",
            VolumeError::Validation { .. } => "validation_error",
            VolumeError::Internal { .. } => "internal_error",
        }
    }

    /// Message safe to show to a caller.
    pub fn public_message(&self) -> String {
        match self {
            VolumeError::Internal { .. } => "Failed to load CT data".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the error is caused by the request rather than the service.
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, VolumeError::Internal { .. })
    }
}

impl From<FormatError> for VolumeError {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::DataFileNotFound { path } => VolumeError::NotFound {
                what: format!("Raw data file {}", path),
            },
            FormatError::Io(IoError::NotFound(path)) => VolumeError::NotFound { what: path },
            FormatError::MissingKey(_)
            | FormatError::InvalidValue { .. }
            | FormatError::DataTooSmall { .. }
            | FormatError::Decompress(_) => VolumeError::Validation {
                message: err.to_string(),
            },
            FormatError::UnsupportedFormat { reason } => VolumeError::UnsupportedFormat { reason },
            FormatError::Io(IoError::Storage(_)) | FormatError::Decode(_) => {
                VolumeError::Internal {
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<IoError> for VolumeError {
    fn from(err: IoError) -> Self {
        VolumeError::from(FormatError::Io(err))
    }
}

/// Serializable error body handed to the request-handling layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,

    /// Caller-facing message
    pub message: String,
}

impl From<&VolumeError> for ErrorResponse {
    fn from(err: &VolumeError) -> Self {
        Self {
            error: err.error_code().to_string(),
            message: err.public_message(),
        }
    }
}
