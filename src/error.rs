//! Error taxonomy shared by every layer of the framework.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-contract caller input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid URI {component}: {reason}")]
    InvalidUriComponent {
        component: &'static str,
        reason: String,
    },

    #[error("unable to parse URI: \"{0}\"")]
    UriSyntax(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no route found for {method} {path}")]
    NoRouteFound { method: String, path: String },

    /// The chain was exhausted without any middleware answering.
    #[error("no HTTP response was produced by middlewares")]
    NoResponseProduced,

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("middleware panicked: {0}")]
    MiddlewarePanicked(String),

    /// Application handler failures.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn uri_component(component: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidUriComponent {
            component,
            reason: reason.into(),
        }
    }

    /// HTTP status code the transport should answer with when this error
    /// escapes the pipeline.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NoRouteFound { .. } => 404,
            _ => 500,
        }
    }
}

/// Upload failure kinds, numbered like the client upload status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("the uploaded file exceeds the server upload size limit")]
    IniSizeExceeded,
    #[error("the uploaded file exceeds the size limit specified in the form")]
    FormSizeExceeded,
    #[error("the uploaded file was only partially uploaded")]
    Partial,
    #[error("no file was uploaded")]
    Missing,
    #[error("missing a temporary folder")]
    NoTempDir,
    #[error("failed to write file to disk")]
    WriteFailed,
    #[error("an extension stopped the file upload")]
    ExtensionStopped,
    #[error("uploaded file has already been moved")]
    AlreadyMoved,
    #[error("unknown file upload error")]
    Unexpected,
}

impl UploadError {
    /// Maps a non-zero upload status code to its error kind.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => UploadError::IniSizeExceeded,
            2 => UploadError::FormSizeExceeded,
            3 => UploadError::Partial,
            4 => UploadError::Missing,
            6 => UploadError::NoTempDir,
            7 => UploadError::WriteFailed,
            8 => UploadError::ExtensionStopped,
            _ => UploadError::Unexpected,
        }
    }
}
