//! Error types for patchplay.

use serde::Serialize;
use thiserror::Error;

use crate::format::SampleFormat;

/// Result type alias using patchplay's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for patchplay.
#[derive(Error, Debug)]
pub enum Error {
    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] HttpError),

    #[error("Network error: {0}")]
    Network(String),

    // Engine errors
    #[error("Song is not loaded")]
    SongNotReady,

    #[error("Virtual filesystem error: {0}")]
    Fs(#[from] FsError),

    // Render errors
    #[error("Output buffer does not match song format {expected}")]
    FormatMismatch { expected: SampleFormat },

    #[error("Audio output error: {0}")]
    AudioOutput(String),
}

/// HTTP-specific errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors reported by an engine's virtual filesystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} is not a directory")]
    NotADirectory(String),

    #[error("Invalid path: {0:?}")]
    InvalidPath(String),
}

/// The operation an `error` event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorAction {
    /// The engine's init entry point returned a nonzero status.
    Init,
    /// The configuration file could not be downloaded.
    ConfigDownload,
    /// A patch file could not be downloaded.
    PatchDownload,
    /// The song bytes could not be downloaded.
    MidiDownload,
    /// The engine rejected the song bytes.
    MidiLoad,
}

/// Payload of an `error` event.
///
/// Serializes to the same shape hosts receive from the event surface:
/// `{"action": "patchDownload", "code": 404, "name": "instr/1.pat"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub action: ErrorAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ErrorInfo {
    pub const fn new(action: ErrorAction) -> Self {
        Self {
            action,
            code: None,
            name: None,
        }
    }

    pub const fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Http(HttpError::Timeout);
        assert_eq!(err.to_string(), "HTTP request failed: Request timeout");

        let err = Error::FormatMismatch {
            expected: SampleFormat::S16Msb,
        };
        assert_eq!(err.to_string(), "Output buffer does not match song format s16msb");
    }

    #[test]
    fn test_error_info_json() {
        let info = ErrorInfo::new(ErrorAction::PatchDownload)
            .with_code(404)
            .with_name("instr/1.pat");
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(
            json,
            r#"{"action":"patchDownload","code":404,"name":"instr/1.pat"}"#
        );

        let json = serde_json::to_string(&ErrorInfo::new(ErrorAction::MidiLoad)).unwrap();
        assert_eq!(json, r#"{"action":"midiLoad"}"#);
    }
}
