//! Error kinds reported by `ytplay`.
//!
//! Most code propagates [`eyre::Report`]s with context attached along the way. The variants here
//! sit at the root of such a report so that the CLI can tell what kind of failure occurred (and
//! pick an exit status) without parsing messages.

use http::StatusCode;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The client secret file (or the configuration directory) is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The OAuth exchange or refresh failed, or the cached credentials are unusable.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The YouTube API answered with a non-2xx status.
    #[error("YouTube API request failed with status {status}: {message}")]
    RemoteApi { status: StatusCode, message: String },

    /// The command line was well-formed but semantically invalid.
    #[error("invalid arguments: {0}")]
    Validation(String),

    /// A local file could not be read or written.
    #[error("could not access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Finds the first [`Error`] anywhere in the cause chain of `report`.
    pub fn find_in(report: &eyre::Report) -> Option<&Error> {
        report.chain().find_map(|cause| cause.downcast_ref::<Error>())
    }

    /// The process exit status to use when this error ends the program.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Validation(_) => 2,
            _ => 1,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Extracts the human-readable message from a YouTube API error body.
///
/// Google APIs answer with `{"error": {"code": 404, "message": "..."}}`. Anything that doesn't
/// look like that is passed through verbatim.
pub(crate) fn remote_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct Envelope {
        error: Detail,
    }
    #[derive(serde::Deserialize)]
    struct Detail {
        message: String,
    }

    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "no error details provided".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
