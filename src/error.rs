use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the distro / server bookkeeping. Nothing in this crate recovers from
///  them - they are reported to the caller, which is expected to abort the current goal.
#[derive(Debug, Error)]
pub enum SdkError {
    /// malformed properties file, unparseable user module entry, ambiguous placeholder etc.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// a `${...}` placeholder refers to a key that the external property set does not contain
    #[error("failed to resolve placeholder: no value for '{key}' (referenced by property '{property}')")]
    MissingReference {
        key: String,
        property: String,
    },

    /// an operation would break an invariant of the model, e.g. deleting the platform
    #[error("invalid operation: {0}")]
    InvariantViolation(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SdkError {
    pub fn config(msg: impl Into<String>) -> SdkError {
        SdkError::Configuration(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> SdkError {
        SdkError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SdkError>;
