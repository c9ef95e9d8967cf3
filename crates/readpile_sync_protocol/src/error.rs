//! Error types for the sync protocol.

use thiserror::Error;

/// Result type for remote service calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Outcome taxonomy for every remote service call.
///
/// Whether a failure is recoverable is decided by matching on these
/// variants, never by inspecting message text. `NotFound` and
/// `DuplicateTitle` are the two conditions the sync coordinators know
/// how to absorb; everything else propagates and aborts the phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The addressed entity does not exist on the service.
    #[error("entity not found on the service")]
    NotFound,

    /// The service rejected a folder create because the title is taken.
    #[error("a folder with that title already exists")]
    DuplicateTitle,

    /// The service answered with an error it did classify.
    #[error("service error {code}: {message}")]
    Service {
        /// Service-reported error code.
        code: u16,
        /// Service-reported error message.
        message: String,
    },

    /// The request never produced a service answer.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },
}

impl RemoteError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a service error.
    pub fn service(code: u16, message: impl Into<String>) -> Self {
        Self::Service {
            code,
            message: message.into(),
        }
    }

    /// Returns true if the sync coordinators can absorb this error
    /// without aborting the running phase.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RemoteError::NotFound | RemoteError::DuplicateTitle)
    }
}

/// Errors produced while constructing protocol values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A fingerprint was constructed with the empty identity.
    #[error("fingerprint requires a non-empty bookmark id")]
    EmptyFingerprintId,

    /// A fingerprint was constructed with a present-but-blank hash.
    #[error("fingerprint hash must not be blank when supplied")]
    BlankFingerprintHash,
}
