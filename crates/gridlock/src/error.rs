//! Unified error type for the assembled Gridlock server.

use gridlock_match::EngineError;
use gridlock_protocol::ProtocolError;
use gridlock_session::SessionError;
use gridlock_transport::TransportError;

/// Top-level error that wraps all layer-specific errors.
///
/// When using the `gridlock` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GridlockError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth failure, duplicate connection).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A match-engine error (not found, rejected, not in a match).
    #[error(transparent)]
    Engine(#[from] EngineError),
}
