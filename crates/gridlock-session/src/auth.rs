//! Authentication hook for validating player identity.
//!
//! Gridlock doesn't implement authentication itself — that's your job
//! (or your auth provider's: Firebase, Auth0, custom JWT, etc.).
//!
//! Instead, Gridlock defines the [`Authenticator`] trait: a single async
//! method that takes a token string and returns a [`Presence`] or an
//! error. You implement this trait with your auth logic, and the server
//! calls it during the handshake.
//!
//! # Why a trait?
//!
//! A trait is like an interface in other languages — it defines WHAT
//! something can do without specifying HOW. This lets us:
//! - Use JWT validation in production
//! - Use a simple device-token authenticator in development
//! - Use a mock authenticator in tests
//!
//! All without changing any server code.

use gridlock_protocol::Presence;

use crate::SessionError;

/// Validates a client's auth token and returns their identity.
///
/// # Trait bounds
///
/// - `Send + Sync` → the authenticator can be shared across async tasks
///   (Tokio may call it from different threads simultaneously).
/// - `'static` → it doesn't borrow temporary data. Required because the
///   authenticator lives as long as the server.
///
/// # Example
///
/// ```rust
/// use gridlock_session::{Authenticator, SessionError};
/// use gridlock_protocol::{PlayerId, Presence};
///
/// /// Accepts any numeric token and uses it as the player ID.
/// /// Only for development — never use this in production!
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn authenticate(
///         &self,
///         token: &str,
///     ) -> Result<Presence, SessionError> {
///         let id: u64 = token.parse().map_err(|_| {
///             SessionError::AuthFailed("token must be a number".into())
///         })?;
///         Ok(Presence::new(PlayerId(id), format!("player-{id}")))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates the given token and returns the player's presence.
    ///
    /// Called during the handshake when a client sends a
    /// [`SocketMessage::Handshake`](gridlock_protocol::SocketMessage::Handshake)
    /// with a token.
    ///
    /// # Returns
    /// - `Ok(Presence)` — authentication succeeded, here's who they are
    /// - `Err(SessionError::AuthFailed)` — token is invalid/expired
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Presence, SessionError>> + Send;
}
