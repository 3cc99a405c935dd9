//! Runnable Gridlock server with device-token authentication.
//!
//! ```text
//! GRIDLOCK_ADDR=127.0.0.1:8080 cargo run --bin gridlock-server
//! ```
//!
//! Clients authenticate with any non-empty device token; the token is
//! hashed into a stable player ID, so reconnecting with the same token
//! yields the same identity. Swap in a real [`Authenticator`] before
//! exposing this to the internet.

use std::hash::{DefaultHasher, Hash, Hasher};

use gridlock::prelude::*;
use tracing_subscriber::EnvFilter;

/// Development authenticator: accepts any non-empty token.
///
/// The player ID is a hash of the token, so identity is stable across
/// reconnects without any storage. A token like `alice-laptop` shows up
/// as username `alice`; tokens without a dash are used verbatim.
struct DeviceAuth;

impl Authenticator for DeviceAuth {
    async fn authenticate(&self, token: &str) -> Result<Presence, SessionError> {
        if token.is_empty() {
            return Err(SessionError::AuthFailed("token must not be empty".into()));
        }

        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let player_id = PlayerId(hasher.finish());

        let username = match token.split_once('-') {
            Some((name, _)) => name.to_string(),
            None => token.to_string(),
        };

        Ok(Presence::new(player_id, username))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr =
        std::env::var("GRIDLOCK_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let server = GridlockServerBuilder::new()
        .bind(&addr)
        .build(DeviceAuth)
        .await?;

    tracing::info!(addr = %server.local_addr()?, "gridlock server listening");
    server.run().await?;
    Ok(())
}
