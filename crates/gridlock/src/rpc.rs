//! Named server procedures reachable through `SocketMessage::Rpc`.
//!
//! Matchmaking lives here rather than in dedicated socket messages:
//! clients call `create_match` or `find_match` by name and get a JSON
//! payload back. Adding a procedure means adding an arm to [`dispatch`];
//! the envelope layer stays untouched.

use std::sync::Arc;

use gridlock_match::LabelQuery;
use gridlock_protocol::{Codec, MatchId, PlayerId, ProtocolError};
use gridlock_session::Authenticator;
use serde::{Deserialize, Serialize};

use crate::server::ServerState;
use crate::GridlockError;

/// Creates a fresh match and returns its ID.
pub const RPC_CREATE_MATCH: &str = "create_match";

/// Returns a joinable match, creating one if none is waiting.
pub const RPC_FIND_MATCH: &str = "find_match";

/// Reply payload for both matchmaking procedures: `{"matchId":N}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchIdPayload {
    match_id: MatchId,
}

/// Routes an RPC by name.
///
/// `Ok(Some(json))` is the reply payload. `Ok(None)` means no such
/// procedure; the caller answers with a 404-style error.
pub(crate) async fn dispatch<A, C>(
    state: &Arc<ServerState<A, C>>,
    player_id: PlayerId,
    id: &str,
    _payload: &str,
) -> Result<Option<String>, GridlockError>
where
    A: Authenticator,
    C: Codec,
{
    match id {
        RPC_CREATE_MATCH => {
            let match_id = state.registry.lock().await.create();
            tracing::debug!(%player_id, %match_id, "rpc create_match");
            Ok(Some(reply(match_id)?))
        }
        RPC_FIND_MATCH => {
            let match_id = find_or_create(state).await;
            tracing::debug!(%player_id, %match_id, "rpc find_match");
            Ok(Some(reply(match_id)?))
        }
        _ => Ok(None),
    }
}

/// Picks the oldest match advertising an open seat, or creates one.
///
/// Matches with nobody seated are skipped: an empty match belongs to a
/// creator who has not joined it yet. The label can lag a join by a
/// moment, so "Match is full" on the follow-up join remains possible;
/// clients recover by calling `find_match` again.
async fn find_or_create<A, C>(state: &Arc<ServerState<A, C>>) -> MatchId
where
    A: Authenticator,
    C: Codec,
{
    let mut registry = state.registry.lock().await;
    let open = registry.list(&LabelQuery::open_at_least(1), 1, 2).await;
    match open.first() {
        Some(info) => info.match_id,
        None => registry.create(),
    }
}

fn reply(match_id: MatchId) -> Result<String, GridlockError> {
    let payload =
        serde_json::to_string(&MatchIdPayload { match_id }).map_err(ProtocolError::Encode)?;
    Ok(payload)
}
