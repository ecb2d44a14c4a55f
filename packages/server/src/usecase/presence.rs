//! Presence frames (peer-joined / peer-left) pushed to the opposite role.

use serde::Serialize;

use crate::domain::ConnectionHandle;

/// Push a presence frame to every peer without waiting for queue space.
///
/// Presence is best-effort: a full or closed queue is logged and skipped.
pub(crate) fn announce<T: Serialize>(peers: &[ConnectionHandle], frame: &T) {
    if peers.is_empty() {
        return;
    }
    let json = match serde_json::to_string(frame) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize presence frame: {}", e);
            return;
        }
    };
    for peer in peers {
        if let Err(e) = peer.outbound().try_send(json.clone()) {
            tracing::warn!(
                connection_id = %peer.id(),
                "Failed to send presence frame: {}",
                e
            );
        }
    }
}
