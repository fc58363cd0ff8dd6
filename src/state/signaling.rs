use crate::protocol::SignalKind;
use crate::state::AppState;

impl AppState {
    /// Forward a WebRTC signaling payload to `target`, tagged with the sender's session id.
    ///
    /// The payload is opaque and the target is not checked against the sender;
    /// frames for unknown sessions are dropped.
    pub async fn relay_signal(
        &self,
        kind: SignalKind,
        target: &str,
        payload: serde_json::Value,
        sender: &str,
    ) -> bool {
        let delivered = self
            .registry
            .read()
            .await
            .deliver(target, kind.into_message(payload, sender.to_string()));

        if !delivered {
            tracing::debug!(?kind, target, sender, "Dropped signal for unknown session");
        }
        delivered
    }
}
