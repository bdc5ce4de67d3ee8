//! Stop message sent to every node when a benchmark run ends.

use crate::NetworkMessage;
use sbor::prelude::BasicSbor;

/// Tells leaders and validators that the load run is over.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct StopMessage {
    /// Wall-clock time the run ended, in milliseconds since the Unix epoch.
    pub issued_at_ms: u64,
}

impl StopMessage {
    /// Create a stop message stamped with the current time.
    pub fn now() -> Self {
        let issued_at_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self { issued_at_ms }
    }
}

impl NetworkMessage for StopMessage {
    fn message_type_id() -> &'static str {
        "node.stop"
    }
}
