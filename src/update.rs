use crate::types::WriteAgentUpdate;
use tokio::sync::mpsc::UnboundedSender;

/// One-directional channel for agent progress notifications. Implementations
/// must not block and must not fail: a consumer that went away cannot stop
/// the agent.
pub trait UpdateSink: Send + Sync {
    fn notify(&self, update: WriteAgentUpdate);
}

/// Forwards updates into an unbounded channel for UI consumption
pub struct ChannelSink {
    tx: UnboundedSender<WriteAgentUpdate>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<WriteAgentUpdate>) -> Self {
        Self { tx }
    }
}

impl UpdateSink for ChannelSink {
    fn notify(&self, update: WriteAgentUpdate) {
        let _ = self.tx.send(update);
    }
}
