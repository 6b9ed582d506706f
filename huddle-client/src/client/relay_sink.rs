use async_trait::async_trait;
use huddle_core::ClientMessage;
use tokio::sync::mpsc;

/// Outbound half of the signaling channel.
#[async_trait]
pub trait RelaySink: Send + Sync {
    async fn send(&self, msg: ClientMessage) -> anyhow::Result<()>;
}

#[async_trait]
impl RelaySink for mpsc::UnboundedSender<ClientMessage> {
    async fn send(&self, msg: ClientMessage) -> anyhow::Result<()> {
        mpsc::UnboundedSender::send(self, msg)
            .map_err(|_| anyhow::anyhow!("signaling channel closed"))
    }
}
