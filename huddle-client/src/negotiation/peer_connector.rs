use async_trait::async_trait;
use huddle_core::{IceCandidate, PeerName, SessionDescription};

/// Handle on one peer-to-peer transport, as a negotiation session drives it.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    /// Creates an offer and installs it as the local description.
    async fn create_offer(&self) -> anyhow::Result<SessionDescription>;

    async fn set_remote_description(&self, desc: SessionDescription) -> anyhow::Result<()>;

    /// Creates an answer and installs it as the local description.
    async fn create_answer(&self) -> anyhow::Result<SessionDescription>;

    async fn add_candidate(&self, candidate: IceCandidate) -> anyhow::Result<()>;

    /// The remote side has no more candidates.
    async fn end_of_candidates(&self) -> anyhow::Result<()>;

    async fn close(&self) -> anyhow::Result<()>;
}

/// Makes a fresh connector for each remote peer.
#[async_trait]
pub trait ConnectorFactory: Send + Sync {
    type Connector: PeerConnector;

    async fn create(&self, remote: &PeerName) -> anyhow::Result<Self::Connector>;
}
