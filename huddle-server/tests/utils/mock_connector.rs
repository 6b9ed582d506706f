use async_trait::async_trait;
use huddle_client::{ConnectorFactory, PeerConnector};
use huddle_core::{IceCandidate, PeerName, SessionDescription};

/// Connector with no transport behind it; offers and answers are placeholders.
pub struct NullConnector {
    local: PeerName,
}

#[async_trait]
impl PeerConnector for NullConnector {
    async fn create_offer(&self) -> anyhow::Result<SessionDescription> {
        Ok(SessionDescription::offer(format!("offer-from-{}", self.local)))
    }

    async fn set_remote_description(&self, _desc: SessionDescription) -> anyhow::Result<()> {
        Ok(())
    }

    async fn create_answer(&self) -> anyhow::Result<SessionDescription> {
        Ok(SessionDescription::answer(format!("answer-from-{}", self.local)))
    }

    async fn add_candidate(&self, _candidate: IceCandidate) -> anyhow::Result<()> {
        Ok(())
    }

    async fn end_of_candidates(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct NullConnectorFactory {
    pub local: PeerName,
}

#[async_trait]
impl ConnectorFactory for NullConnectorFactory {
    type Connector = NullConnector;

    async fn create(&self, _remote: &PeerName) -> anyhow::Result<NullConnector> {
        Ok(NullConnector {
            local: self.local.clone(),
        })
    }
}
