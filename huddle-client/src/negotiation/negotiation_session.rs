use crate::error::SessionError;
use crate::negotiation::PeerConnector;
use huddle_core::{
    ClientMessage, IceCandidate, NegotiationEvent, NegotiationState, PairKey, PeerName,
    SessionDescription, Side,
};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// One offer/answer exchange with a single remote peer.
///
/// The session owns the connector for that peer and the candidates that
/// arrived before the remote description could take them. It never talks to
/// the relay itself: operations that produce a frame return it.
pub struct NegotiationSession<C> {
    pair: PairKey,
    remote: PeerName,
    side: Side,
    state: NegotiationState,
    connector: C,
    pending: VecDeque<IceCandidate>,
    remote_described: bool,
    remote_finished: bool,
    started_at: Instant,
}

impl<C: PeerConnector> NegotiationSession<C> {
    /// The local peer offers.
    pub fn initiator(local: PeerName, remote: PeerName, connector: C) -> Self {
        Self::new(local, remote, Side::Initiator, connector)
    }

    /// The local peer waits for an offer.
    pub fn responder(local: PeerName, remote: PeerName, connector: C) -> Self {
        Self::new(local, remote, Side::Responder, connector)
    }

    fn new(local: PeerName, remote: PeerName, side: Side, connector: C) -> Self {
        Self {
            pair: PairKey::new(local, remote.clone()),
            remote,
            side,
            state: NegotiationState::PendingOffer,
            connector,
            pending: VecDeque::new(),
            remote_described: false,
            remote_finished: false,
            started_at: Instant::now(),
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn pair(&self) -> &PairKey {
        &self.pair
    }

    pub fn remote(&self) -> &PeerName {
        &self.remote
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending.len()
    }

    /// Still short of `CONNECTED` after `timeout`.
    pub fn is_stalled(&self, now: Instant, timeout: Duration) -> bool {
        !self.state.is_connected()
            && !self.state.is_closed()
            && now.saturating_duration_since(self.started_at) >= timeout
    }

    pub async fn start(&mut self) -> Result<ClientMessage, SessionError> {
        let next = self.check(NegotiationEvent::SendOffer)?;
        let offer = self
            .connector
            .create_offer()
            .await
            .map_err(|e| self.connector_failed("create offer", e))?;

        self.state = next;
        debug!(pair = %self.pair, "Offer created");
        Ok(ClientMessage::Offer {
            name: self.remote.clone(),
            offer,
        })
    }

    pub async fn on_offer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<ClientMessage, SessionError> {
        let next = self.check(NegotiationEvent::ReceiveOffer)?;
        self.connector
            .set_remote_description(offer)
            .await
            .map_err(|e| self.connector_failed("apply remote offer", e))?;

        self.remote_described = true;
        let answer = match self.answer().await {
            Ok(answer) => answer,
            Err(e) => {
                self.remote_described = false;
                return Err(e);
            }
        };

        self.state = next;
        info!(pair = %self.pair, "Answered offer");
        Ok(ClientMessage::Answer {
            name: self.remote.clone(),
            answer,
        })
    }

    pub async fn on_answer(&mut self, answer: SessionDescription) -> Result<(), SessionError> {
        let received = self.check(NegotiationEvent::ReceiveAnswer)?;
        let next = received.apply(self.side, NegotiationEvent::RemoteApplied)?;

        self.connector
            .set_remote_description(answer)
            .await
            .map_err(|e| self.connector_failed("apply remote answer", e))?;

        self.remote_described = true;
        if let Err(e) = self.flush().await {
            self.remote_described = false;
            return Err(e);
        }

        self.state = next;
        info!(pair = %self.pair, "Answer applied");
        Ok(())
    }

    /// `None` is the remote side's end-of-candidates marker.
    pub async fn on_candidate(
        &mut self,
        candidate: Option<IceCandidate>,
    ) -> Result<(), SessionError> {
        if self.state.is_closed() {
            debug!(pair = %self.pair, "Candidate for closed negotiation ignored");
            return Err(SessionError::Closed(self.pair.clone()));
        }

        match candidate {
            Some(candidate) if !self.remote_described => {
                self.pending.push_back(candidate);
                debug!(pair = %self.pair, queued = self.pending.len(), "Candidate buffered");
                Ok(())
            }
            Some(candidate) => self
                .connector
                .add_candidate(candidate)
                .await
                .map_err(|e| self.connector_failed("add candidate", e)),
            None if !self.remote_described => {
                self.remote_finished = true;
                Ok(())
            }
            None => self
                .connector
                .end_of_candidates()
                .await
                .map_err(|e| self.connector_failed("end of candidates", e)),
        }
    }

    /// Takes effect at once. The connector is asked to close but its result is
    /// only logged.
    pub async fn close(&mut self) {
        if self.state.is_closed() {
            return;
        }
        self.state = NegotiationState::Closed;
        self.pending.clear();
        self.remote_finished = false;
        debug!(pair = %self.pair, "Negotiation closed");

        if let Err(e) = self.connector.close().await {
            debug!(pair = %self.pair, error = %e, "Connector close failed");
        }
    }

    async fn answer(&mut self) -> Result<SessionDescription, SessionError> {
        self.flush().await?;
        self.connector
            .create_answer()
            .await
            .map_err(|e| self.connector_failed("create answer", e))
    }

    /// Applies buffered candidates front to back. A candidate leaves the queue
    /// only once the connector took it.
    async fn flush(&mut self) -> Result<(), SessionError> {
        let mut flushed = 0;
        while let Some(candidate) = self.pending.front().cloned() {
            self.connector
                .add_candidate(candidate)
                .await
                .map_err(|e| self.connector_failed("add buffered candidate", e))?;
            self.pending.pop_front();
            flushed += 1;
        }
        if flushed > 0 {
            debug!(pair = %self.pair, flushed, "Buffered candidates applied");
        }

        if self.remote_finished {
            self.connector
                .end_of_candidates()
                .await
                .map_err(|e| self.connector_failed("end of candidates", e))?;
            self.remote_finished = false;
        }
        Ok(())
    }

    fn check(&self, event: NegotiationEvent) -> Result<NegotiationState, SessionError> {
        if self.state.is_closed() {
            debug!(pair = %self.pair, ?event, "Event for closed negotiation ignored");
            return Err(SessionError::Closed(self.pair.clone()));
        }
        self.state.apply(self.side, event).map_err(|e| {
            warn!(pair = %self.pair, error = %e, "Out-of-sequence negotiation message");
            SessionError::OutOfSequence(e)
        })
    }

    fn connector_failed(&self, step: &str, e: anyhow::Error) -> SessionError {
        warn!(pair = %self.pair, step, error = %e, "Peer connector failed");
        SessionError::Connector(e)
    }
}
