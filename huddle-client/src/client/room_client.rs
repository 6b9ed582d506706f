use crate::client::{ClientEvent, RelaySink};
use crate::config::ClientConfig;
use crate::negotiation::{ConnectorFactory, NegotiationSession};
use crate::roster::PeerRosterView;
use crate::transport::TransportEvent;
use huddle_core::{
    ClientMessage, IceCandidate, MembershipEvent, MembershipKind, MembershipSnapshot,
    NegotiationState, Peer, PeerName, Role, RoomCode, RoomIntent, ServerMessage,
    SessionDescription,
};
use std::collections::HashMap;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Drives one client through registration, admission and a negotiation with
/// every other member of its room.
///
/// The joiner offers to everyone already present; existing members answer.
/// Closed sessions stay in the map until the same name joins again or the
/// client is admitted somewhere else.
pub struct RoomClient<F: ConnectorFactory, S> {
    name: PeerName,
    intent: RoomIntent,
    target: Option<RoomCode>,
    config: ClientConfig,
    factory: F,
    sink: S,
    room: Option<RoomCode>,
    roster: PeerRosterView,
    sessions: HashMap<PeerName, NegotiationSession<F::Connector>>,
}

impl<F: ConnectorFactory, S: RelaySink> RoomClient<F, S> {
    pub fn creator(name: PeerName, config: ClientConfig, factory: F, sink: S) -> Self {
        Self::new(name, RoomIntent::Creator, None, config, factory, sink)
    }

    pub fn participant(
        name: PeerName,
        room: RoomCode,
        config: ClientConfig,
        factory: F,
        sink: S,
    ) -> Self {
        Self::new(name, RoomIntent::Participant, Some(room), config, factory, sink)
    }

    fn new(
        name: PeerName,
        intent: RoomIntent,
        target: Option<RoomCode>,
        config: ClientConfig,
        factory: F,
        sink: S,
    ) -> Self {
        Self {
            name,
            intent,
            target,
            config,
            factory,
            sink,
            room: None,
            roster: PeerRosterView::new(),
            sessions: HashMap::new(),
        }
    }

    pub fn name(&self) -> &PeerName {
        &self.name
    }

    pub fn room(&self) -> Option<&RoomCode> {
        self.room.as_ref()
    }

    pub fn roster(&self) -> &PeerRosterView {
        &self.roster
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session_state(&self, remote: &PeerName) -> Option<NegotiationState> {
        self.sessions.get(remote).map(|s| s.state())
    }

    pub fn session(&self, remote: &PeerName) -> Option<&NegotiationSession<F::Connector>> {
        self.sessions.get(remote)
    }

    /// Sends `initiation`. Admission follows on its own once it is accepted.
    pub async fn connect(&self) -> anyhow::Result<()> {
        self.sink
            .send(ClientMessage::Initiation {
                name: self.name.clone(),
            })
            .await
    }

    pub async fn leave(&self) -> anyhow::Result<()> {
        self.sink.send(ClientMessage::LeaveRoom).await
    }

    /// Feeds one relay frame through the client. Errors are signaling-channel
    /// failures only; negotiation trouble is logged and absorbed.
    pub async fn handle(&mut self, msg: ServerMessage) -> anyhow::Result<Option<ClientEvent>> {
        match msg {
            ServerMessage::Initiation { success: true, .. } => {
                self.sink
                    .send(ClientMessage::RoomInitiation {
                        room_id: self.target.clone(),
                        name: self.name.clone(),
                        role: self.intent,
                    })
                    .await?;
                Ok(Some(ClientEvent::Registered))
            }
            ServerMessage::Initiation { message, .. } => {
                let reason = message.unwrap_or_default();
                warn!(peer = %self.name, reason = %reason, "Registration refused");
                Ok(Some(ClientEvent::RegistrationFailed(reason)))
            }
            ServerMessage::RoomInitiation {
                success: true,
                room_id: Some(room),
                participants,
                seq,
                ..
            } => self.on_admitted(room, participants, seq).await.map(Some),
            ServerMessage::RoomInitiation { message, .. } => {
                let reason = message.unwrap_or_default();
                info!(peer = %self.name, reason = %reason, "Admission rejected");
                Ok(Some(ClientEvent::AdmissionRejected(reason)))
            }
            ServerMessage::Offer { name, offer } => self.on_offer(name, offer).await,
            ServerMessage::Answer { name, answer } => Ok(self.on_answer(name, answer).await),
            ServerMessage::Candidate { name, candidate } => {
                self.on_remote_candidate(name, candidate).await;
                Ok(None)
            }
            ServerMessage::PeerJoinedRoom { name, role, seq } => {
                Ok(self.on_peer_joined(name, role, seq).await)
            }
            ServerMessage::PeerLeavingRoom {
                name,
                room_destroy: false,
                seq,
            } => Ok(self.on_peer_left(name, seq).await),
            ServerMessage::PeerLeavingRoom {
                name,
                room_destroy: true,
                seq,
            } => Ok(self.on_room_destroyed(name, seq).await),
            ServerMessage::LeaveConfirmed => {
                self.teardown().await;
                info!(peer = %self.name, "Left room");
                Ok(Some(ClientEvent::LeftRoom))
            }
            ServerMessage::Error { message, .. } => {
                warn!(peer = %self.name, message = %message, "Relay reported an error");
                Ok(Some(ClientEvent::ServerError(message)))
            }
        }
    }

    pub async fn handle_transport(
        &mut self,
        event: TransportEvent,
    ) -> anyhow::Result<Option<ClientEvent>> {
        match event {
            TransportEvent::CandidateGenerated(remote, candidate) => {
                self.on_local_candidate(remote, candidate).await?;
                Ok(None)
            }
            TransportEvent::Connected(remote) => {
                info!(peer = %self.name, remote = %remote, "Transport connected");
                Ok(Some(ClientEvent::TransportConnected(remote)))
            }
            TransportEvent::Disconnected(remote) => Ok(self.on_transport_closed(remote).await),
        }
    }

    /// Trickles a local candidate to `remote` while its session is live.
    pub async fn on_local_candidate(
        &self,
        remote: PeerName,
        candidate: Option<IceCandidate>,
    ) -> anyhow::Result<()> {
        let live = self.room.is_some()
            && self
                .sessions
                .get(&remote)
                .is_some_and(|s| !s.state().is_closed());
        if !live {
            debug!(remote = %remote, "Local candidate for closed session dropped");
            return Ok(());
        }

        self.sink
            .send(ClientMessage::Candidate {
                name: remote,
                candidate,
            })
            .await
    }

    pub async fn on_transport_closed(&mut self, remote: PeerName) -> Option<ClientEvent> {
        let session = self.sessions.get_mut(&remote)?;
        if session.state().is_closed() {
            return None;
        }
        session.close().await;
        info!(peer = %self.name, remote = %remote, "Transport lost, negotiation closed");
        Some(ClientEvent::TransportLost(remote))
    }

    /// Closes every session that has not connected within the negotiation
    /// timeout and returns the peers they were with. Nothing is retried here.
    pub async fn sweep_stalled(&mut self, now: Instant) -> Vec<PeerName> {
        let timeout = self.config.negotiation_timeout;
        let stalled: Vec<PeerName> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.is_stalled(now, timeout))
            .map(|(remote, _)| remote.clone())
            .collect();

        for remote in &stalled {
            if let Some(session) = self.sessions.get_mut(remote) {
                warn!(pair = %session.pair(), state = ?session.state(), "Negotiation stalled, closing");
                session.close().await;
            }
        }
        stalled
    }

    async fn on_admitted(
        &mut self,
        room: RoomCode,
        participants: Vec<PeerName>,
        seq: u64,
    ) -> anyhow::Result<ClientEvent> {
        self.close_sessions().await;
        self.sessions.clear();

        // join order, owner first
        let members = participants
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let role = if i == 0 { Role::Owner } else { Role::Member };
                Peer::new(name.clone(), role)
            })
            .collect();
        self.roster.apply_snapshot(&MembershipSnapshot {
            room: room.clone(),
            seq,
            members,
        });
        self.room = Some(room.clone());
        info!(peer = %self.name, room = %room, members = participants.len(), "Admitted");

        let remotes: Vec<PeerName> = participants
            .iter()
            .filter(|name| *name != &self.name)
            .cloned()
            .collect();
        for remote in remotes {
            self.offer_to(remote).await?;
        }

        Ok(ClientEvent::Admitted { room, participants })
    }

    async fn offer_to(&mut self, remote: PeerName) -> anyhow::Result<()> {
        let connector = match self.factory.create(&remote).await {
            Ok(connector) => connector,
            Err(e) => {
                warn!(remote = %remote, error = %e, "Could not create peer connector");
                return Ok(());
            }
        };

        let mut session = NegotiationSession::initiator(self.name.clone(), remote.clone(), connector);
        if let Ok(offer) = session.start().await {
            self.sink.send(offer).await?;
        }
        self.sessions.insert(remote, session);
        Ok(())
    }

    async fn responder_for(&self, remote: &PeerName) -> Option<NegotiationSession<F::Connector>> {
        match self.factory.create(remote).await {
            Ok(connector) => Some(NegotiationSession::responder(
                self.name.clone(),
                remote.clone(),
                connector,
            )),
            Err(e) => {
                warn!(remote = %remote, error = %e, "Could not create peer connector");
                None
            }
        }
    }

    async fn on_peer_joined(&mut self, name: PeerName, role: Role, seq: u64) -> Option<ClientEvent> {
        let event = MembershipEvent {
            room: self.room.clone()?,
            seq,
            name: name.clone(),
            kind: MembershipKind::Joined { role },
        };
        if !self.roster.apply(&event) || name == self.name {
            return None;
        }

        let live = self
            .sessions
            .get(&name)
            .is_some_and(|s| !s.state().is_closed());
        if live {
            // its offer overtook the notice
            debug!(peer = %self.name, joined = %name, "Session already open");
        } else if let Some(session) = self.responder_for(&name).await {
            self.sessions.insert(name.clone(), session);
        }
        info!(peer = %self.name, joined = %name, "Peer joined");
        Some(ClientEvent::PeerJoined(name))
    }

    async fn on_peer_left(&mut self, name: PeerName, seq: u64) -> Option<ClientEvent> {
        let event = MembershipEvent {
            room: self.room.clone()?,
            seq,
            name: name.clone(),
            kind: MembershipKind::Left,
        };
        if !self.roster.apply(&event) {
            return None;
        }

        if let Some(session) = self.sessions.get_mut(&name) {
            session.close().await;
        }
        info!(peer = %self.name, left = %name, "Peer left");
        Some(ClientEvent::PeerLeft(name))
    }

    async fn on_room_destroyed(&mut self, owner: PeerName, seq: u64) -> Option<ClientEvent> {
        let event = MembershipEvent {
            room: self.room.clone()?,
            seq,
            name: owner.clone(),
            kind: MembershipKind::RoomDestroyed,
        };
        self.roster.apply(&event);
        self.teardown().await;
        info!(peer = %self.name, owner = %owner, "Room destroyed by its owner");
        Some(ClientEvent::RoomDestroyed { owner })
    }

    async fn on_offer(
        &mut self,
        from: PeerName,
        offer: SessionDescription,
    ) -> anyhow::Result<Option<ClientEvent>> {
        if self.room.is_none() {
            debug!(from = %from, "Offer outside a room dropped");
            return Ok(None);
        }

        // the peerJoinedRoom notice may have been missed, or the peer re-initiated
        let live = self
            .sessions
            .get(&from)
            .is_some_and(|s| !s.state().is_closed());
        if !live {
            let Some(session) = self.responder_for(&from).await else {
                return Ok(None);
            };
            self.sessions.insert(from.clone(), session);
        }
        let Some(session) = self.sessions.get_mut(&from) else {
            return Ok(None);
        };

        match session.on_offer(offer).await {
            Ok(answer) => {
                self.sink.send(answer).await?;
                Ok(Some(ClientEvent::NegotiationComplete(from)))
            }
            Err(e) => {
                debug!(from = %from, error = %e, "Offer not answered");
                Ok(None)
            }
        }
    }

    async fn on_answer(&mut self, from: PeerName, answer: SessionDescription) -> Option<ClientEvent> {
        let Some(session) = self.sessions.get_mut(&from) else {
            debug!(from = %from, "Answer without a session dropped");
            return None;
        };
        session.on_answer(answer).await.ok()?;
        Some(ClientEvent::NegotiationComplete(from))
    }

    async fn on_remote_candidate(&mut self, from: PeerName, candidate: Option<IceCandidate>) {
        let Some(session) = self.sessions.get_mut(&from) else {
            debug!(from = %from, "Candidate without a session dropped");
            return;
        };
        if let Err(e) = session.on_candidate(candidate).await {
            debug!(from = %from, error = %e, "Candidate not applied");
        }
    }

    async fn teardown(&mut self) {
        self.close_sessions().await;
        self.room = None;
        self.roster.clear();
    }

    async fn close_sessions(&mut self) {
        for session in self.sessions.values_mut() {
            session.close().await;
        }
    }
}
