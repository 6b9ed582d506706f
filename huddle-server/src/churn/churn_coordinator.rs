use crate::churn::{Observed, PairLedger};
use crate::error::AdmissionError;
use crate::room::{LeaveOutcome, RoomRegistry};
use crate::signaling::SignalingRelay;
use huddle_core::{
    ClientMessage, ConnectionId, MembershipSnapshot, PairKey, PeerName, RoomCode, RoomIntent,
    ServerMessage,
};
use tracing::{debug, info, warn};

/// What a departure did to the room it left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChurnReport {
    pub room: RoomCode,
    pub departed: PeerName,
    pub closed_pairs: Vec<PairKey>,
    /// Peers that were told about the departure.
    pub notified: usize,
    pub room_destroyed: bool,
}

/// Entry point for every inbound client message. Ties admission, routing and
/// churn together so that the registry, the relay and the pair ledger agree.
#[derive(Clone)]
pub struct ChurnCoordinator {
    registry: RoomRegistry,
    relay: SignalingRelay,
    ledger: PairLedger,
}

impl ChurnCoordinator {
    pub fn new(registry: RoomRegistry, relay: SignalingRelay) -> Self {
        Self {
            registry,
            relay,
            ledger: PairLedger::new(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn relay(&self) -> &SignalingRelay {
        &self.relay
    }

    pub fn ledger(&self) -> &PairLedger {
        &self.ledger
    }

    pub async fn handle(&self, conn: ConnectionId, msg: ClientMessage) {
        debug!(conn = %conn, kind = msg.kind(), "Inbound message");

        match msg {
            ClientMessage::Initiation { name } => self.on_initiation(conn, name),
            ClientMessage::RoomInitiation {
                room_id,
                name,
                role,
            } => self.on_room_initiation(conn, room_id, name, role).await,
            ClientMessage::Offer { name, offer } => {
                self.forward(conn, name, Some(Observed::Offer), |from| {
                    ServerMessage::Offer { name: from, offer }
                })
            }
            ClientMessage::Answer { name, answer } => {
                self.forward(conn, name, Some(Observed::Answer), |from| {
                    ServerMessage::Answer { name: from, answer }
                })
            }
            ClientMessage::Candidate { name, candidate } => {
                self.forward(conn, name, None, |from| ServerMessage::Candidate {
                    name: from,
                    candidate,
                })
            }
            ClientMessage::LeaveRoom => {
                if self.leave(conn, true).await.is_none() {
                    self.reply(conn, ServerMessage::error("not in a room"));
                }
            }
        }
    }

    /// Connection went away without a `leaveRoom`. Same churn as a voluntary
    /// leave, minus the confirmation, then the connection is detached.
    pub async fn disconnect(&self, conn: ConnectionId) -> Option<ChurnReport> {
        let report = self.leave(conn, false).await;
        self.relay.detach(conn);
        report
    }

    pub async fn leave(&self, conn: ConnectionId, voluntary: bool) -> Option<ChurnReport> {
        let room = self.relay.room_of(conn)?;
        let name = self.relay.name_of(conn)?;
        self.relay.unbind_room(conn);

        let outcome = match self.registry.leave_room(&room, &name).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // already evicted by an owner teardown that raced this leave
                debug!(conn = %conn, room = %room, peer = %name, error = %e, "Leave found nothing to do");
                return None;
            }
        };

        let report = match outcome {
            LeaveOutcome::MemberLeft { notified, .. } => {
                let closed_pairs = self.ledger.close_peer(&room, &name);
                ChurnReport {
                    room,
                    departed: name,
                    closed_pairs,
                    notified,
                    room_destroyed: false,
                }
            }
            LeaveOutcome::RoomDestroyed {
                evicted, notified, ..
            } => {
                let closed_pairs = self.ledger.close_room(&room);
                for peer in &evicted {
                    let Some(target) = self.relay.connection_for(&room, &peer.name) else {
                        debug!(room = %room, peer = %peer.name, "Evicted peer has no route");
                        continue;
                    };
                    self.relay.unbind_room(target);
                }

                self.registry.close_room(&room).await;
                ChurnReport {
                    room,
                    departed: name,
                    closed_pairs,
                    notified,
                    room_destroyed: true,
                }
            }
        };

        if voluntary {
            self.reply(conn, ServerMessage::LeaveConfirmed);
        }

        info!(
            room = %report.room,
            peer = %report.departed,
            voluntary,
            destroyed = report.room_destroyed,
            closed_pairs = report.closed_pairs.len(),
            notified = report.notified,
            "Peer left room"
        );
        Some(report)
    }

    fn on_initiation(&self, conn: ConnectionId, name: PeerName) {
        let reply = match self.relay.register_name(conn, name.clone()) {
            Ok(()) => {
                info!(conn = %conn, peer = %name, "Connection registered");
                ServerMessage::Initiation {
                    success: true,
                    message: None,
                }
            }
            Err(e) => {
                warn!(conn = %conn, peer = %name, error = %e, "Registration refused");
                ServerMessage::Initiation {
                    success: false,
                    message: Some(e.to_string()),
                }
            }
        };
        self.reply(conn, reply);
    }

    async fn on_room_initiation(
        &self,
        conn: ConnectionId,
        room_id: Option<RoomCode>,
        name: PeerName,
        intent: RoomIntent,
    ) {
        let requested = match intent {
            RoomIntent::Creator => None,
            RoomIntent::Participant => room_id,
        };

        // a successful admission is answered by the room itself
        if let Err(e) = self.admit(conn, requested.clone(), name.clone(), intent).await {
            info!(conn = %conn, peer = %name, error = %e, "Admission rejected");
            self.reply(conn, ServerMessage::room_rejected(requested, e.to_string()));
        }
    }

    async fn admit(
        &self,
        conn: ConnectionId,
        room_id: Option<RoomCode>,
        name: PeerName,
        intent: RoomIntent,
    ) -> Result<MembershipSnapshot, AdmissionError> {
        if let Some(current) = self.relay.room_of(conn) {
            return Err(AdmissionError::AlreadyInRoom(current));
        }
        self.relay.register_name(conn, name.clone())?;

        let snapshot = match intent {
            RoomIntent::Creator => self.registry.create_room(name.clone(), conn).await?,
            RoomIntent::Participant => {
                let code = room_id.ok_or(AdmissionError::MissingRoom)?;
                self.registry.join_room(&code, name.clone(), conn).await?
            }
        };
        let room = snapshot.room.clone();

        if let Err(e) = self.relay.bind_room(conn, &room) {
            warn!(conn = %conn, room = %room, error = %e, "Connection vanished during admission");
            self.withdraw(&room, &name).await;
            return Err(AdmissionError::NotRegistered);
        }

        let existing: Vec<PeerName> = snapshot
            .names()
            .into_iter()
            .filter(|member| member != &name)
            .collect();
        let formed = self.ledger.form_pairs(&room, &name, &existing);

        // An owner teardown that overtook this admission may have cleaned up
        // before the bind and the pairs above. The peer already holds the
        // destroy notice, so only the local state is undone.
        if !self.registry.is_open(&room).await {
            self.relay.unbind_room(conn);
            self.ledger.close_peer(&room, &name);
            info!(conn = %conn, room = %room, peer = %name, "Room closed during admission");
            return Ok(snapshot);
        }

        info!(
            conn = %conn,
            room = %room,
            peer = %name,
            members = snapshot.len(),
            pairs = formed,
            "Peer admitted"
        );
        Ok(snapshot)
    }

    /// Undoes a registry admission whose connection could not be bound.
    async fn withdraw(&self, room: &RoomCode, name: &PeerName) {
        match self.registry.leave_room(room, name).await {
            Ok(LeaveOutcome::RoomDestroyed { .. }) => {
                self.ledger.close_room(room);
                self.registry.close_room(room).await;
            }
            Ok(LeaveOutcome::MemberLeft { .. }) => {}
            Err(e) => debug!(room = %room, peer = %name, error = %e, "Nothing to withdraw"),
        }
    }

    fn forward(
        &self,
        conn: ConnectionId,
        to: PeerName,
        observed: Option<Observed>,
        build: impl FnOnce(PeerName) -> ServerMessage,
    ) {
        let Some(from) = self.relay.name_of(conn) else {
            self.reply(conn, ServerMessage::error("send an initiation first"));
            return;
        };

        match self.relay.send(conn, &to, build(from.clone())) {
            Ok(()) => {
                debug!(conn = %conn, from = %from, to = %to, "Relayed");
                if let (Some(observed), Some(room)) = (observed, self.relay.room_of(conn)) {
                    self.ledger.observe(&room, &from, &to, observed);
                }
            }
            Err(e) => warn!(conn = %conn, from = %from, to = %to, error = %e, "Dropped relayed message"),
        }
    }

    fn reply(&self, conn: ConnectionId, msg: ServerMessage) {
        if let Err(e) = self.relay.send_to(conn, msg) {
            warn!(conn = %conn, error = %e, "Reply dropped");
        }
    }
}
