use crate::error::AdmissionError;
use crate::room::membership_output::MembershipOutput;
use crate::room::room_command::{LeaveOutcome, RoomCommand};
use huddle_core::{
    ConnectionId, MembershipEvent, MembershipKind, MembershipSnapshot, Peer, PeerName, Role,
    RoomCode, RoomState, ServerMessage,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Owns one room's member list. All mutations arrive through `command_rx`,
/// so a room never sees two of them at once. Replies to joiners and notices to
/// members go out through `output` before the next command is taken.
pub struct Room {
    code: RoomCode,
    state: RoomState,
    owner: PeerName,
    members: Vec<Peer>,
    links: HashMap<PeerName, ConnectionId>,
    capacity: usize,
    seq: u64,
    history: Vec<MembershipEvent>,
    command_rx: mpsc::Receiver<RoomCommand>,
    output: Arc<dyn MembershipOutput>,
}

impl Room {
    pub fn new(
        code: RoomCode,
        owner: PeerName,
        owner_conn: ConnectionId,
        capacity: usize,
        command_rx: mpsc::Receiver<RoomCommand>,
        output: Arc<dyn MembershipOutput>,
    ) -> Self {
        let mut room = Self {
            code,
            state: RoomState::Open,
            owner: owner.clone(),
            members: Vec::new(),
            links: HashMap::new(),
            capacity,
            seq: 0,
            history: Vec::new(),
            command_rx,
            output,
        };
        room.members.push(Peer::new(owner.clone(), Role::Owner));
        room.links.insert(owner.clone(), owner_conn);
        room.record(owner, MembershipKind::Joined { role: Role::Owner });
        room
    }

    pub async fn run(mut self) {
        info!(room = %self.code, owner = %self.owner, "Room event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
            if self.state == RoomState::Closed {
                break;
            }
        }

        info!(room = %self.code, "Room event loop finished");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { name, conn, reply } => {
                let _ = reply.send(self.join(name, conn));
            }
            RoomCommand::Leave { name, reply } => {
                let _ = reply.send(self.leave(name));
            }
            RoomCommand::Close { reply } => {
                self.close();
                let _ = reply.send(());
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send((self.state, self.snapshot()));
            }
            RoomCommand::History { reply } => {
                let _ = reply.send(self.history.clone());
            }
        }
    }

    /// Sends the owner its admission reply. Call before `run` so it precedes
    /// every notice.
    pub fn greet_owner(&self) {
        self.admit_reply(&self.owner);
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn snapshot(&self) -> MembershipSnapshot {
        MembershipSnapshot {
            room: self.code.clone(),
            seq: self.seq,
            members: self.members.clone(),
        }
    }

    fn join(
        &mut self,
        name: PeerName,
        conn: ConnectionId,
    ) -> Result<MembershipSnapshot, AdmissionError> {
        if self.state != RoomState::Open {
            return Err(AdmissionError::RoomClosed(self.code.clone()));
        }
        if self.members.iter().any(|p| p.name == name) {
            return Err(AdmissionError::NameTaken(name));
        }
        if self.members.len() >= self.capacity {
            return Err(AdmissionError::RoomFull(self.code.clone()));
        }

        debug!(room = %self.code, peer = %name, "Admitting member");
        self.members.push(Peer::new(name.clone(), Role::Member));
        self.links.insert(name.clone(), conn);
        let event = self.record(name.clone(), MembershipKind::Joined { role: Role::Member });

        self.admit_reply(&name);
        let notice = ServerMessage::PeerJoinedRoom {
            name: name.clone(),
            role: Role::Member,
            seq: event.seq,
        };
        self.notify(&notice, Some(&name));
        Ok(self.snapshot())
    }

    fn leave(&mut self, name: PeerName) -> Result<LeaveOutcome, AdmissionError> {
        let Some(idx) = self.members.iter().position(|p| p.name == name) else {
            return Err(AdmissionError::NotAMember(name, self.code.clone()));
        };
        self.members.remove(idx);
        self.links.remove(&name);

        if name != self.owner {
            let event = self.record(name.clone(), MembershipKind::Left);
            let notice = ServerMessage::PeerLeavingRoom {
                name,
                room_destroy: false,
                seq: event.seq,
            };
            let notified = self.notify(&notice, None);
            return Ok(LeaveOutcome::MemberLeft {
                event,
                remaining: self.members.clone(),
                notified,
            });
        }

        info!(
            room = %self.code,
            evicted = self.members.len(),
            "Owner left, closing room"
        );
        self.state = RoomState::Closing;
        let event = self.record(name.clone(), MembershipKind::RoomDestroyed);
        let notice = ServerMessage::PeerLeavingRoom {
            name,
            room_destroy: true,
            seq: event.seq,
        };
        let notified = self.notify(&notice, None);
        let evicted = std::mem::take(&mut self.members);
        self.links.clear();
        Ok(LeaveOutcome::RoomDestroyed {
            event,
            evicted,
            notified,
        })
    }

    fn close(&mut self) {
        if self.state == RoomState::Open {
            warn!(room = %self.code, "Closing a room that was never marked as closing");
        }
        self.members.clear();
        self.links.clear();
        self.state = RoomState::Closed;
    }

    fn record(&mut self, name: PeerName, kind: MembershipKind) -> MembershipEvent {
        self.seq += 1;
        let event = MembershipEvent {
            room: self.code.clone(),
            seq: self.seq,
            name,
            kind,
        };
        self.history.push(event.clone());
        event
    }

    /// The admission reply, carrying the member list as of now.
    fn admit_reply(&self, name: &PeerName) {
        let Some(conn) = self.links.get(name) else {
            return;
        };
        let snapshot = self.snapshot();
        let reply = ServerMessage::RoomInitiation {
            success: true,
            room_id: Some(snapshot.room.clone()),
            participants: snapshot.names(),
            seq: snapshot.seq,
            message: None,
        };
        if !self.output.deliver(*conn, reply) {
            warn!(room = %self.code, peer = %name, "Admission reply dropped");
        }
    }

    /// Sends `msg` to every current member except `excluding`. Returns how many it reached.
    fn notify(&self, msg: &ServerMessage, excluding: Option<&PeerName>) -> usize {
        let mut delivered = 0;
        for (name, conn) in &self.links {
            if Some(name) == excluding {
                continue;
            }
            if self.output.deliver(*conn, msg.clone()) {
                delivered += 1;
            } else {
                debug!(room = %self.code, peer = %name, "Member connection gone");
            }
        }
        delivered
    }
}
