use crate::config::RegistrySettings;
use crate::error::AdmissionError;
use crate::room::{LeaveOutcome, MembershipOutput, Room, RoomCommand};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use huddle_core::{
    ConnectionId, MembershipEvent, MembershipSnapshot, PeerName, RoomCode, RoomState,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

const MAX_CODE_ATTEMPTS: usize = 64;

/// How many rooms a name sits in, and whether one of them is its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Seat {
    count: usize,
    owner: bool,
}

/// Process-wide table of rooms. Each room is an actor task; the registry only
/// holds their command senders plus an index of which names are seated anywhere.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomCode, mpsc::Sender<RoomCommand>>>,
    seated: Arc<DashMap<PeerName, Seat>>,
    output: Arc<dyn MembershipOutput>,
    settings: RegistrySettings,
}

impl RoomRegistry {
    pub fn new(settings: RegistrySettings, output: Arc<dyn MembershipOutput>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            seated: Arc::new(DashMap::new()),
            output,
            settings,
        }
    }

    /// Opens a room with `owner` as its only member. The owner must not sit in any other room.
    /// `conn` gets the admission reply once the room's actor is running.
    pub async fn create_room(
        &self,
        owner: PeerName,
        conn: ConnectionId,
    ) -> Result<MembershipSnapshot, AdmissionError> {
        self.reserve_owner(&owner)?;

        let (tx, rx) = mpsc::channel(self.settings.command_buffer);
        let code = match self.claim_code(tx) {
            Ok(code) => code,
            Err(e) => {
                self.unseat(&owner);
                return Err(e);
            }
        };
        Ok(self.open(code, owner, conn, rx))
    }

    /// Same as `create_room` under a code the caller picked.
    pub async fn create_room_with_code(
        &self,
        code: RoomCode,
        owner: PeerName,
        conn: ConnectionId,
    ) -> Result<MembershipSnapshot, AdmissionError> {
        self.reserve_owner(&owner)?;

        let (tx, rx) = mpsc::channel(self.settings.command_buffer);
        match self.rooms.entry(code.clone()) {
            Entry::Occupied(_) => {
                self.unseat(&owner);
                return Err(AdmissionError::CodeTaken(code));
            }
            Entry::Vacant(slot) => {
                slot.insert(tx);
            }
        }
        Ok(self.open(code, owner, conn, rx))
    }

    fn open(
        &self,
        code: RoomCode,
        owner: PeerName,
        conn: ConnectionId,
        rx: mpsc::Receiver<RoomCommand>,
    ) -> MembershipSnapshot {
        let room = Room::new(
            code.clone(),
            owner.clone(),
            conn,
            self.settings.capacity,
            rx,
            self.output.clone(),
        );
        let snapshot = room.snapshot();
        room.greet_owner();
        tokio::spawn(room.run());

        info!(room = %code, owner = %owner, "Created room");
        snapshot
    }

    /// Seats `name` as a plain member. On success the actor has already sent
    /// the admission reply to `conn` and the join notice to everyone else.
    pub async fn join_room(
        &self,
        code: &RoomCode,
        name: PeerName,
        conn: ConnectionId,
    ) -> Result<MembershipSnapshot, AdmissionError> {
        self.reserve_member(&name)?;

        let admitted = self
            .request(code, |reply| RoomCommand::Join {
                name: name.clone(),
                conn,
                reply,
            })
            .await
            .and_then(|result| result);

        match admitted {
            Ok(snapshot) => {
                info!(room = %code, peer = %name, members = snapshot.len(), "Member joined");
                Ok(snapshot)
            }
            Err(e) => {
                self.unseat(&name);
                Err(e)
            }
        }
    }

    pub async fn leave_room(
        &self,
        code: &RoomCode,
        name: &PeerName,
    ) -> Result<LeaveOutcome, AdmissionError> {
        let outcome = self
            .request(code, |reply| RoomCommand::Leave {
                name: name.clone(),
                reply,
            })
            .await??;

        self.unseat(name);
        if let LeaveOutcome::RoomDestroyed { evicted, .. } = &outcome {
            for peer in evicted {
                self.unseat(&peer.name);
            }
        }

        info!(room = %code, peer = %name, "Member left");
        Ok(outcome)
    }

    /// Drops the room from the table and stops its actor.
    pub async fn close_room(&self, code: &RoomCode) {
        let Some((_, sender)) = self.rooms.remove(code) else {
            debug!(room = %code, "Room already removed");
            return;
        };

        let (reply, rx) = oneshot::channel();
        if sender.send(RoomCommand::Close { reply }).await.is_err() || rx.await.is_err() {
            warn!(room = %code, "Room actor stopped before close was acknowledged");
        }
        info!(room = %code, "Room closed");
    }

    pub async fn snapshot(&self, code: &RoomCode) -> Result<MembershipSnapshot, AdmissionError> {
        let (_, snapshot) = self.inspect(code).await?;
        Ok(snapshot)
    }

    /// True while the room exists and still admits members.
    pub async fn is_open(&self, code: &RoomCode) -> bool {
        matches!(self.inspect(code).await, Ok((RoomState::Open, _)))
    }

    pub async fn history(&self, code: &RoomCode) -> Result<Vec<MembershipEvent>, AdmissionError> {
        self.request(code, |reply| RoomCommand::History { reply })
            .await
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_seated(&self, name: &PeerName) -> bool {
        self.seated.get(name).is_some_and(|seat| seat.count > 0)
    }

    async fn inspect(
        &self,
        code: &RoomCode,
    ) -> Result<(RoomState, MembershipSnapshot), AdmissionError> {
        self.request(code, |reply| RoomCommand::Snapshot { reply })
            .await
    }

    async fn request<T>(
        &self,
        code: &RoomCode,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, AdmissionError> {
        let sender = self
            .rooms
            .get(code)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AdmissionError::RoomNotFound(code.clone()))?;

        let (reply, rx) = oneshot::channel();
        sender
            .send(build(reply))
            .await
            .map_err(|_| AdmissionError::RoomClosed(code.clone()))?;
        rx.await
            .map_err(|_| AdmissionError::RoomClosed(code.clone()))
    }

    fn claim_code(&self, tx: mpsc::Sender<RoomCommand>) -> Result<RoomCode, AdmissionError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = RoomCode::generate(&mut rand::thread_rng(), self.settings.code_len);
            match self.rooms.entry(code.clone()) {
                Entry::Occupied(_) => debug!(room = %code, "Room code collision, drawing again"),
                Entry::Vacant(slot) => {
                    slot.insert(tx);
                    return Ok(code);
                }
            }
        }
        Err(AdmissionError::CodeSpaceExhausted(MAX_CODE_ATTEMPTS))
    }

    /// Claims `name` as an owner. Fails if it sits in any room at all.
    fn reserve_owner(&self, name: &PeerName) -> Result<(), AdmissionError> {
        match self.seated.entry(name.clone()) {
            Entry::Occupied(_) => Err(AdmissionError::NameInUse(name.clone())),
            Entry::Vacant(slot) => {
                slot.insert(Seat {
                    count: 1,
                    owner: true,
                });
                Ok(())
            }
        }
    }

    /// Claims one more member seat for `name`. Fails if it owns a room.
    fn reserve_member(&self, name: &PeerName) -> Result<(), AdmissionError> {
        match self.seated.entry(name.clone()) {
            Entry::Occupied(mut slot) => {
                if slot.get().owner {
                    return Err(AdmissionError::NameInUse(name.clone()));
                }
                slot.get_mut().count += 1;
                Ok(())
            }
            Entry::Vacant(slot) => {
                slot.insert(Seat {
                    count: 1,
                    owner: false,
                });
                Ok(())
            }
        }
    }

    fn unseat(&self, name: &PeerName) {
        if let Entry::Occupied(mut slot) = self.seated.entry(name.clone()) {
            let seat = slot.get_mut();
            seat.count = seat.count.saturating_sub(1);
            if seat.count == 0 {
                slot.remove();
            }
        }
    }
}
