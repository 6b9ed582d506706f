use crate::error::{AdmissionError, RoutingError};
use crate::room::MembershipOutput;
use dashmap::DashMap;
use huddle_core::{ConnectionId, PeerName, RoomCode, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

struct PeerLink {
    tx: mpsc::UnboundedSender<ServerMessage>,
    name: Option<PeerName>,
    room: Option<RoomCode>,
}

struct RelayInner {
    links: DashMap<ConnectionId, PeerLink>,
    routes: DashMap<(RoomCode, PeerName), ConnectionId>,
}

/// Routes addressed frames between attached connections. It never looks inside a
/// payload; the per-connection unbounded channel keeps delivery FIFO per recipient.
#[derive(Clone)]
pub struct SignalingRelay {
    inner: Arc<RelayInner>,
}

impl SignalingRelay {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                links: DashMap::new(),
                routes: DashMap::new(),
            }),
        }
    }

    pub fn attach(&self, tx: mpsc::UnboundedSender<ServerMessage>) -> ConnectionId {
        let id = ConnectionId::new();
        self.inner.links.insert(
            id,
            PeerLink {
                tx,
                name: None,
                room: None,
            },
        );
        debug!(conn = %id, "Connection attached");
        id
    }

    pub fn detach(&self, id: ConnectionId) {
        self.unbind_room(id);
        if self.inner.links.remove(&id).is_some() {
            debug!(conn = %id, "Connection detached");
        }
    }

    /// Sets the display name of a connection. Re-sending the same name is accepted.
    pub fn register_name(&self, id: ConnectionId, name: PeerName) -> Result<(), AdmissionError> {
        let mut link = self
            .inner
            .links
            .get_mut(&id)
            .ok_or(AdmissionError::NotRegistered)?;

        match &link.name {
            Some(registered) if registered != &name => Err(AdmissionError::NameMismatch {
                registered: registered.clone(),
                requested: name,
            }),
            _ => {
                link.name = Some(name);
                Ok(())
            }
        }
    }

    pub fn name_of(&self, id: ConnectionId) -> Option<PeerName> {
        self.inner.links.get(&id).and_then(|link| link.name.clone())
    }

    pub fn room_of(&self, id: ConnectionId) -> Option<RoomCode> {
        self.inner.links.get(&id).and_then(|link| link.room.clone())
    }

    pub fn connection_for(&self, room: &RoomCode, name: &PeerName) -> Option<ConnectionId> {
        self.inner
            .routes
            .get(&(room.clone(), name.clone()))
            .map(|entry| *entry.value())
    }

    /// Makes `id` addressable by its name inside `room`.
    pub fn bind_room(&self, id: ConnectionId, room: &RoomCode) -> Result<(), RoutingError> {
        let name = {
            let mut link = self
                .inner
                .links
                .get_mut(&id)
                .ok_or(RoutingError::UnknownConnection(id))?;
            link.room = Some(room.clone());
            link.name.clone()
        };

        if let Some(name) = name {
            self.inner.routes.insert((room.clone(), name), id);
        }
        Ok(())
    }

    pub fn unbind_room(&self, id: ConnectionId) {
        let binding = self.inner.links.get_mut(&id).and_then(|mut link| {
            let room = link.room.take()?;
            Some((room, link.name.clone()))
        });

        if let Some((room, Some(name))) = binding {
            self.inner
                .routes
                .remove_if(&(room, name), |_, bound| *bound == id);
        }
    }

    /// Delivers `msg` to the peer called `to` in the sender's room.
    pub fn send(
        &self,
        from: ConnectionId,
        to: &PeerName,
        msg: ServerMessage,
    ) -> Result<(), RoutingError> {
        let room = self.room_of(from).ok_or(RoutingError::SenderNotInRoom)?;
        let target = self
            .connection_for(&room, to)
            .ok_or_else(|| RoutingError::RecipientNotConnected(to.clone()))?;

        self.push(target, msg)
            .map_err(|_| RoutingError::RecipientNotConnected(to.clone()))
    }

    /// Replies directly to a connection, whatever room it is in.
    pub fn send_to(&self, id: ConnectionId, msg: ServerMessage) -> Result<(), RoutingError> {
        self.push(id, msg)
    }

    /// Sends `msg` to every connection bound to `room` except `excluding`.
    /// Returns how many connections it reached.
    pub fn broadcast(
        &self,
        room: &RoomCode,
        msg: &ServerMessage,
        excluding: Option<&PeerName>,
    ) -> usize {
        let targets: Vec<(ConnectionId, mpsc::UnboundedSender<ServerMessage>)> = self
            .inner
            .links
            .iter()
            .filter(|entry| entry.room.as_ref() == Some(room))
            .filter(|entry| excluding.is_none() || entry.name.as_ref() != excluding)
            .map(|entry| (*entry.key(), entry.tx.clone()))
            .collect();

        let mut delivered = 0;
        for (id, tx) in targets {
            if tx.send(msg.clone()).is_ok() {
                delivered += 1;
            } else {
                warn!(conn = %id, room = %room, "Broadcast to closed connection");
            }
        }
        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.inner.links.len()
    }

    fn push(&self, id: ConnectionId, msg: ServerMessage) -> Result<(), RoutingError> {
        let tx = self
            .inner
            .links
            .get(&id)
            .map(|link| link.tx.clone())
            .ok_or(RoutingError::UnknownConnection(id))?;

        tx.send(msg).map_err(|_| RoutingError::UnknownConnection(id))
    }
}

impl Default for SignalingRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl MembershipOutput for SignalingRelay {
    fn deliver(&self, conn: ConnectionId, msg: ServerMessage) -> bool {
        self.send_to(conn, msg).is_ok()
    }
}
