use huddle_core::{ClientMessage, ConnectionId, PeerName, RoomCode, RoomIntent, ServerMessage};
use huddle_server::ChurnCoordinator;
use tokio::sync::mpsc;

pub fn name(s: &str) -> PeerName {
    PeerName::parse(s).unwrap()
}

/// A raw relay connection driven by hand, one frame at a time.
pub struct TestPeer {
    pub conn: ConnectionId,
    pub name: PeerName,
    rx: mpsc::UnboundedReceiver<ServerMessage>,
    coordinator: ChurnCoordinator,
}

impl TestPeer {
    pub fn attach(coordinator: &ChurnCoordinator, who: &str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = coordinator.relay().attach(tx);
        Self {
            conn,
            name: name(who),
            rx,
            coordinator: coordinator.clone(),
        }
    }

    pub async fn send(&self, msg: ClientMessage) {
        self.coordinator.handle(self.conn, msg).await;
    }

    pub fn next(&mut self) -> Option<ServerMessage> {
        self.rx.try_recv().ok()
    }

    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }

    /// Earlier queued frames are discarded so the reply is the next frame.
    pub async fn register(&mut self) -> ServerMessage {
        self.drain();
        self.send(ClientMessage::Initiation {
            name: self.name.clone(),
        })
        .await;
        self.next().expect("initiation reply")
    }

    pub async fn request_room(&mut self, room: Option<RoomCode>, role: RoomIntent) -> ServerMessage {
        self.drain();
        self.send(ClientMessage::RoomInitiation {
            room_id: room,
            name: self.name.clone(),
            role,
        })
        .await;
        self.next().expect("roomInitiation reply")
    }

    /// Registers and opens a new room. Returns its code.
    pub async fn create(&mut self) -> RoomCode {
        self.register().await;
        match self.request_room(None, RoomIntent::Creator).await {
            ServerMessage::RoomInitiation {
                success: true,
                room_id: Some(room),
                ..
            } => room,
            other => panic!("room creation failed: {other:?}"),
        }
    }

    /// Registers and joins `room`. Returns the admission reply.
    pub async fn join(&mut self, room: &RoomCode) -> ServerMessage {
        self.register().await;
        self.request_room(Some(room.clone()), RoomIntent::Participant)
            .await
    }

    pub async fn leave(&self) {
        self.send(ClientMessage::LeaveRoom).await;
    }

    pub async fn disconnect(&self) {
        self.coordinator.disconnect(self.conn).await;
    }
}
