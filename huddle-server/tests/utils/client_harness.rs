use huddle_client::{ClientConfig, ClientEvent, RoomClient};
use huddle_core::{ClientMessage, ConnectionId, RoomCode, ServerMessage};
use huddle_server::ChurnCoordinator;
use tokio::sync::mpsc;

use crate::utils::{NullConnectorFactory, name};

pub type HarnessRoomClient = RoomClient<NullConnectorFactory, mpsc::UnboundedSender<ClientMessage>>;

/// A full `RoomClient` wired to the coordinator through in-memory channels.
pub struct HarnessClient {
    pub conn: ConnectionId,
    pub client: HarnessRoomClient,
    pub events: Vec<ClientEvent>,
    outbox: mpsc::UnboundedReceiver<ClientMessage>,
    inbox: mpsc::UnboundedReceiver<ServerMessage>,
}

impl HarnessClient {
    fn wire(
        coordinator: &ChurnCoordinator,
        build: impl FnOnce(mpsc::UnboundedSender<ClientMessage>) -> HarnessRoomClient,
    ) -> Self {
        let (server_tx, inbox) = mpsc::unbounded_channel();
        let conn = coordinator.relay().attach(server_tx);
        let (client_tx, outbox) = mpsc::unbounded_channel();
        Self {
            conn,
            client: build(client_tx),
            events: Vec::new(),
            outbox,
            inbox,
        }
    }

    pub fn creator(coordinator: &ChurnCoordinator, who: &str) -> Self {
        Self::wire(coordinator, |sink| {
            RoomClient::creator(
                name(who),
                ClientConfig::default(),
                NullConnectorFactory { local: name(who) },
                sink,
            )
        })
    }

    pub fn participant(coordinator: &ChurnCoordinator, who: &str, room: &RoomCode) -> Self {
        Self::wire(coordinator, |sink| {
            RoomClient::participant(
                name(who),
                room.clone(),
                ClientConfig::default(),
                NullConnectorFactory { local: name(who) },
                sink,
            )
        })
    }
}

impl HarnessClient {
    /// Frames the client queued for the server, without handing them over.
    pub fn take_outgoing(&mut self) -> Vec<ClientMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.outbox.try_recv() {
            out.push(msg);
        }
        out
    }

    /// Hands every frame the server sent to the client, without replying.
    pub async fn take_incoming(&mut self) {
        while let Ok(msg) = self.inbox.try_recv() {
            if let Some(event) = self.client.handle(msg).await.unwrap() {
                self.events.push(event);
            }
        }
    }
}

/// Moves frames between the clients and the coordinator until nothing is in flight.
pub async fn pump(coordinator: &ChurnCoordinator, clients: &mut [&mut HarnessClient]) {
    loop {
        let mut moved = false;
        for c in clients.iter_mut() {
            while let Ok(msg) = c.outbox.try_recv() {
                coordinator.handle(c.conn, msg).await;
                moved = true;
            }
            while let Ok(msg) = c.inbox.try_recv() {
                if let Some(event) = c.client.handle(msg).await.unwrap() {
                    c.events.push(event);
                }
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
}
