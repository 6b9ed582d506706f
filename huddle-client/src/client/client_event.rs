use huddle_core::{PeerName, RoomCode};

/// Things the application hears about from a `RoomClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Registered,
    RegistrationFailed(String),
    Admitted {
        room: RoomCode,
        participants: Vec<PeerName>,
    },
    AdmissionRejected(String),
    PeerJoined(PeerName),
    PeerLeft(PeerName),
    /// The owner left and took the room with them.
    RoomDestroyed { owner: PeerName },
    LeftRoom,
    /// Offer/answer finished for the pair with this peer.
    NegotiationComplete(PeerName),
    TransportConnected(PeerName),
    TransportLost(PeerName),
    ServerError(String),
}
