use huddle_core::{ConnectionId, PeerName, RoomCode};
use thiserror::Error;

/// Reasons a create/join/leave request is refused. Reported to the caller, never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("name '{0}' is already in use in another room")]
    NameInUse(PeerName),

    #[error("name '{0}' is already taken in this room")]
    NameTaken(PeerName),

    #[error("room {0} does not exist")]
    RoomNotFound(RoomCode),

    #[error("room {0} is not accepting members")]
    RoomClosed(RoomCode),

    #[error("room {0} is full")]
    RoomFull(RoomCode),

    #[error("'{0}' is not a member of room {1}")]
    NotAMember(PeerName, RoomCode),

    #[error("room code {0} is already in use")]
    CodeTaken(RoomCode),

    #[error("no free room code after {0} attempts")]
    CodeSpaceExhausted(usize),

    #[error("send an initiation before joining a room")]
    NotRegistered,

    #[error("connection is registered as '{registered}', not '{requested}'")]
    NameMismatch {
        registered: PeerName,
        requested: PeerName,
    },

    #[error("connection is already in room {0}")]
    AlreadyInRoom(RoomCode),

    #[error("participants must name the room to join")]
    MissingRoom,
}

/// Delivery failures. Logged and dropped; the sender's session is not affected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("recipient '{0}' is not connected")]
    RecipientNotConnected(PeerName),

    #[error("connection {0} is not attached")]
    UnknownConnection(ConnectionId),

    #[error("sender is not in a room")]
    SenderNotInRoom,
}
