mod membership;
mod peer;
mod room;
mod signaling;

pub use membership::{MembershipEvent, MembershipKind, MembershipSnapshot};
pub use peer::{ConnectionId, MAX_NAME_LEN, NameError, Peer, PeerName, Role, RoomIntent};
pub use room::{DEFAULT_ROOM_CODE_LEN, ROOM_CODE_ALPHABET, RoomCode, RoomCodeError, RoomState};
pub use signaling::{
    ClientMessage, IceCandidate, IceServerConfig, SdpKind, ServerMessage, SessionDescription,
};
