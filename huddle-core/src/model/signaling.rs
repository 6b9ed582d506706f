use crate::model::peer::{PeerName, Role, RoomIntent};
use crate::model::room::RoomCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Pranswer,
    Answer,
    Rollback,
}

/// Browser `RTCSessionDescriptionInit`. Opaque to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Browser `RTCIceCandidateInit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }
}

/// Frames a client sends to the relay.
///
/// For `offer`, `answer` and `candidate` the `name` field is the target peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Initiation {
        name: PeerName,
    },
    RoomInitiation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomCode>,
        name: PeerName,
        role: RoomIntent,
    },
    Offer {
        name: PeerName,
        offer: SessionDescription,
    },
    Answer {
        name: PeerName,
        answer: SessionDescription,
    },
    Candidate {
        name: PeerName,
        #[serde(default)]
        candidate: Option<IceCandidate>,
    },
    LeaveRoom,
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Initiation { .. } => "initiation",
            ClientMessage::RoomInitiation { .. } => "roomInitiation",
            ClientMessage::Offer { .. } => "offer",
            ClientMessage::Answer { .. } => "answer",
            ClientMessage::Candidate { .. } => "candidate",
            ClientMessage::LeaveRoom => "leaveRoom",
        }
    }
}

/// Frames the relay sends to a client.
///
/// For `offer`, `answer` and `candidate` the `name` field is the sending peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Initiation {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    RoomInitiation {
        success: bool,
        room_id: Option<RoomCode>,
        #[serde(default)]
        participants: Vec<PeerName>,
        #[serde(default)]
        seq: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Offer {
        name: PeerName,
        offer: SessionDescription,
    },
    Answer {
        name: PeerName,
        answer: SessionDescription,
    },
    Candidate {
        name: PeerName,
        candidate: Option<IceCandidate>,
    },
    PeerJoinedRoom {
        name: PeerName,
        role: Role,
        seq: u64,
    },
    PeerLeavingRoom {
        name: PeerName,
        room_destroy: bool,
        #[serde(default)]
        seq: u64,
    },
    LeaveConfirmed,
    Error {
        success: bool,
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            success: false,
            message: message.into(),
        }
    }

    pub fn room_rejected(room_id: Option<RoomCode>, message: impl Into<String>) -> Self {
        ServerMessage::RoomInitiation {
            success: false,
            room_id,
            participants: Vec::new(),
            seq: 0,
            message: Some(message.into()),
        }
    }
}
