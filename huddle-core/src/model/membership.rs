use crate::model::peer::{Peer, PeerName, Role};
use crate::model::room::RoomCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MembershipKind {
    Joined { role: Role },
    Left,
    RoomDestroyed,
}

/// Immutable membership fact. Only the room that owns the member list writes these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEvent {
    pub room: RoomCode,
    pub seq: u64,
    pub name: PeerName,
    #[serde(flatten)]
    pub kind: MembershipKind,
}

/// Ordered member list (join order) at a given sequence position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipSnapshot {
    pub room: RoomCode,
    pub seq: u64,
    pub members: Vec<Peer>,
}

impl MembershipSnapshot {
    pub fn names(&self) -> Vec<PeerName> {
        self.members.iter().map(|p| p.name.clone()).collect()
    }

    pub fn owner(&self) -> Option<&Peer> {
        self.members.iter().find(|p| p.is_owner())
    }

    pub fn contains(&self, name: &PeerName) -> bool {
        self.members.iter().any(|p| &p.name == name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
