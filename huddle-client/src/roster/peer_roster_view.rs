use huddle_core::{MembershipEvent, MembershipKind, MembershipSnapshot, Peer, PeerName, RoomCode};
use tracing::debug;

/// A client's picture of who is in its room, built only from the admission
/// snapshot and the membership events that follow it.
#[derive(Debug, Clone, Default)]
pub struct PeerRosterView {
    room: Option<RoomCode>,
    members: Vec<Peer>,
    last_seq: u64,
}

impl PeerRosterView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_snapshot(&mut self, snapshot: &MembershipSnapshot) {
        self.room = Some(snapshot.room.clone());
        self.members = snapshot.members.clone();
        self.last_seq = snapshot.seq;
    }

    /// Returns whether the event changed anything the view tracks. Events for
    /// another room or not newer than the last one applied are ignored.
    pub fn apply(&mut self, event: &MembershipEvent) -> bool {
        if self.room.as_ref() != Some(&event.room) {
            debug!(room = %event.room, "Membership event for another room ignored");
            return false;
        }
        if event.seq <= self.last_seq {
            debug!(room = %event.room, seq = event.seq, last = self.last_seq, "Stale membership event ignored");
            return false;
        }
        self.last_seq = event.seq;

        match event.kind {
            MembershipKind::Joined { role } => {
                if self.contains(&event.name) {
                    return false;
                }
                self.members.push(Peer::new(event.name.clone(), role));
                true
            }
            MembershipKind::Left => {
                let before = self.members.len();
                self.members.retain(|p| p.name != event.name);
                self.members.len() != before
            }
            MembershipKind::RoomDestroyed => {
                self.clear();
                true
            }
        }
    }

    pub fn clear(&mut self) {
        self.room = None;
        self.members.clear();
        self.last_seq = 0;
    }

    pub fn room(&self) -> Option<&RoomCode> {
        self.room.as_ref()
    }

    pub fn members(&self) -> &[Peer] {
        &self.members
    }

    pub fn names(&self) -> Vec<PeerName> {
        self.members.iter().map(|p| p.name.clone()).collect()
    }

    pub fn owner(&self) -> Option<&Peer> {
        self.members.iter().find(|p| p.is_owner())
    }

    pub fn contains(&self, name: &PeerName) -> bool {
        self.members.iter().any(|p| &p.name == name)
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
