use crate::error::AdmissionError;
use huddle_core::{ConnectionId, MembershipEvent, MembershipSnapshot, Peer, PeerName, RoomState};
use tokio::sync::oneshot;

pub type Reply<T> = oneshot::Sender<Result<T, AdmissionError>>;

/// Mutations and reads a room actor processes one at a time.
#[derive(Debug)]
pub enum RoomCommand {
    /// `conn` receives the admission reply from the actor itself.
    Join {
        name: PeerName,
        conn: ConnectionId,
        reply: Reply<MembershipSnapshot>,
    },

    Leave {
        name: PeerName,
        reply: Reply<LeaveOutcome>,
    },

    /// Finishes an owner teardown: `Closing` -> `Closed` and the actor stops.
    Close { reply: oneshot::Sender<()> },

    Snapshot {
        reply: oneshot::Sender<(RoomState, MembershipSnapshot)>,
    },

    History {
        reply: oneshot::Sender<Vec<MembershipEvent>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    MemberLeft {
        event: MembershipEvent,
        remaining: Vec<Peer>,
        notified: usize,
    },

    /// The owner left. The room is `Closing` and every peer in `evicted`
    /// has already been sent the destroy notice.
    RoomDestroyed {
        event: MembershipEvent,
        evicted: Vec<Peer>,
        notified: usize,
    },
}

impl LeaveOutcome {
    pub fn event(&self) -> &MembershipEvent {
        match self {
            LeaveOutcome::MemberLeft { event, .. } | LeaveOutcome::RoomDestroyed { event, .. } => {
                event
            }
        }
    }
}
