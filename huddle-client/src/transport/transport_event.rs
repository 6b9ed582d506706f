use huddle_core::{IceCandidate, PeerName};

/// What a transport reports back to the room client, per remote peer.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A local candidate to trickle to the remote peer. `None` once gathering is done.
    CandidateGenerated(PeerName, Option<IceCandidate>),

    Connected(PeerName),

    /// Failed, disconnected or closed.
    Disconnected(PeerName),
}
