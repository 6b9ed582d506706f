use serde::{Deserialize, Serialize};
use thiserror::Error;

/// State of one offer/answer exchange between two peers.
///
/// ```text
/// initiator: PendingOffer -SendOffer-> OfferSent -ReceiveAnswer-> AnswerReceived -RemoteApplied-> Connected
/// responder: PendingOffer -ReceiveOffer-> Connected
/// any state  -Close-> Closed   (absorbing)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegotiationState {
    PendingOffer,
    OfferSent,
    AnswerReceived,
    Connected,
    Closed,
}

/// Which end of the pair a state machine is driven from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiationEvent {
    SendOffer,
    ReceiveOffer,
    ReceiveAnswer,
    RemoteApplied,
    Close,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{event:?} is not valid for the {side:?} in state {state:?}")]
pub struct SequenceError {
    pub state: NegotiationState,
    pub side: Side,
    pub event: NegotiationEvent,
}

impl NegotiationState {
    pub fn is_closed(self) -> bool {
        self == NegotiationState::Closed
    }

    pub fn is_connected(self) -> bool {
        self == NegotiationState::Connected
    }

    /// Next state, or an error that leaves `self` as it was.
    /// `Closed` swallows every event.
    pub fn apply(self, side: Side, event: NegotiationEvent) -> Result<Self, SequenceError> {
        use NegotiationEvent::*;
        use NegotiationState::*;

        match (self, side, event) {
            (_, _, Close) | (Closed, _, _) => Ok(Closed),
            (PendingOffer, Side::Initiator, SendOffer) => Ok(OfferSent),
            (PendingOffer, Side::Responder, ReceiveOffer) => Ok(Connected),
            (OfferSent, Side::Initiator, ReceiveAnswer) => Ok(AnswerReceived),
            (AnswerReceived, Side::Initiator, RemoteApplied) => Ok(Connected),
            (state, side, event) => Err(SequenceError { state, side, event }),
        }
    }
}
