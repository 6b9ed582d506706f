pub mod model;
pub mod negotiation;

pub use model::*;
pub use negotiation::{NegotiationEvent, NegotiationState, PairKey, SequenceError, Side};
