mod negotiation_state;
mod pair_key;

pub use negotiation_state::{NegotiationEvent, NegotiationState, SequenceError, Side};
pub use pair_key::PairKey;
