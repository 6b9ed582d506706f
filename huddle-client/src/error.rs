use huddle_core::{PairKey, SequenceError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    OutOfSequence(#[from] SequenceError),

    /// The pair is closed; whatever arrived was ignored.
    #[error("negotiation {0} is closed")]
    Closed(PairKey),

    #[error("peer connector failed: {0}")]
    Connector(#[from] anyhow::Error),
}
