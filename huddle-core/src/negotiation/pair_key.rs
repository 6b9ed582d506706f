use crate::model::PeerName;
use std::fmt;

/// Unordered pair of peers inside one room. `(a, b)` and `(b, a)` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    low: PeerName,
    high: PeerName,
}

impl PairKey {
    pub fn new(a: PeerName, b: PeerName) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn involves(&self, name: &PeerName) -> bool {
        &self.low == name || &self.high == name
    }

    /// The peer on the other end from `name`, if `name` is part of the pair.
    pub fn other(&self, name: &PeerName) -> Option<&PeerName> {
        if &self.low == name {
            Some(&self.high)
        } else if &self.high == name {
            Some(&self.low)
        } else {
            None
        }
    }

    pub fn peers(&self) -> (&PeerName, &PeerName) {
        (&self.low, &self.high)
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<->{}", self.low, self.high)
    }
}
