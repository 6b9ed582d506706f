use dashmap::DashMap;
use huddle_core::{
    NegotiationEvent, NegotiationState, PairKey, PeerName, RoomCode, Side,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRecord {
    pub initiator: PeerName,
    pub state: NegotiationState,
}

/// Relayed negotiation frames the ledger advances on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observed {
    Offer,
    Answer,
}

/// Server-side mirror of every pair negotiation, per room.
///
/// Only the coordinator writes it. Relaying never depends on it; a mismatch is
/// logged and the frame still goes through.
#[derive(Clone, Default)]
pub struct PairLedger {
    rooms: Arc<DashMap<RoomCode, HashMap<PairKey, PairRecord>>>,
}

impl PairLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// One pending pair between `joiner` and each of `existing`. The joiner offers.
    pub fn form_pairs(&self, room: &RoomCode, joiner: &PeerName, existing: &[PeerName]) -> usize {
        let mut pairs = self.rooms.entry(room.clone()).or_default();
        let mut formed = 0;

        for other in existing.iter().filter(|other| *other != joiner) {
            let key = PairKey::new(joiner.clone(), other.clone());
            if let Some(prior) = pairs.get(&key) {
                if !prior.state.is_closed() {
                    warn!(room = %room, pair = %key, state = ?prior.state, "Replacing a pair that was never closed");
                }
            }
            pairs.insert(
                key,
                PairRecord {
                    initiator: joiner.clone(),
                    state: NegotiationState::PendingOffer,
                },
            );
            formed += 1;
        }
        formed
    }

    pub fn observe(
        &self,
        room: &RoomCode,
        from: &PeerName,
        to: &PeerName,
        observed: Observed,
    ) -> Option<NegotiationState> {
        let mut pairs = self.rooms.get_mut(room)?;
        let key = PairKey::new(from.clone(), to.clone());
        let Some(record) = pairs.get_mut(&key) else {
            debug!(room = %room, pair = %key, "Negotiation frame for an unknown pair");
            return None;
        };

        let from_initiator = &record.initiator == from;
        let next = match (observed, from_initiator) {
            (Observed::Offer, true) => record
                .state
                .apply(Side::Initiator, NegotiationEvent::SendOffer),
            (Observed::Answer, false) => record
                .state
                .apply(Side::Initiator, NegotiationEvent::ReceiveAnswer)
                .and_then(|s| s.apply(Side::Initiator, NegotiationEvent::RemoteApplied)),
            // glare: the responder offered
            (Observed::Offer, false) => record
                .state
                .apply(Side::Responder, NegotiationEvent::SendOffer),
            // the responder was handed an answer
            (Observed::Answer, true) => record
                .state
                .apply(Side::Responder, NegotiationEvent::ReceiveAnswer),
        };

        match next {
            Ok(state) => {
                debug!(room = %room, pair = %key, from = ?record.state, to = ?state, "Pair advanced");
                record.state = state;
            }
            Err(e) => warn!(room = %room, pair = %key, error = %e, "Out-of-sequence negotiation frame"),
        }
        Some(record.state)
    }

    /// Closes and forgets every pair involving `name`. Returns the closed keys.
    /// A room left without pairs drops out of the ledger.
    pub fn close_peer(&self, room: &RoomCode, name: &PeerName) -> Vec<PairKey> {
        let Some(mut pairs) = self.rooms.get_mut(room) else {
            return Vec::new();
        };

        let closed: Vec<PairKey> = pairs
            .keys()
            .filter(|key| key.involves(name))
            .cloned()
            .collect();
        for key in &closed {
            pairs.remove(key);
        }
        drop(pairs);

        self.rooms.remove_if(room, |_, pairs| pairs.is_empty());
        closed
    }

    /// Closes every pair of the room and drops the room's entry.
    pub fn close_room(&self, room: &RoomCode) -> Vec<PairKey> {
        self.rooms
            .remove(room)
            .map(|(_, pairs)| pairs.into_keys().collect())
            .unwrap_or_default()
    }

    /// Rooms with at least one tracked pair.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn get(&self, room: &RoomCode, key: &PairKey) -> Option<PairRecord> {
        self.rooms.get(room)?.get(key).cloned()
    }

    pub fn pairs(&self, room: &RoomCode) -> Vec<(PairKey, PairRecord)> {
        self.rooms
            .get(room)
            .map(|pairs| {
                pairs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn pairs_involving(&self, room: &RoomCode, name: &PeerName) -> usize {
        self.rooms
            .get(room)
            .map(|pairs| pairs.keys().filter(|key| key.involves(name)).count())
            .unwrap_or(0)
    }
}
