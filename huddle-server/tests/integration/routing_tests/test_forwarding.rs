use huddle_core::{ClientMessage, IceCandidate, NegotiationState, PairKey, ServerMessage, SessionDescription};

use crate::integration::{create_coordinator, init_tracing};
use crate::utils::{TestPeer, name};

#[tokio::test]
async fn forwarded_frames_carry_the_sender_name() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut alice = TestPeer::attach(&coordinator, "Alice");
    let mut bob = TestPeer::attach(&coordinator, "Bob");
    let room = alice.create().await;
    bob.join(&room).await;
    alice.drain();

    bob.send(ClientMessage::Offer {
        name: name("Alice"),
        offer: SessionDescription::offer("v=0 bob"),
    })
    .await;
    assert_eq!(
        alice.next(),
        Some(ServerMessage::Offer {
            name: name("Bob"),
            offer: SessionDescription::offer("v=0 bob"),
        })
    );

    let key = PairKey::new(name("Alice"), name("Bob"));
    assert_eq!(
        coordinator.ledger().get(&room, &key).map(|r| r.state),
        Some(NegotiationState::OfferSent)
    );

    alice
        .send(ClientMessage::Answer {
            name: name("Bob"),
            answer: SessionDescription::answer("v=0 alice"),
        })
        .await;
    assert_eq!(
        bob.next(),
        Some(ServerMessage::Answer {
            name: name("Alice"),
            answer: SessionDescription::answer("v=0 alice"),
        })
    );
    assert_eq!(
        coordinator.ledger().get(&room, &key).map(|r| r.state),
        Some(NegotiationState::Connected)
    );
}

#[tokio::test]
async fn candidates_keep_their_order_and_end_marker() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut alice = TestPeer::attach(&coordinator, "Alice");
    let mut bob = TestPeer::attach(&coordinator, "Bob");
    let room = alice.create().await;
    bob.join(&room).await;
    alice.drain();

    for i in 0..5 {
        bob.send(ClientMessage::Candidate {
            name: name("Alice"),
            candidate: Some(IceCandidate::new(format!("candidate:{i}"))),
        })
        .await;
    }
    bob.send(ClientMessage::Candidate {
        name: name("Alice"),
        candidate: None,
    })
    .await;

    let received = alice.drain();
    assert_eq!(received.len(), 6);
    for (i, msg) in received.iter().take(5).enumerate() {
        assert_eq!(
            msg,
            &ServerMessage::Candidate {
                name: name("Bob"),
                candidate: Some(IceCandidate::new(format!("candidate:{i}"))),
            }
        );
    }
    assert_eq!(
        received[5],
        ServerMessage::Candidate {
            name: name("Bob"),
            candidate: None,
        }
    );
}

#[tokio::test]
async fn frames_to_absent_peers_are_dropped_quietly() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut alice = TestPeer::attach(&coordinator, "Alice");
    let mut outsider = TestPeer::attach(&coordinator, "Outsider");
    let room = alice.create().await;
    outsider.register().await;

    alice
        .send(ClientMessage::Offer {
            name: name("Ghost"),
            offer: SessionDescription::offer("v=0"),
        })
        .await;
    assert!(alice.drain().is_empty());

    // names only resolve inside the sender's room
    outsider
        .send(ClientMessage::Offer {
            name: name("Alice"),
            offer: SessionDescription::offer("v=0"),
        })
        .await;
    assert!(alice.drain().is_empty());
    assert!(outsider.drain().is_empty());
    assert!(coordinator.ledger().pairs(&room).is_empty());
}

#[tokio::test]
async fn unregistered_connection_is_told_to_initiate() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut anon = TestPeer::attach(&coordinator, "Anon");

    anon.send(ClientMessage::Offer {
        name: name("Alice"),
        offer: SessionDescription::offer("v=0"),
    })
    .await;
    assert_eq!(
        anon.next(),
        Some(ServerMessage::error("send an initiation first"))
    );
}
