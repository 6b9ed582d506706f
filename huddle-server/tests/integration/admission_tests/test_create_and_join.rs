use huddle_core::{RoomCode, RoomIntent, ServerMessage};
use huddle_server::RegistrySettings;

use crate::integration::{create_coordinator, create_coordinator_with, init_tracing};
use crate::utils::{TestPeer, name};

#[tokio::test]
async fn owner_creates_and_member_joins() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut alice = TestPeer::attach(&coordinator, "Alice");
    let mut bob = TestPeer::attach(&coordinator, "Bob");

    assert_eq!(
        alice.register().await,
        ServerMessage::Initiation {
            success: true,
            message: None
        }
    );
    let room = match alice.request_room(None, RoomIntent::Creator).await {
        ServerMessage::RoomInitiation {
            success: true,
            room_id: Some(room),
            participants,
            seq,
            ..
        } => {
            assert_eq!(participants, vec![name("Alice")]);
            assert_eq!(seq, 1);
            room
        }
        other => panic!("unexpected reply {other:?}"),
    };
    assert_eq!(room.as_str().len(), 4);
    assert!(room.as_str().chars().all(|c| c.is_ascii_uppercase()));

    let reply = bob.join(&room).await;
    assert_eq!(
        reply,
        ServerMessage::RoomInitiation {
            success: true,
            room_id: Some(room.clone()),
            participants: vec![name("Alice"), name("Bob")],
            seq: 2,
            message: None,
        }
    );

    assert_eq!(
        alice.drain(),
        vec![ServerMessage::PeerJoinedRoom {
            name: name("Bob"),
            role: huddle_core::Role::Member,
            seq: 2,
        }]
    );
    assert!(bob.drain().is_empty(), "joiner does not hear about itself");

    let pairs = coordinator.ledger().pairs(&room);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].1.initiator, name("Bob"));
}

#[tokio::test]
async fn duplicate_name_is_rejected_without_side_effects() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut alice = TestPeer::attach(&coordinator, "Alice");
    let mut bob = TestPeer::attach(&coordinator, "Bob");
    let mut other_bob = TestPeer::attach(&coordinator, "Bob");

    let room = alice.create().await;
    bob.join(&room).await;
    alice.drain();

    match other_bob.join(&room).await {
        ServerMessage::RoomInitiation {
            success: false,
            message: Some(message),
            ..
        } => assert!(message.contains("already taken"), "{message}"),
        other => panic!("unexpected reply {other:?}"),
    }

    assert!(alice.drain().is_empty());
    assert!(bob.drain().is_empty());
    assert_eq!(coordinator.registry().snapshot(&room).await.unwrap().len(), 2);
    assert_eq!(coordinator.ledger().pairs(&room).len(), 1);
    assert!(coordinator.relay().room_of(other_bob.conn).is_none());
}

#[tokio::test]
async fn unknown_room_and_missing_code_are_rejected() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut bob = TestPeer::attach(&coordinator, "Bob");

    let ghost = RoomCode::parse("QQQQ").unwrap();
    let reply = bob.join(&ghost).await;
    assert_eq!(
        reply,
        ServerMessage::room_rejected(Some(ghost.clone()), "room QQQQ does not exist")
    );

    let reply = bob.request_room(None, RoomIntent::Participant).await;
    assert!(matches!(
        reply,
        ServerMessage::RoomInitiation { success: false, .. }
    ));
    assert_eq!(coordinator.registry().room_count(), 0);
}

#[tokio::test]
async fn connection_cannot_sit_in_two_rooms_or_change_name() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut alice = TestPeer::attach(&coordinator, "Alice");
    let first = alice.create().await;

    let reply = alice.request_room(None, RoomIntent::Creator).await;
    let ServerMessage::RoomInitiation {
        success: false,
        message: Some(message),
        ..
    } = reply
    else {
        panic!("second room was granted");
    };
    assert!(message.contains(first.as_str()));

    let mut mallory = TestPeer::attach(&coordinator, "Mallory");
    mallory.register().await;
    mallory
        .send(huddle_core::ClientMessage::RoomInitiation {
            room_id: Some(first.clone()),
            name: name("Eve"),
            role: RoomIntent::Participant,
        })
        .await;
    assert!(matches!(
        mallory.next(),
        Some(ServerMessage::RoomInitiation { success: false, .. })
    ));
    assert_eq!(coordinator.registry().snapshot(&first).await.unwrap().len(), 1);
}

#[tokio::test]
async fn room_initiation_without_initiation_registers_the_name() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut alice = TestPeer::attach(&coordinator, "Alice");

    let reply = alice.request_room(None, RoomIntent::Creator).await;
    assert!(matches!(
        reply,
        ServerMessage::RoomInitiation { success: true, .. }
    ));
    assert_eq!(coordinator.relay().name_of(alice.conn), Some(name("Alice")));
}

#[tokio::test]
async fn full_room_turns_joiners_away() {
    init_tracing();
    let coordinator = create_coordinator_with(RegistrySettings {
        capacity: 2,
        ..RegistrySettings::default()
    });
    let mut alice = TestPeer::attach(&coordinator, "Alice");
    let mut bob = TestPeer::attach(&coordinator, "Bob");
    let mut carol = TestPeer::attach(&coordinator, "Carol");

    let room = alice.create().await;
    bob.join(&room).await;
    match carol.join(&room).await {
        ServerMessage::RoomInitiation {
            success: false,
            message: Some(message),
            ..
        } => assert!(message.contains("full")),
        other => panic!("unexpected reply {other:?}"),
    }
}
