use huddle_client::ClientEvent;
use huddle_core::{ClientMessage, NegotiationState, RoomIntent, ServerMessage};

use crate::integration::init_tracing;
use crate::utils::{admitted, code, creator, drain, name, participant};

#[tokio::test]
async fn creator_registers_then_asks_for_a_room() {
    init_tracing();
    let (mut alice, _factory, mut out) = creator("Alice");

    alice.connect().await.unwrap();
    let event = alice
        .handle(ServerMessage::Initiation {
            success: true,
            message: None,
        })
        .await
        .unwrap();
    assert_eq!(event, Some(ClientEvent::Registered));

    assert_eq!(
        drain(&mut out),
        vec![
            ClientMessage::Initiation { name: name("Alice") },
            ClientMessage::RoomInitiation {
                room_id: None,
                name: name("Alice"),
                role: RoomIntent::Creator,
            },
        ]
    );

    let event = alice.handle(admitted("ABCD", &["Alice"], 1)).await.unwrap();
    assert_eq!(
        event,
        Some(ClientEvent::Admitted {
            room: code("ABCD"),
            participants: vec![name("Alice")],
        })
    );
    assert_eq!(alice.room(), Some(&code("ABCD")));
    assert_eq!(alice.roster().owner().map(|p| p.name.clone()), Some(name("Alice")));
    assert!(drain(&mut out).is_empty(), "alone in the room, nothing to offer");
}

#[tokio::test]
async fn joiner_offers_to_every_existing_member() {
    init_tracing();
    let (mut carol, factory, mut out) = participant("Carol", "ABCD");

    carol
        .handle(ServerMessage::Initiation {
            success: true,
            message: None,
        })
        .await
        .unwrap();
    let sent = drain(&mut out);
    assert_eq!(
        sent,
        vec![ClientMessage::RoomInitiation {
            room_id: Some(code("ABCD")),
            name: name("Carol"),
            role: RoomIntent::Participant,
        }]
    );

    carol
        .handle(admitted("ABCD", &["Alice", "Bob", "Carol"], 3))
        .await
        .unwrap();

    let offered: Vec<String> = drain(&mut out)
        .into_iter()
        .filter_map(|msg| match msg {
            ClientMessage::Offer { name, .. } => Some(name.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(offered, vec!["Alice", "Bob"]);

    for remote in ["Alice", "Bob"] {
        assert_eq!(
            carol.session_state(&name(remote)),
            Some(NegotiationState::OfferSent)
        );
        assert_eq!(factory.created_for(&name(remote)), 1);
    }
    assert_eq!(carol.roster().len(), 3);
}

#[tokio::test]
async fn rejection_is_reported_and_creates_nothing() {
    init_tracing();
    let (mut bob, factory, mut out) = participant("Bob", "ZZZZ");

    let event = bob
        .handle(ServerMessage::room_rejected(
            Some(code("ZZZZ")),
            "room ZZZZ does not exist",
        ))
        .await
        .unwrap();
    assert_eq!(
        event,
        Some(ClientEvent::AdmissionRejected("room ZZZZ does not exist".into()))
    );
    assert!(bob.room().is_none());
    assert!(bob.roster().is_empty());
    assert_eq!(factory.created_for(&name("Alice")), 0);
    assert!(drain(&mut out).is_empty());
}
