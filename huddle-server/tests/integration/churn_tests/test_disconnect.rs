use huddle_core::ServerMessage;

use crate::integration::{create_coordinator, init_tracing};
use crate::utils::{TestPeer, name};

#[tokio::test]
async fn dropped_member_is_announced_without_confirmation() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut alice = TestPeer::attach(&coordinator, "Alice");
    let mut bob = TestPeer::attach(&coordinator, "Bob");
    let room = alice.create().await;
    bob.join(&room).await;
    alice.drain();

    let report = coordinator.disconnect(bob.conn).await.unwrap();
    assert_eq!(report.departed, name("Bob"));
    assert_eq!(report.closed_pairs.len(), 1);
    assert_eq!(report.notified, 1);
    assert!(!report.room_destroyed);

    assert_eq!(
        alice.drain(),
        vec![ServerMessage::PeerLeavingRoom {
            name: name("Bob"),
            room_destroy: false,
            seq: 3,
        }]
    );
    assert!(bob.drain().is_empty());
    assert_eq!(coordinator.relay().connection_count(), 1);
    assert!(!coordinator.registry().is_seated(&name("Bob")));
}

#[tokio::test]
async fn dropped_owner_destroys_the_room() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut alice = TestPeer::attach(&coordinator, "Alice");
    let mut bob = TestPeer::attach(&coordinator, "Bob");
    let room = alice.create().await;
    bob.join(&room).await;

    alice.disconnect().await;

    assert!(matches!(
        bob.drain().as_slice(),
        [ServerMessage::PeerLeavingRoom {
            room_destroy: true,
            ..
        }]
    ));
    assert!(!coordinator.registry().contains(&room));
    assert!(coordinator.ledger().pairs(&room).is_empty());
}

#[tokio::test]
async fn disconnect_before_admission_is_harmless() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut bob = TestPeer::attach(&coordinator, "Bob");
    bob.register().await;

    assert!(coordinator.disconnect(bob.conn).await.is_none());
    assert_eq!(coordinator.relay().connection_count(), 0);
}
