use huddle_server::signaling::{Availability, check_availability};

use crate::integration::{create_coordinator, init_tracing};
use crate::utils::TestPeer;

#[tokio::test]
async fn reports_name_and_room_separately() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut alice = TestPeer::attach(&coordinator, "Alice");
    let room = alice.create().await;

    assert_eq!(
        check_availability(&coordinator, "Bob", room.as_str()).await,
        Availability {
            name_success: true,
            room_success: true
        }
    );
    assert_eq!(
        check_availability(&coordinator, "Alice", room.as_str()).await,
        Availability {
            name_success: false,
            room_success: true
        }
    );
    assert_eq!(
        check_availability(&coordinator, "Bob", "NOPE").await,
        Availability {
            name_success: true,
            room_success: false
        }
    );
    assert_eq!(
        check_availability(&coordinator, "", "").await,
        Availability {
            name_success: false,
            room_success: false
        }
    );
}

#[tokio::test]
async fn lowercase_codes_are_accepted() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut alice = TestPeer::attach(&coordinator, "Alice");
    let room = alice.create().await;

    let lower = room.as_str().to_lowercase();
    assert!(check_availability(&coordinator, "Bob", &lower).await.room_success);
}

#[tokio::test]
async fn destroyed_room_is_unavailable() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut alice = TestPeer::attach(&coordinator, "Alice");
    let room = alice.create().await;
    alice.leave().await;

    let availability = check_availability(&coordinator, "Alice", room.as_str()).await;
    assert!(!availability.room_success);
    assert!(availability.name_success);
}
