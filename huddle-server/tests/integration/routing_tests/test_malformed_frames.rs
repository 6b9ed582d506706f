use huddle_core::ServerMessage;
use huddle_server::signaling::{INCORRECT_DATA_FORMAT, UNRECOGNIZED_COMMAND, parse_frame};

use crate::integration::{create_coordinator, init_tracing};
use crate::utils::TestPeer;

#[test]
fn malformed_and_unknown_frames_are_told_apart() {
    assert_eq!(parse_frame("{"), Err(INCORRECT_DATA_FORMAT));
    assert_eq!(parse_frame(r#"{"name":"Alice"}"#), Err(INCORRECT_DATA_FORMAT));
    assert_eq!(
        parse_frame(r#"{"type":"roomInitiation","name":"Alice","role":"admin"}"#),
        Err(INCORRECT_DATA_FORMAT)
    );
    assert_eq!(parse_frame(r#"{"type":"kick","name":"Bob"}"#), Err(UNRECOGNIZED_COMMAND));
}

#[tokio::test]
async fn leaving_outside_a_room_is_an_error_reply() {
    init_tracing();
    let coordinator = create_coordinator();
    let mut alice = TestPeer::attach(&coordinator, "Alice");
    alice.register().await;

    alice.leave().await;
    assert_eq!(alice.next(), Some(ServerMessage::error("not in a room")));
    assert_eq!(coordinator.relay().connection_count(), 1);
}
