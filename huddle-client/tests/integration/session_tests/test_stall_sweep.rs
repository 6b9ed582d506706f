use huddle_core::{NegotiationState, ServerMessage, SessionDescription};
use std::time::Duration;
use tokio::time::Instant;

use crate::integration::init_tracing;
use crate::utils::{admitted, name, participant};

#[tokio::test(start_paused = true)]
async fn stalled_sessions_are_closed_and_reported() {
    init_tracing();
    let (mut carol, factory, _out) = participant("Carol", "ABCD");
    carol
        .handle(admitted("ABCD", &["Alice", "Bob", "Carol"], 3))
        .await
        .unwrap();

    carol
        .handle(ServerMessage::Answer {
            name: name("Alice"),
            answer: SessionDescription::answer("answer-from-Alice"),
        })
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(10)).await;
    assert!(carol.sweep_stalled(Instant::now()).await.is_empty());

    tokio::time::advance(carol.config().negotiation_timeout).await;
    let stalled = carol.sweep_stalled(Instant::now()).await;
    assert_eq!(stalled, vec![name("Bob")]);

    assert_eq!(
        carol.session_state(&name("Bob")),
        Some(NegotiationState::Closed)
    );
    assert_eq!(
        carol.session_state(&name("Alice")),
        Some(NegotiationState::Connected)
    );
    assert!(factory.connector_for(&name("Bob")).unwrap().was_closed());

    // already closed, not reported twice
    assert!(carol.sweep_stalled(Instant::now()).await.is_empty());
}
