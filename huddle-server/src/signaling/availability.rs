use crate::churn::ChurnCoordinator;
use axum::Json;
use axum::extract::{Query, State};
use huddle_core::{PeerName, RoomCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "roomID")]
    pub room_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub name_success: bool,
    pub room_success: bool,
}

/// Pre-flight check for the landing form: is the name free, does the room accept members.
pub async fn availability_handler(
    Query(query): Query<AvailabilityQuery>,
    State(coordinator): State<ChurnCoordinator>,
) -> Json<Availability> {
    let availability = check_availability(&coordinator, &query.name, &query.room_id).await;
    debug!(name = %query.name, room = %query.room_id, ?availability, "Availability check");
    Json(availability)
}

pub async fn check_availability(
    coordinator: &ChurnCoordinator,
    name: &str,
    room_id: &str,
) -> Availability {
    let registry = coordinator.registry();
    let room = RoomCode::parse(room_id).ok();

    let room_success = match &room {
        Some(code) => registry.is_open(code).await,
        None => false,
    };

    let name_success = match PeerName::parse(name) {
        Ok(name) => match &room {
            Some(code) if room_success => registry
                .snapshot(code)
                .await
                .map(|snapshot| !snapshot.contains(&name))
                .unwrap_or(true),
            _ => !registry.is_seated(&name),
        },
        Err(_) => false,
    };

    Availability {
        name_success,
        room_success,
    }
}
