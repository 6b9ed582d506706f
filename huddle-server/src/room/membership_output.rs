use huddle_core::{ConnectionId, ServerMessage};

/// Where a room actor sends admission replies and membership notices.
///
/// The actor delivers while it handles the mutation, so every member sees the
/// room's events in `seq` order.
pub trait MembershipOutput: Send + Sync {
    /// Returns false when the connection is gone.
    fn deliver(&self, conn: ConnectionId, msg: ServerMessage) -> bool;
}
