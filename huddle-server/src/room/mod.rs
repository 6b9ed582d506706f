mod membership_output;
mod room;
mod room_command;
mod room_registry;

pub use membership_output::*;
pub use room::*;
pub use room_command::*;
pub use room_registry::*;
