mod client_event;
mod relay_sink;
mod room_client;

pub use client_event::*;
pub use relay_sink::*;
pub use room_client::*;
