mod transport_event;
mod webrtc_connector;

pub use transport_event::*;
pub use webrtc_connector::*;
