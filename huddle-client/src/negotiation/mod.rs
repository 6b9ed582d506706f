mod negotiation_session;
mod peer_connector;

pub use negotiation_session::*;
pub use peer_connector::*;
