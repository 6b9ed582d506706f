pub mod client;
pub mod config;
pub mod error;
pub mod negotiation;
pub mod roster;
pub mod transport;

pub use client::{ClientEvent, RelaySink, RoomClient};
pub use config::ClientConfig;
pub use error::SessionError;
pub use negotiation::{ConnectorFactory, NegotiationSession, PeerConnector};
pub use roster::PeerRosterView;
pub use transport::{TransportEvent, WebRtcConnector, WebRtcConnectorFactory};
