use huddle_core::IceServerConfig;
use std::time::Duration;

pub const DEFAULT_STUN_SERVER: &str = "stun:stun.l.google.com:19302";

/// How long a pair may stay short of `CONNECTED` before it is given up on.
pub const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub negotiation_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_SERVER.to_owned()],
                username: None,
                credential: None,
            }],
            negotiation_timeout: DEFAULT_NEGOTIATION_TIMEOUT,
        }
    }
}
