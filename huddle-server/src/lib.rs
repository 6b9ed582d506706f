pub mod app;
pub mod churn;
pub mod config;
pub mod error;
pub mod room;
pub mod signaling;

pub use app::{build_coordinator, router};
pub use churn::{ChurnCoordinator, ChurnReport, Observed, PairLedger, PairRecord};
pub use config::{ConfigError, RegistrySettings, ServerConfig};
pub use error::{AdmissionError, RoutingError};
pub use room::{LeaveOutcome, RoomRegistry};
pub use signaling::SignalingRelay;
