
pub use mock_connector::*;
pub use signal_helpers::*;
