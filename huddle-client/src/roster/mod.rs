mod peer_roster_view;

pub use peer_roster_view::*;
