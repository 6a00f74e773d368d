//! HTTP server for shelfline. Library target so integration tests can
//! build the router without spawning the binary.

pub mod api;
pub mod state;
