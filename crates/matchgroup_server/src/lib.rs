//! Match-group REST server.
//!
//! Exposes the router and middleware so that integration tests can drive the
//! exact app the binary serves (see `tests/`).

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
