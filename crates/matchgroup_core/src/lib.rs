//! Match-group domain core.
//!
//! Pure domain logic for the match-group feature: value types, the error
//! taxonomy, storage port traits, and the group assembler. Depends on no
//! database or HTTP crate — `matchgroup_postgres` implements the ports,
//! `matchgroup_server` drives the service.

pub mod error;
pub mod ports;
pub mod service;
pub mod types;
