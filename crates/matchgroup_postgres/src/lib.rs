//! Postgres implementations of the matchgroup_core port traits.
//!
//! Each adapter is a newtype wrapping PgPool. All SQL is runtime-checked
//! (sqlx::query, not sqlx::query!) to avoid a compile-time DB requirement.
//! Schema lives in `migrations/0001_match_app.sql` (schema `match_app`).

mod store;

pub use store::{PgMatchGroupStore, PgSessionStore, PgStores, PgUserStore};
