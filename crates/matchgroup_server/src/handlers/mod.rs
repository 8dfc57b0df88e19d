pub mod health;
pub mod match_groups;
pub mod session;
