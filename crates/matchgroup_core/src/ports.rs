//! Storage port traits for the match-group feature.
//! Implemented by matchgroup_postgres — core logic depends only on these traits.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::MatchError;
use crate::types::*;

pub type Result<T> = std::result::Result<T, MatchError>;

/// Session lookup and creation. The guard only ever reads; the login
/// endpoint is the single writer.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve a cookie value to a session. `None` on an unknown id —
    /// a miss is not an error.
    async fn get_session_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    /// Create a fresh session for a user and return it.
    async fn create_session(&self, user_id: &str) -> Result<Session>;
}

/// User lookups consumed during candidate evaluation.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch the filter projection for one user.
    /// Errors with `NotFound` when the user does not exist.
    async fn get_user_for_filter(&self, user_id: &str) -> Result<UserForFilter>;

    /// Snapshot of every filterable user. Fetched once per assembly run,
    /// never re-fetched inside the sampling loop.
    async fn get_users_with_filter(&self) -> Result<Vec<UserForFilter>>;

    /// Configurable predicate over (candidate, owner, config).
    /// Returns true when the candidate should be REJECTED.
    async fn judge_users(
        &self,
        candidate: &UserForFilter,
        owner: &UserForFilter,
        config: &MatchGroupConfig,
    ) -> Result<bool>;

    /// Expand a filter projection into the full member record shape.
    async fn convert_id_to_value(&self, user: &UserForFilter) -> Result<MatchGroupMember>;

    /// Resolve a user id from login credentials (mail + SHA-256 hex digest
    /// of the password). `None` on a mismatch.
    async fn get_user_id_by_credentials(
        &self,
        mail: &str,
        password_digest: &str,
    ) -> Result<Option<String>>;
}

/// Match-group persistence plus the lookups its filters consume.
#[async_trait]
pub trait MatchGroupStore: Send + Sync {
    /// Persist a fully assembled group (group row + member rows).
    async fn insert_match_group(&self, detail: &MatchGroupDetail) -> Result<()>;

    /// Fetch the persisted detail, members ordered as inserted.
    async fn get_match_group_detail_by_id(
        &self,
        match_group_id: Uuid,
    ) -> Result<Option<MatchGroupDetail>>;

    /// Every user id the given owner has previously been grouped with.
    async fn get_user_ids_before_matched(&self, owner_id: &str) -> Result<Vec<String>>;

    /// Whether a skill name is registered.
    async fn has_skill_name_record(&self, skill_name: &str) -> Result<bool>;
}
