//! Core domain types for the match-group feature.
//! Pure value types — no sqlx, no axum. Wire names are camelCase because the
//! public API contract predates this service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Session ──────────────────────────────────────────────────

/// Server-side record linking an opaque cookie value to a user identity.
/// Looked up by the session guard, created by the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

// ── Candidate evaluation ─────────────────────────────────────

/// Lightweight projection of a user used only during candidate evaluation.
/// Immutable for the duration of one assembly run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForFilter {
    pub user_id: String,
    pub user_name: String,
    pub office_name: String,
    pub department_name: String,
    pub skill_names: Vec<String>,
}

/// Scope predicate applied to the candidate's department or office,
/// relative to the owner's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeFilter {
    /// Candidate must share the owner's department/office.
    OnlyMine,
    /// Candidate must NOT share the owner's department/office.
    ExcludeMine,
    /// No constraint.
    None,
}

impl Default for ScopeFilter {
    fn default() -> Self {
        Self::None
    }
}

/// Group-creation parameters. Supplied by the caller, read-only during
/// assembly. The scope and skill filters form the configurable predicate
/// set evaluated by `UserStore::judge_users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchGroupConfig {
    pub owner_id: String,
    pub match_group_name: String,
    pub description: String,
    pub num_of_members: u32,
    #[serde(default)]
    pub department_filter: ScopeFilter,
    #[serde(default)]
    pub office_filter: ScopeFilter,
    #[serde(default)]
    pub skill_filter: Vec<String>,
    #[serde(default)]
    pub never_matched_filter: bool,
}

// ── Persisted group ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub file_id: String,
    pub file_name: String,
}

/// Full member record as persisted with a group. Produced from a
/// `UserForFilter` by `UserStore::convert_id_to_value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchGroupMember {
    pub user_id: String,
    pub user_name: String,
    pub user_icon: FileRecord,
    pub office_name: String,
}

/// Group lifecycle status. Groups are created `open`; `close` exists for
/// the later lifecycle and is never written by the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchGroupStatus {
    Open,
    Close,
}

impl MatchGroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "close" => Some(Self::Close),
            _ => None,
        }
    }
}

/// The persisted result of a successful assembly. Members are ordered with
/// the owner first; immutable from this core's perspective once inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchGroupDetail {
    pub match_group_id: Uuid,
    pub match_group_name: String,
    pub description: String,
    pub members: Vec<MatchGroupMember>,
    pub status: MatchGroupStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}
