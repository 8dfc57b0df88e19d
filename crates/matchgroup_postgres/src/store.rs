//! Postgres-backed stores for sessions, users, and match groups.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use matchgroup_core::error::MatchError;
use matchgroup_core::ports::{MatchGroupStore, Result, SessionStore, UserStore};
use matchgroup_core::types::*;

// ── PgSessionStore ───────────────────────────────────────────

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn get_session_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        let row = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            r#"
            SELECT session_id, user_id, created_at
            FROM match_app.sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(row.map(|(session_id, user_id, created_at)| Session {
            session_id,
            user_id,
            created_at,
        }))
    }

    async fn create_session(&self, user_id: &str) -> Result<Session> {
        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        sqlx::query(
            r#"
            INSERT INTO match_app.sessions (session_id, user_id, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&session.session_id)
        .bind(&session.user_id)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(session)
    }
}

// ── PgUserStore ──────────────────────────────────────────────

type FilterRow = (String, String, String, String, Vec<String>);

fn filter_row_to_user(row: FilterRow) -> UserForFilter {
    let (user_id, user_name, office_name, department_name, skill_names) = row;
    UserForFilter {
        user_id,
        user_name,
        office_name,
        department_name,
        skill_names,
    }
}

const FILTER_PROJECTION_SQL: &str = r#"
    SELECT u.user_id, u.user_name, o.office_name, d.department_name,
           COALESCE(
               array_agg(s.skill_name ORDER BY s.skill_name)
                   FILTER (WHERE s.skill_name IS NOT NULL),
               '{}'
           ) AS skill_names
    FROM match_app.users u
    JOIN match_app.offices o ON o.office_id = u.office_id
    JOIN match_app.department_members dm ON dm.user_id = u.user_id
    JOIN match_app.departments d ON d.department_id = dm.department_id
    LEFT JOIN match_app.skill_members sm ON sm.user_id = u.user_id
    LEFT JOIN match_app.skills s ON s.skill_id = sm.skill_id
"#;

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_user_for_filter(&self, user_id: &str) -> Result<UserForFilter> {
        let sql = format!(
            "{FILTER_PROJECTION_SQL}
             WHERE u.user_id = $1
             GROUP BY u.user_id, u.user_name, o.office_name, d.department_name"
        );
        let row = sqlx::query_as::<_, FilterRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        row.map(filter_row_to_user)
            .ok_or_else(|| MatchError::NotFound(format!("user {user_id}")))
    }

    async fn get_users_with_filter(&self) -> Result<Vec<UserForFilter>> {
        let sql = format!(
            "{FILTER_PROJECTION_SQL}
             GROUP BY u.user_id, u.user_name, o.office_name, d.department_name"
        );
        let rows = sqlx::query_as::<_, FilterRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(rows.into_iter().map(filter_row_to_user).collect())
    }

    async fn judge_users(
        &self,
        candidate: &UserForFilter,
        owner: &UserForFilter,
        config: &MatchGroupConfig,
    ) -> Result<bool> {
        Ok(violates_filter_config(candidate, owner, config))
    }

    async fn convert_id_to_value(&self, user: &UserForFilter) -> Result<MatchGroupMember> {
        let row = sqlx::query_as::<_, (String, String, String, String, String)>(
            r#"
            SELECT u.user_id, u.user_name,
                   COALESCE(f.file_id::text, '') AS file_id,
                   COALESCE(f.file_name, '') AS file_name,
                   o.office_name
            FROM match_app.users u
            JOIN match_app.offices o ON o.office_id = u.office_id
            LEFT JOIN match_app.files f ON f.file_id = u.user_icon_id
            WHERE u.user_id = $1
            "#,
        )
        .bind(&user.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        let (user_id, user_name, file_id, file_name, office_name) =
            row.ok_or_else(|| MatchError::NotFound(format!("user {}", user.user_id)))?;
        Ok(MatchGroupMember {
            user_id,
            user_name,
            user_icon: FileRecord { file_id, file_name },
            office_name,
        })
    }

    async fn get_user_id_by_credentials(
        &self,
        mail: &str,
        password_digest: &str,
    ) -> Result<Option<String>> {
        let row = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT user_id
            FROM match_app.users
            WHERE mail = $1 AND password_digest = $2
            "#,
        )
        .bind(mail)
        .bind(password_digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(row.map(|(user_id,)| user_id))
    }
}

/// The configurable predicate set: scope filters compare the candidate's
/// department/office against the owner's, the skill filter requires every
/// listed skill. Returns true when the candidate should be rejected.
fn violates_filter_config(
    candidate: &UserForFilter,
    owner: &UserForFilter,
    config: &MatchGroupConfig,
) -> bool {
    let scope_violated = |filter: ScopeFilter, candidate_val: &str, owner_val: &str| match filter {
        ScopeFilter::OnlyMine => candidate_val != owner_val,
        ScopeFilter::ExcludeMine => candidate_val == owner_val,
        ScopeFilter::None => false,
    };

    if scope_violated(
        config.department_filter,
        &candidate.department_name,
        &owner.department_name,
    ) {
        return true;
    }
    if scope_violated(config.office_filter, &candidate.office_name, &owner.office_name) {
        return true;
    }
    config
        .skill_filter
        .iter()
        .any(|required| !candidate.skill_names.contains(required))
}

// ── PgMatchGroupStore ────────────────────────────────────────

pub struct PgMatchGroupStore {
    pool: PgPool,
}

impl PgMatchGroupStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchGroupStore for PgMatchGroupStore {
    async fn insert_match_group(&self, detail: &MatchGroupDetail) -> Result<()> {
        // Group row and member rows go in one transaction so an abandoned
        // insert never leaves a partial group behind.
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;
        sqlx::query(
            r#"
            INSERT INTO match_app.match_groups
                (match_group_id, match_group_name, description, status, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(detail.match_group_id)
        .bind(&detail.match_group_name)
        .bind(&detail.description)
        .bind(detail.status.as_str())
        .bind(&detail.created_by)
        .bind(detail.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        for (ordinal, member) in detail.members.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO match_app.match_group_members (match_group_id, user_id, ordinal)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(detail.match_group_id)
            .bind(&member.user_id)
            .bind(ordinal as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;
        }
        tx.commit().await.map_err(|e| anyhow!(e))?;
        tracing::debug!(
            match_group_id = %detail.match_group_id,
            members = detail.members.len(),
            "match group inserted"
        );
        Ok(())
    }

    async fn get_match_group_detail_by_id(
        &self,
        match_group_id: Uuid,
    ) -> Result<Option<MatchGroupDetail>> {
        let group = sqlx::query_as::<_, (Uuid, String, String, String, String, DateTime<Utc>)>(
            r#"
            SELECT match_group_id, match_group_name, description, status, created_by, created_at
            FROM match_app.match_groups
            WHERE match_group_id = $1
            "#,
        )
        .bind(match_group_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        let Some((id, name, description, status, created_by, created_at)) = group else {
            return Ok(None);
        };
        let status = MatchGroupStatus::from_str(&status)
            .ok_or_else(|| anyhow!("unknown match group status: {status}"))?;

        let members = sqlx::query_as::<_, (String, String, String, String, String)>(
            r#"
            SELECT u.user_id, u.user_name,
                   COALESCE(f.file_id::text, '') AS file_id,
                   COALESCE(f.file_name, '') AS file_name,
                   o.office_name
            FROM match_app.match_group_members m
            JOIN match_app.users u ON u.user_id = m.user_id
            JOIN match_app.offices o ON o.office_id = u.office_id
            LEFT JOIN match_app.files f ON f.file_id = u.user_icon_id
            WHERE m.match_group_id = $1
            ORDER BY m.ordinal
            "#,
        )
        .bind(match_group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?
        .into_iter()
        .map(|(user_id, user_name, file_id, file_name, office_name)| MatchGroupMember {
            user_id,
            user_name,
            user_icon: FileRecord { file_id, file_name },
            office_name,
        })
        .collect();

        Ok(Some(MatchGroupDetail {
            match_group_id: id,
            match_group_name: name,
            description,
            members,
            status,
            created_by,
            created_at,
        }))
    }

    async fn get_user_ids_before_matched(&self, owner_id: &str) -> Result<Vec<String>> {
        let rows = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT DISTINCT other.user_id
            FROM match_app.match_group_members mine
            JOIN match_app.match_group_members other
              ON other.match_group_id = mine.match_group_id
            WHERE mine.user_id = $1 AND other.user_id <> $1
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(rows.into_iter().map(|(user_id,)| user_id).collect())
    }

    async fn has_skill_name_record(&self, skill_name: &str) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (SELECT 1 FROM match_app.skills WHERE skill_name = $1)
            "#,
        )
        .bind(skill_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(exists)
    }
}

// ── PgStores ─────────────────────────────────────────────────

/// All adapters over one pool, built once at startup.
pub struct PgStores {
    pub sessions: PgSessionStore,
    pub users: PgUserStore,
    pub match_groups: PgMatchGroupStore,
}

impl PgStores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            sessions: PgSessionStore::new(pool.clone()),
            users: PgUserStore::new(pool.clone()),
            match_groups: PgMatchGroupStore::new(pool),
        }
    }
}
