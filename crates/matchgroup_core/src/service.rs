//! MatchGroupService — the group assembler.
//!
//! Takes port traits via `Arc<dyn PortTrait>` so that the same logic works
//! against Postgres or test doubles. The sampling loop draws candidates
//! without replacement from a pool snapshot fetched once per run, so work is
//! bounded by the pool size; the wall-clock deadline bounds worst-case
//! latency when the filters are restrictive.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use uuid::Uuid;

use crate::{
    error::MatchError,
    ports::{MatchGroupStore, Result, UserStore},
    types::*,
};

/// Default assembly deadline (50 seconds).
pub const DEFAULT_ASSEMBLY_TIMEOUT: Duration = Duration::from_millis(50_000);

pub struct MatchGroupService {
    users: Arc<dyn UserStore>,
    match_groups: Arc<dyn MatchGroupStore>,
}

impl MatchGroupService {
    pub fn new(users: Arc<dyn UserStore>, match_groups: Arc<dyn MatchGroupStore>) -> Self {
        Self {
            users,
            match_groups,
        }
    }

    /// Assemble and persist a match group around `config.owner_id`.
    ///
    /// Returns `Ok(None)` when the deadline elapses or the candidate pool is
    /// exhausted before the group reaches `num_of_members` — nothing is
    /// persisted in that case. Store failures propagate unchanged.
    pub async fn create_match_group(
        &self,
        config: &MatchGroupConfig,
        timeout: Option<Duration>,
    ) -> Result<Option<MatchGroupDetail>> {
        if config.num_of_members == 0 {
            return Err(MatchError::InvalidInput(
                "numOfMembers must be >= 1".into(),
            ));
        }
        let timeout = timeout.unwrap_or(DEFAULT_ASSEMBLY_TIMEOUT);

        let owner = self.users.get_user_for_filter(&config.owner_id).await?;
        // The owner is always the first member and counts toward the target.
        let mut members: Vec<MatchGroupMember> =
            vec![self.users.convert_id_to_value(&owner).await?];

        let mut pool = self.users.get_users_with_filter().await?;
        let started = Instant::now();

        while members.len() < config.num_of_members as usize {
            // `>=` so a zero timeout abandons before drawing anything.
            if started.elapsed() >= timeout || pool.is_empty() {
                tracing::error!(
                    owner_id = %config.owner_id,
                    found = members.len(),
                    wanted = config.num_of_members,
                    "not all members found before timeout"
                );
                return Ok(None);
            }

            // Sampling without replacement: remove exactly one candidate at
            // a uniformly random index.
            let idx = rand::thread_rng().gen_range(0..pool.len());
            let candidate = pool.swap_remove(idx);

            if is_self(&candidate, &owner) {
                tracing::debug!(user_id = %candidate.user_id, "candidate is the owner, skipped");
                continue;
            }
            if self.users.judge_users(&candidate, &owner, config).await? {
                tracing::debug!(user_id = %candidate.user_id, "candidate rejected by filter config");
                continue;
            }
            if config.never_matched_filter {
                let history = self
                    .match_groups
                    .get_user_ids_before_matched(&config.owner_id)
                    .await?;
                if !passes_never_matched(&history, &candidate.user_id) {
                    tracing::debug!(
                        user_id = %candidate.user_id,
                        "candidate rejected by never-matched filter"
                    );
                    continue;
                }
            }

            members.push(self.users.convert_id_to_value(&candidate).await?);
            tracing::info!(user_id = %candidate.user_id, "candidate added to members");
        }

        let match_group_id = Uuid::new_v4();
        let detail = MatchGroupDetail {
            match_group_id,
            match_group_name: config.match_group_name.clone(),
            description: config.description.clone(),
            members,
            status: MatchGroupStatus::Open,
            created_by: config.owner_id.clone(),
            created_at: chrono::Utc::now(),
        };
        self.match_groups.insert_match_group(&detail).await?;
        tracing::info!(%match_group_id, created_by = %config.owner_id, "match group persisted");

        self.match_groups
            .get_match_group_detail_by_id(match_group_id)
            .await
    }

    /// Fetch a persisted group by id.
    pub async fn get_match_group(
        &self,
        match_group_id: Uuid,
    ) -> Result<Option<MatchGroupDetail>> {
        self.match_groups
            .get_match_group_detail_by_id(match_group_id)
            .await
    }

    /// First skill name in `skill_names` with no registered record, scanning
    /// in order and short-circuiting; `None` when all are registered.
    pub async fn check_skills_registered(
        &self,
        skill_names: &[String],
    ) -> Result<Option<String>> {
        for skill_name in skill_names {
            if !self.match_groups.has_skill_name_record(skill_name).await? {
                return Ok(Some(skill_name.clone()));
            }
        }
        Ok(None)
    }
}

// ── Filter pipeline decision points ──────────────────────────

/// Self-check: the owner is already seeded and must never be drawn twice.
fn is_self(candidate: &UserForFilter, owner: &UserForFilter) -> bool {
    candidate.user_id == owner.user_id
}

/// Never-matched check: true when the candidate does NOT appear in the
/// owner's prior-group history.
fn passes_never_matched(history: &[String], candidate_id: &str) -> bool {
    history.iter().all(|matched_id| matched_id != candidate_id)
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::ports::MatchGroupStore;

    // ── In-memory port doubles ───────────────────────────────

    fn uff(id: &str) -> UserForFilter {
        UserForFilter {
            user_id: id.into(),
            user_name: format!("user {id}"),
            office_name: "hq".into(),
            department_name: "eng".into(),
            skill_names: vec![],
        }
    }

    #[derive(Default)]
    struct StubUserStore {
        pool: Vec<UserForFilter>,
        rejected: HashSet<String>,
        judge_calls: AtomicUsize,
    }

    #[async_trait]
    impl UserStore for StubUserStore {
        async fn get_user_for_filter(&self, user_id: &str) -> Result<UserForFilter> {
            self.pool
                .iter()
                .find(|u| u.user_id == user_id)
                .cloned()
                .ok_or_else(|| MatchError::NotFound(format!("user {user_id}")))
        }

        async fn get_users_with_filter(&self) -> Result<Vec<UserForFilter>> {
            Ok(self.pool.clone())
        }

        async fn judge_users(
            &self,
            candidate: &UserForFilter,
            _owner: &UserForFilter,
            _config: &MatchGroupConfig,
        ) -> Result<bool> {
            self.judge_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rejected.contains(&candidate.user_id))
        }

        async fn convert_id_to_value(&self, user: &UserForFilter) -> Result<MatchGroupMember> {
            Ok(MatchGroupMember {
                user_id: user.user_id.clone(),
                user_name: user.user_name.clone(),
                user_icon: FileRecord {
                    file_id: String::new(),
                    file_name: String::new(),
                },
                office_name: user.office_name.clone(),
            })
        }

        async fn get_user_id_by_credentials(
            &self,
            _mail: &str,
            _password_digest: &str,
        ) -> Result<Option<String>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct MemoryGroupStore {
        groups: Mutex<HashMap<Uuid, MatchGroupDetail>>,
        history: Vec<String>,
        history_calls: AtomicUsize,
        skills: HashSet<String>,
    }

    #[async_trait]
    impl MatchGroupStore for MemoryGroupStore {
        async fn insert_match_group(&self, detail: &MatchGroupDetail) -> Result<()> {
            self.groups
                .lock()
                .unwrap()
                .insert(detail.match_group_id, detail.clone());
            Ok(())
        }

        async fn get_match_group_detail_by_id(
            &self,
            match_group_id: Uuid,
        ) -> Result<Option<MatchGroupDetail>> {
            Ok(self.groups.lock().unwrap().get(&match_group_id).cloned())
        }

        async fn get_user_ids_before_matched(&self, _owner_id: &str) -> Result<Vec<String>> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.history.clone())
        }

        async fn has_skill_name_record(&self, skill_name: &str) -> Result<bool> {
            Ok(self.skills.contains(skill_name))
        }
    }

    fn service(
        users: StubUserStore,
        groups: MemoryGroupStore,
    ) -> (MatchGroupService, Arc<StubUserStore>, Arc<MemoryGroupStore>) {
        let users = Arc::new(users);
        let groups = Arc::new(groups);
        (
            MatchGroupService::new(Arc::clone(&users) as _, Arc::clone(&groups) as _),
            users,
            groups,
        )
    }

    fn config(owner: &str, n: u32) -> MatchGroupConfig {
        MatchGroupConfig {
            owner_id: owner.into(),
            match_group_name: "lunch".into(),
            description: "weekly lunch group".into(),
            num_of_members: n,
            department_filter: ScopeFilter::None,
            office_filter: ScopeFilter::None,
            skill_filter: vec![],
            never_matched_filter: false,
        }
    }

    // ── create_match_group ───────────────────────────────────

    #[tokio::test]
    async fn assembles_full_group_owner_first() {
        let users = StubUserStore {
            pool: vec![uff("u1"), uff("u2"), uff("u3")],
            ..Default::default()
        };
        let (svc, _, _) = service(users, MemoryGroupStore::default());

        let detail = svc
            .create_match_group(&config("u1", 3), None)
            .await
            .unwrap()
            .expect("group should assemble");

        assert_eq!(detail.members.len(), 3);
        assert_eq!(detail.members[0].user_id, "u1");
        assert_eq!(detail.status, MatchGroupStatus::Open);
        assert_eq!(detail.created_by, "u1");
        let ids: HashSet<_> = detail.members.iter().map(|m| m.user_id.clone()).collect();
        assert_eq!(ids, HashSet::from(["u1".into(), "u2".into(), "u3".into()]));
    }

    #[tokio::test]
    async fn owner_alone_satisfies_group_of_one() {
        let users = StubUserStore {
            pool: vec![uff("u1")],
            ..Default::default()
        };
        let (svc, _, _) = service(users, MemoryGroupStore::default());

        let detail = svc
            .create_match_group(&config("u1", 1), None)
            .await
            .unwrap()
            .expect("group of one is just the owner");
        assert_eq!(detail.members.len(), 1);
        assert_eq!(detail.members[0].user_id, "u1");
    }

    #[tokio::test]
    async fn undersized_pool_returns_none_and_persists_nothing() {
        let users = StubUserStore {
            pool: vec![uff("u1"), uff("u2")],
            ..Default::default()
        };
        let (svc, _, groups) = service(users, MemoryGroupStore::default());

        let result = svc.create_match_group(&config("u1", 3), None).await.unwrap();
        assert!(result.is_none());
        assert!(groups.groups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn predicate_rejection_can_exhaust_the_pool() {
        let users = StubUserStore {
            pool: vec![uff("u1"), uff("u2"), uff("u3")],
            rejected: HashSet::from(["u2".into()]),
            ..Default::default()
        };
        let (svc, _, _) = service(users, MemoryGroupStore::default());

        // Only u3 survives the predicate; a group of 3 cannot form.
        let result = svc.create_match_group(&config("u1", 3), None).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn predicate_rejection_leaves_enough_for_smaller_group() {
        let users = StubUserStore {
            pool: vec![uff("u1"), uff("u2"), uff("u3")],
            rejected: HashSet::from(["u2".into()]),
            ..Default::default()
        };
        let (svc, _, _) = service(users, MemoryGroupStore::default());

        let detail = svc
            .create_match_group(&config("u1", 2), None)
            .await
            .unwrap()
            .expect("u1 + u3 fit a group of two");
        let ids: Vec<_> = detail.members.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u3"]);
    }

    #[tokio::test]
    async fn zero_timeout_always_abandons() {
        let users = StubUserStore {
            pool: vec![uff("u1"), uff("u2"), uff("u3")],
            ..Default::default()
        };
        let (svc, _, groups) = service(users, MemoryGroupStore::default());

        let result = svc
            .create_match_group(&config("u1", 2), Some(Duration::ZERO))
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(groups.groups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn never_matched_filter_excludes_history() {
        let users = StubUserStore {
            pool: vec![uff("u1"), uff("u2"), uff("u3")],
            ..Default::default()
        };
        let groups = MemoryGroupStore {
            history: vec!["u2".into()],
            ..Default::default()
        };
        let (svc, _, _) = service(users, groups);

        let mut cfg = config("u1", 2);
        cfg.never_matched_filter = true;
        let detail = svc
            .create_match_group(&cfg, None)
            .await
            .unwrap()
            .expect("u3 has never matched with u1");
        let ids: Vec<_> = detail.members.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u3"]);
    }

    #[tokio::test]
    async fn history_is_not_fetched_when_filter_is_off() {
        let users = StubUserStore {
            pool: vec![uff("u1"), uff("u2")],
            ..Default::default()
        };
        let (svc, _, groups) = service(users, MemoryGroupStore::default());

        svc.create_match_group(&config("u1", 2), None)
            .await
            .unwrap()
            .expect("group should assemble");
        assert_eq!(groups.history_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn predicate_runs_once_per_surviving_candidate() {
        // The self-check short-circuits before the predicate, so only u2
        // ever reaches judge_users, exactly once.
        let users = StubUserStore {
            pool: vec![uff("u1"), uff("u2")],
            ..Default::default()
        };
        let (svc, users, _) = service(users, MemoryGroupStore::default());

        svc.create_match_group(&config("u1", 2), None)
            .await
            .unwrap()
            .expect("group should assemble");
        assert_eq!(users.judge_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_members_is_invalid_input() {
        let users = StubUserStore {
            pool: vec![uff("u1")],
            ..Default::default()
        };
        let (svc, _, _) = service(users, MemoryGroupStore::default());

        let err = svc.create_match_group(&config("u1", 0), None).await.unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn unknown_owner_is_not_found() {
        let (svc, _, _) = service(StubUserStore::default(), MemoryGroupStore::default());
        let err = svc.create_match_group(&config("ghost", 2), None).await.unwrap_err();
        assert!(matches!(err, MatchError::NotFound(_)));
    }

    // ── check_skills_registered ──────────────────────────────

    #[tokio::test]
    async fn first_unregistered_skill_is_reported() {
        let groups = MemoryGroupStore {
            skills: HashSet::from(["a".into(), "c".into()]),
            ..Default::default()
        };
        let (svc, _, _) = service(StubUserStore::default(), groups);

        let missing = svc
            .check_skills_registered(&["a".into(), "b".into(), "c".into()])
            .await
            .unwrap();
        assert_eq!(missing.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn all_registered_yields_none() {
        let groups = MemoryGroupStore {
            skills: HashSet::from(["a".into(), "b".into()]),
            ..Default::default()
        };
        let (svc, _, _) = service(StubUserStore::default(), groups);

        let missing = svc
            .check_skills_registered(&["a".into(), "b".into()])
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    // ── pure decision points ─────────────────────────────────

    #[test]
    fn self_check_matches_on_id_only() {
        let mut other = uff("u1");
        other.user_name = "someone else entirely".into();
        assert!(is_self(&other, &uff("u1")));
        assert!(!is_self(&uff("u2"), &uff("u1")));
    }

    #[test]
    fn never_matched_scans_full_history() {
        let history = vec!["a".to_string(), "b".to_string()];
        assert!(!passes_never_matched(&history, "b"));
        assert!(passes_never_matched(&history, "c"));
        assert!(passes_never_matched(&[], "a"));
    }
}
