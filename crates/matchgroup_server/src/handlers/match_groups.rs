//! Match-group endpoints: create (POST) and fetch-by-id (GET).

use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use matchgroup_core::{
    error::MatchError,
    service::MatchGroupService,
    types::{MatchGroupConfig, MatchGroupDetail, ScopeFilter},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::session::AuthedUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchGroupRequest {
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

pub async fn create(
    Extension(service): Extension<Arc<MatchGroupService>>,
    Extension(AuthedUser(owner_id)): Extension<AuthedUser>,
    Json(req): Json<CreateMatchGroupRequest>,
) -> Result<Response, AppError> {
    if req.num_of_members == 0 {
        return Err(MatchError::InvalidInput("numOfMembers must be >= 1".into()).into());
    }
    if let Some(skill_name) = service.check_skills_registered(&req.skill_filter).await? {
        return Err(
            MatchError::InvalidInput(format!("skill {skill_name} is not registered")).into(),
        );
    }

    let config = MatchGroupConfig {
        owner_id,
        match_group_name: req.match_group_name,
        description: req.description,
        num_of_members: req.num_of_members,
        department_filter: req.department_filter,
        office_filter: req.office_filter,
        skill_filter: req.skill_filter,
        never_matched_filter: req.never_matched_filter,
    };

    match service.create_match_group(&config, None).await? {
        Some(detail) => Ok((StatusCode::CREATED, Json(detail)).into_response()),
        // Timeout or pool exhaustion — nothing was persisted.
        None => Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "message": "all members are not found" })),
        )
            .into_response()),
    }
}

pub async fn get(
    Extension(service): Extension<Arc<MatchGroupService>>,
    Path(match_group_id): Path<Uuid>,
) -> Result<Json<MatchGroupDetail>, AppError> {
    service
        .get_match_group(match_group_id)
        .await?
        .map(Json)
        .ok_or_else(|| MatchError::NotFound(format!("match group {match_group_id}")).into())
}
