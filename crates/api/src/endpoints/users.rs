//! User endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use ludus_common::AppResult;
use ludus_core::RelationState;
use ludus_db::entities::user;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::AuthUser, middleware::AppState, response, response::ApiResponse};

/// User response.
///
/// The public projection of a profile; the session token never leaves the
/// server.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub created_at: String,
    pub username: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub is_online: bool,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at.to_rfc3339(),
            username: user.username,
            name: user.name,
            bio: user.bio,
            avatar_url: user.avatar_url,
            is_online: user.is_online,
        }
    }
}

/// Get current user.
async fn me(AuthUser(user): AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(user.into())
}

/// Get a user by ID.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get(&id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Search params.
#[derive(Debug, Deserialize, Validate)]
pub struct SearchParams {
    #[validate(length(min = 1, max = 128))]
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// Search result entry: a profile tagged with the viewer-relative relation.
#[derive(Debug, Serialize)]
pub struct AnnotatedUserResponse {
    pub user: UserResponse,
    pub relation: RelationState,
}

/// Search users by name, annotated with the caller's relation to each.
async fn search(
    AuthUser(viewer): AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<ApiResponse<Vec<AnnotatedUserResponse>>> {
    params.validate()?;

    let candidates = state
        .user_service
        .search(&params.q, params.limit, params.offset)
        .await?;
    let annotated = state.relation_service.annotate(&viewer.id, candidates).await?;

    Ok(ApiResponse::ok(
        annotated
            .into_iter()
            .map(|(user, relation)| AnnotatedUserResponse {
                user: user.into(),
                relation,
            })
            .collect(),
    ))
}

/// Presence update request.
#[derive(Debug, Deserialize)]
pub struct PresenceRequest {
    pub online: bool,
}

/// Set the caller's presence flag.
async fn presence(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PresenceRequest>,
) -> AppResult<impl IntoResponse> {
    state.user_service.set_online(&user.id, req.online).await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/search", get(search))
        .route("/presence", post(presence))
        .route("/{id}", get(show))
}
