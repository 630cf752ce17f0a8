//! Relationship endpoints.
//!
//! The friend-request lifecycle: send, accept/decline, cancel, and the
//! aggregate listing a friends screen renders from.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
};
use ludus_common::{AppError, AppResult};
use ludus_core::{FriendBuckets, FriendCounts, PendingEntry};
use ludus_db::entities::friendship::{self, FriendshipStatus};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    endpoints::users::UserResponse, extractors::AuthUser, middleware::AppState, response,
    response::ApiResponse,
};

/// Friendship edge response.
#[derive(Debug, Serialize)]
pub struct EdgeResponse {
    pub id: String,
    pub requester_id: String,
    pub recipient_id: String,
    pub status: FriendshipStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<friendship::Model> for EdgeResponse {
    fn from(edge: friendship::Model) -> Self {
        let recipient_id = edge.recipient_id().to_string();
        Self {
            id: edge.id,
            requester_id: edge.requester_id,
            recipient_id,
            status: edge.status,
            created_at: edge.created_at.to_rfc3339(),
            updated_at: edge.updated_at.to_rfc3339(),
        }
    }
}

/// Send request body.
#[derive(Debug, Deserialize, Validate)]
pub struct SendRequest {
    #[validate(length(min = 1, max = 32))]
    pub target_id: String,
}

/// Send a friend request.
async fn send(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;

    let edge = state
        .friendship_service
        .send_request(&user.id, &req.target_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(EdgeResponse::from(edge)),
    ))
}

/// Action on a pending edge.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeAction {
    Accept,
    Decline,
}

/// Update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub action: EdgeAction,
}

/// Accept or decline a pending request addressed to the caller.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> AppResult<ApiResponse<EdgeResponse>> {
    let edge = match req.action {
        EdgeAction::Accept => state.friendship_service.accept_request(&user.id, &id).await?,
        EdgeAction::Decline => {
            state
                .friendship_service
                .decline_request(&user.id, &id)
                .await?
        }
    };
    Ok(ApiResponse::ok(edge.into()))
}

/// Cancel a pending request the caller sent.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.friendship_service.cancel_request(&user.id, &id).await?;
    Ok(response::ok())
}

/// Accepted friends split by presence.
#[derive(Debug, Serialize)]
pub struct FriendsResponse {
    pub online: Vec<UserResponse>,
    pub offline: Vec<UserResponse>,
}

impl From<FriendBuckets> for FriendsResponse {
    fn from(buckets: FriendBuckets) -> Self {
        Self {
            online: buckets.online.into_iter().map(Into::into).collect(),
            offline: buckets.offline.into_iter().map(Into::into).collect(),
        }
    }
}

/// A pending edge joined with the counterpart profile.
#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub edge: EdgeResponse,
    pub user: UserResponse,
}

impl From<PendingEntry> for PendingResponse {
    fn from(entry: PendingEntry) -> Self {
        Self {
            edge: entry.edge.into(),
            user: entry.user.into(),
        }
    }
}

/// Bucket sizes.
#[derive(Debug, Serialize)]
pub struct CountsResponse {
    pub friends: u64,
    pub incoming: u64,
    pub outgoing: u64,
}

impl From<FriendCounts> for CountsResponse {
    fn from(counts: FriendCounts) -> Self {
        Self {
            friends: counts.friends,
            incoming: counts.incoming,
            outgoing: counts.outgoing,
        }
    }
}

/// The caller's full relationship picture.
#[derive(Debug, Serialize)]
pub struct RelationshipsResponse {
    pub friends: FriendsResponse,
    pub incoming: Vec<PendingResponse>,
    pub outgoing: Vec<PendingResponse>,
    pub counts: CountsResponse,
}

/// List the caller's friends and pending requests.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<RelationshipsResponse>> {
    let friends = state.friend_list_service.friends(&user.id).await?;
    let incoming = state.friend_list_service.incoming(&user.id).await?;
    let outgoing = state.friend_list_service.outgoing(&user.id).await?;
    let counts = state.friend_list_service.counts(&user.id).await?;

    Ok(ApiResponse::ok(RelationshipsResponse {
        friends: friends.into(),
        incoming: incoming.into_iter().map(Into::into).collect(),
        outgoing: outgoing.into_iter().map(Into::into).collect(),
        counts: counts.into(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(send).get(list))
        .route("/{id}", patch(update).delete(remove))
}
