//! Friendship service.
//!
//! The only entry point clients use for lifecycle changes. Translates intent
//! into store calls and turns the store's mechanical `Conflict` into the
//! precise outcome the caller can act on (`DuplicateRequest`,
//! `AlreadyIncoming`, `AlreadyFriends`).

use ludus_common::{AppError, AppResult};
use ludus_db::{
    entities::friendship::{self, FriendshipStatus},
    repositories::{FriendshipRepository, UserRepository},
};

/// Friendship service for business logic.
#[derive(Clone)]
pub struct FriendshipService {
    friendship_repo: FriendshipRepository,
    user_repo: UserRepository,
}

impl FriendshipService {
    /// Create a new friendship service.
    #[must_use]
    pub const fn new(friendship_repo: FriendshipRepository, user_repo: UserRepository) -> Self {
        Self {
            friendship_repo,
            user_repo,
        }
    }

    /// Send a friend request from `actor` to `target`.
    ///
    /// On a pair conflict the existing edge is inspected so the caller gets
    /// an actionable outcome instead of a generic failure: a pending edge
    /// addressed to the actor means "accept instead" (`AlreadyIncoming`), an
    /// accepted edge means `AlreadyFriends`, anything else is
    /// `DuplicateRequest`.
    pub async fn send_request(
        &self,
        actor: &str,
        target: &str,
    ) -> AppResult<friendship::Model> {
        if actor == target {
            return Err(AppError::InvalidSelfRequest);
        }

        // The target must be a known profile
        self.user_repo.get_by_id(target).await?;

        match self.friendship_repo.create_pending(actor, target).await {
            Ok(edge) => {
                tracing::debug!(actor_id = %actor, target_id = %target, edge_id = %edge.id, "Friend request sent");
                Ok(edge)
            }
            Err(AppError::Conflict(_)) => {
                let existing = self.friendship_repo.find_by_pair(actor, target).await?;
                Err(Self::classify_conflict(actor, existing.as_ref()))
            }
            Err(e) => Err(e),
        }
    }

    /// Accept a pending friend request addressed to `actor`.
    pub async fn accept_request(
        &self,
        actor: &str,
        edge_id: &str,
    ) -> AppResult<friendship::Model> {
        let edge = self
            .friendship_repo
            .transition(edge_id, actor, FriendshipStatus::Accepted)
            .await?;
        tracing::debug!(actor_id = %actor, edge_id = %edge_id, "Friend request accepted");
        Ok(edge)
    }

    /// Decline a pending friend request addressed to `actor`.
    pub async fn decline_request(
        &self,
        actor: &str,
        edge_id: &str,
    ) -> AppResult<friendship::Model> {
        let edge = self
            .friendship_repo
            .transition(edge_id, actor, FriendshipStatus::Declined)
            .await?;
        tracing::debug!(actor_id = %actor, edge_id = %edge_id, "Friend request declined");
        Ok(edge)
    }

    /// Cancel a pending friend request previously sent by `actor`.
    pub async fn cancel_request(&self, actor: &str, edge_id: &str) -> AppResult<()> {
        self.friendship_repo.cancel(edge_id, actor).await?;
        tracing::debug!(actor_id = %actor, edge_id = %edge_id, "Friend request canceled");
        Ok(())
    }

    /// Map the edge that caused a pair conflict to the user-facing outcome.
    fn classify_conflict(actor: &str, existing: Option<&friendship::Model>) -> AppError {
        match existing {
            Some(edge) if edge.status == FriendshipStatus::Accepted => AppError::AlreadyFriends,
            Some(edge)
                if edge.status == FriendshipStatus::Pending && edge.recipient_id() == actor =>
            {
                AppError::AlreadyIncoming
            }
            // The edge resolved (or vanished) between the failed insert and
            // this read; the send still lost, report it as a duplicate.
            _ => AppError::DuplicateRequest,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ludus_db::entities::user;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn edge(requester: &str, status: FriendshipStatus) -> friendship::Model {
        friendship::Model {
            id: "e1".to_string(),
            user_low_id: "alice".to_string(),
            user_high_id: "bob".to_string(),
            requester_id: requester.to_string(),
            status,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn service(
        friendship_db: MockDatabase,
        user_db: MockDatabase,
    ) -> FriendshipService {
        FriendshipService::new(
            FriendshipRepository::new(Arc::new(friendship_db.into_connection())),
            UserRepository::new(Arc::new(user_db.into_connection())),
        )
    }

    #[tokio::test]
    async fn send_to_yourself_is_rejected() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.send_request("alice", "alice").await;
        assert!(matches!(result, Err(AppError::InvalidSelfRequest)));
    }

    #[tokio::test]
    async fn send_to_unknown_target_is_not_found() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let result = service.send_request("alice", "ghost").await;
        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[test]
    fn conflict_on_accepted_edge_is_already_friends() {
        let existing = edge("alice", FriendshipStatus::Accepted);
        let outcome = FriendshipService::classify_conflict("alice", Some(&existing));
        assert!(matches!(outcome, AppError::AlreadyFriends));
    }

    #[test]
    fn conflict_on_incoming_pending_edge_suggests_accepting() {
        // bob sent first; alice's send resolves to "accept instead"
        let existing = edge("bob", FriendshipStatus::Pending);
        let outcome = FriendshipService::classify_conflict("alice", Some(&existing));
        assert!(matches!(outcome, AppError::AlreadyIncoming));
    }

    #[test]
    fn conflict_on_own_pending_edge_is_duplicate() {
        let existing = edge("alice", FriendshipStatus::Pending);
        let outcome = FriendshipService::classify_conflict("alice", Some(&existing));
        assert!(matches!(outcome, AppError::DuplicateRequest));
    }

    #[test]
    fn conflict_with_vanished_edge_is_duplicate() {
        let outcome = FriendshipService::classify_conflict("alice", None);
        assert!(matches!(outcome, AppError::DuplicateRequest));
    }

    #[tokio::test]
    async fn accept_passes_through_store_errors() {
        // Edge already resolved: the store reports Conflict, the service
        // does not mask it.
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge("alice", FriendshipStatus::Accepted)]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.accept_request("bob", "e1").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
