//! Friendship repository.
//!
//! The authoritative keeper of friendship edges. Every state change is a
//! single conditional statement keyed on the pair (or on
//! `(id, status, requester_id)`), so concurrent callers racing on the same
//! edge are settled by the database, not by in-process locking. This keeps
//! multiple service replicas safe against the same table.

use std::sync::Arc;

use crate::entities::{
    Friendship,
    friendship::{self, FriendshipStatus, canonical_pair},
};
use ludus_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, sea_query::Expr,
};

/// Friendship repository for database operations.
#[derive(Clone)]
pub struct FriendshipRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl FriendshipRepository {
    /// Create a new friendship repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find an edge by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<friendship::Model>> {
        Friendship::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an edge by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<friendship::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("friendship edge {id}")))
    }

    /// Find the edge for an unordered pair of users.
    ///
    /// Never fails on absence; the pair is canonicalized internally so the
    /// argument order does not matter.
    pub async fn find_by_pair(&self, a: &str, b: &str) -> AppResult<Option<friendship::Model>> {
        let (low, high) = canonical_pair(a, b);
        Friendship::find()
            .filter(friendship::Column::UserLowId.eq(low))
            .filter(friendship::Column::UserHighId.eq(high))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a pending edge from `requester` to `recipient`.
    ///
    /// If the pair's only existing edge is `declined`, it is rewritten in
    /// place to a fresh pending request (same id, new requester, refreshed
    /// timestamp) by a conditional UPDATE that is atomic with its own
    /// existence check. Otherwise a plain INSERT runs and the unique pair
    /// index settles the double-send race: the loser gets `Conflict`.
    ///
    /// The caller is responsible for rejecting `requester == recipient`
    /// before reaching the store.
    pub async fn create_pending(
        &self,
        requester: &str,
        recipient: &str,
    ) -> AppResult<friendship::Model> {
        let (low, high) = canonical_pair(requester, recipient);
        let now = chrono::Utc::now();

        // Re-request path: Declined -> Pending, atomically.
        let rewritten = Friendship::update_many()
            .col_expr(friendship::Column::RequesterId, Expr::value(requester))
            .col_expr(
                friendship::Column::Status,
                Expr::value(FriendshipStatus::Pending),
            )
            .col_expr(friendship::Column::UpdatedAt, Expr::value(now))
            .filter(friendship::Column::UserLowId.eq(low))
            .filter(friendship::Column::UserHighId.eq(high))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Declined))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if rewritten.rows_affected > 0 {
            // A concurrent resolve can land between the UPDATE and this read.
            // Only a pending edge from this requester is the request that was
            // just created; anything else means the caller lost a race.
            return match self.find_by_pair(low, high).await? {
                Some(edge)
                    if edge.status == FriendshipStatus::Pending
                        && edge.requester_id == requester =>
                {
                    Ok(edge)
                }
                _ => Err(AppError::Conflict(
                    "edge changed while re-requesting".to_string(),
                )),
            };
        }

        let model = friendship::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_low_id: Set(low.to_string()),
            user_high_id: Set(high.to_string()),
            requester_id: Set(requester.to_string()),
            status: Set(FriendshipStatus::Pending),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        match model.insert(self.db.as_ref()).await {
            Ok(edge) => Ok(edge),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
                AppError::Conflict("an edge already exists for this pair".to_string()),
            ),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Resolve a pending edge to `accepted` or `declined`.
    ///
    /// Only the recipient of the pending request is authorized. The write is
    /// conditioned on `(id, status = pending, requester_id)` as observed at
    /// read time, so a concurrent resolve, cancel or opposite-direction
    /// re-request loses deterministically with `Conflict`.
    pub async fn transition(
        &self,
        edge_id: &str,
        acting_user: &str,
        target: FriendshipStatus,
    ) -> AppResult<friendship::Model> {
        if target == FriendshipStatus::Pending {
            return Err(AppError::BadRequest(
                "cannot transition an edge back to pending".to_string(),
            ));
        }

        let edge = self.get_by_id(edge_id).await?;

        if edge.status != FriendshipStatus::Pending {
            return Err(AppError::Conflict(
                "this request was already resolved".to_string(),
            ));
        }
        if acting_user != edge.recipient_id() {
            return Err(AppError::Forbidden(
                "only the recipient may resolve a pending request".to_string(),
            ));
        }

        let now = chrono::Utc::now();
        let result = Friendship::update_many()
            .col_expr(friendship::Column::Status, Expr::value(target))
            .col_expr(friendship::Column::UpdatedAt, Expr::value(now))
            .filter(friendship::Column::Id.eq(edge_id))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Pending))
            .filter(friendship::Column::RequesterId.eq(edge.requester_id.as_str()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict(
                "this request was already resolved".to_string(),
            ));
        }

        // The CAS succeeded, so the post-image is fully determined by the
        // pre-image; no re-read that could observe a later re-request.
        Ok(friendship::Model {
            status: target,
            updated_at: now.into(),
            ..edge
        })
    }

    /// Cancel (hard delete) a pending edge.
    ///
    /// Only the requester is authorized. Same conditional-write shape as
    /// [`Self::transition`]; losing the race to a resolve yields `Conflict`.
    pub async fn cancel(&self, edge_id: &str, acting_user: &str) -> AppResult<()> {
        let edge = self.get_by_id(edge_id).await?;

        if edge.status != FriendshipStatus::Pending {
            return Err(AppError::Conflict(
                "this request was already resolved".to_string(),
            ));
        }
        if acting_user != edge.requester_id {
            return Err(AppError::Forbidden(
                "only the requester may cancel a pending request".to_string(),
            ));
        }

        let result = Friendship::delete_many()
            .filter(friendship::Column::Id.eq(edge_id))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Pending))
            .filter(friendship::Column::RequesterId.eq(acting_user))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict(
                "this request was already resolved".to_string(),
            ));
        }

        Ok(())
    }

    /// All edges touching a user, any status (paginated).
    ///
    /// Ordered stable by `updated_at` descending, with id as tiebreaker.
    pub async fn find_for_user(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<friendship::Model>> {
        Friendship::find()
            .filter(Self::involves(user_id))
            .order_by_desc(friendship::Column::UpdatedAt)
            .order_by_desc(friendship::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Accepted edges for a user.
    pub async fn find_accepted(&self, user_id: &str) -> AppResult<Vec<friendship::Model>> {
        self.find_by_status(user_id, FriendshipStatus::Accepted)
            .await
    }

    /// Pending edges where the user is the recipient.
    pub async fn find_incoming_pending(&self, user_id: &str) -> AppResult<Vec<friendship::Model>> {
        Friendship::find()
            .filter(Self::involves(user_id))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Pending))
            .filter(friendship::Column::RequesterId.ne(user_id))
            .order_by_desc(friendship::Column::UpdatedAt)
            .order_by_desc(friendship::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Pending edges where the user is the requester.
    pub async fn find_outgoing_pending(&self, user_id: &str) -> AppResult<Vec<friendship::Model>> {
        Friendship::find()
            .filter(friendship::Column::RequesterId.eq(user_id))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Pending))
            .order_by_desc(friendship::Column::UpdatedAt)
            .order_by_desc(friendship::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count accepted edges for a user.
    pub async fn count_accepted(&self, user_id: &str) -> AppResult<u64> {
        Friendship::find()
            .filter(Self::involves(user_id))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Accepted))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count pending edges where the user is the recipient.
    pub async fn count_incoming_pending(&self, user_id: &str) -> AppResult<u64> {
        Friendship::find()
            .filter(Self::involves(user_id))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Pending))
            .filter(friendship::Column::RequesterId.ne(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count pending edges where the user is the requester.
    pub async fn count_outgoing_pending(&self, user_id: &str) -> AppResult<u64> {
        Friendship::find()
            .filter(friendship::Column::RequesterId.eq(user_id))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Pending))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_status(
        &self,
        user_id: &str,
        status: FriendshipStatus,
    ) -> AppResult<Vec<friendship::Model>> {
        Friendship::find()
            .filter(Self::involves(user_id))
            .filter(friendship::Column::Status.eq(status))
            .order_by_desc(friendship::Column::UpdatedAt)
            .order_by_desc(friendship::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn involves(user_id: &str) -> Condition {
        Condition::any()
            .add(friendship::Column::UserLowId.eq(user_id))
            .add(friendship::Column::UserHighId.eq(user_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn pending_edge(requester: &str) -> friendship::Model {
        friendship::Model {
            id: "e1".to_string(),
            user_low_id: "alice".to_string(),
            user_high_id: "bob".to_string(),
            requester_id: requester.to_string(),
            status: FriendshipStatus::Pending,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn accepted_edge() -> friendship::Model {
        friendship::Model {
            status: FriendshipStatus::Accepted,
            ..pending_edge("alice")
        }
    }

    #[tokio::test]
    async fn transition_by_recipient_succeeds() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending_edge("alice")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let repo = FriendshipRepository::new(db);

        let edge = repo
            .transition("e1", "bob", FriendshipStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(edge.status, FriendshipStatus::Accepted);
        assert_eq!(edge.id, "e1");
    }

    #[tokio::test]
    async fn transition_by_requester_is_forbidden() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending_edge("alice")]])
                .into_connection(),
        );
        let repo = FriendshipRepository::new(db);

        let result = repo
            .transition("e1", "alice", FriendshipStatus::Accepted)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn transition_by_outsider_is_forbidden() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending_edge("alice")]])
                .into_connection(),
        );
        let repo = FriendshipRepository::new(db);

        let result = repo
            .transition("e1", "mallory", FriendshipStatus::Declined)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn transition_on_resolved_edge_is_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[accepted_edge()]])
                .into_connection(),
        );
        let repo = FriendshipRepository::new(db);

        let result = repo.transition("e1", "bob", FriendshipStatus::Declined).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn transition_losing_the_race_is_conflict() {
        // Edge is pending at read time, but the conditional UPDATE hits zero
        // rows because a concurrent actor resolved it first.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending_edge("alice")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let repo = FriendshipRepository::new(db);

        let result = repo.transition("e1", "bob", FriendshipStatus::Accepted).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn transition_to_pending_is_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = FriendshipRepository::new(db);

        let result = repo.transition("e1", "bob", FriendshipStatus::Pending).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn transition_on_missing_edge_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<friendship::Model>::new()])
                .into_connection(),
        );
        let repo = FriendshipRepository::new(db);

        let result = repo.transition("nope", "bob", FriendshipStatus::Accepted).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn cancel_by_requester_succeeds() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending_edge("alice")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let repo = FriendshipRepository::new(db);

        repo.cancel("e1", "alice").await.unwrap();
    }

    #[tokio::test]
    async fn cancel_by_recipient_is_forbidden() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending_edge("alice")]])
                .into_connection(),
        );
        let repo = FriendshipRepository::new(db);

        let result = repo.cancel("e1", "bob").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn cancel_losing_the_race_is_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending_edge("alice")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let repo = FriendshipRepository::new(db);

        let result = repo.cancel("e1", "alice").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn cancel_on_resolved_edge_is_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[accepted_edge()]])
                .into_connection(),
        );
        let repo = FriendshipRepository::new(db);

        let result = repo.cancel("e1", "alice").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn re_request_rewrite_returns_the_pending_edge() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[pending_edge("alice")]])
                .into_connection(),
        );
        let repo = FriendshipRepository::new(db);

        let edge = repo.create_pending("alice", "bob").await.unwrap();
        assert_eq!(edge.status, FriendshipStatus::Pending);
        assert_eq!(edge.requester_id, "alice");
    }

    #[tokio::test]
    async fn re_request_outrun_by_a_resolve_is_conflict() {
        // The declined->pending rewrite wins, but a concurrent accept lands
        // before the re-read. The stale edge must not be reported as a
        // freshly created request.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[accepted_edge()]])
                .into_connection(),
        );
        let repo = FriendshipRepository::new(db);

        let result = repo.create_pending("alice", "bob").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn find_by_pair_canonicalizes_argument_order() {
        let edge = pending_edge("alice");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge.clone()], [edge]])
                .into_connection(),
        );
        let repo = FriendshipRepository::new(db);

        let forward = repo.find_by_pair("alice", "bob").await.unwrap();
        let backward = repo.find_by_pair("bob", "alice").await.unwrap();
        assert_eq!(forward, backward);
    }
}
