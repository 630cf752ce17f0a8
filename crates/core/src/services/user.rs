//! User service.
//!
//! The consumer surface over the externally owned profile data: lookups,
//! token authentication for the API middleware, search (feeding the
//! annotator) and the narrow presence call.

use ludus_common::{AppError, AppResult};
use ludus_db::{entities::user, repositories::UserRepository};

/// Maximum number of search results per call.
const SEARCH_LIMIT_CAP: u64 = 50;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))
    }

    /// Authenticate a user by session token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Search users by username or display name.
    pub async fn search(
        &self,
        query: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::BadRequest(
                "search query must not be empty".to_string(),
            ));
        }

        self.user_repo
            .search(query, limit.min(SEARCH_LIMIT_CAP), offset)
            .await
    }

    /// Set the presence flag for a user.
    pub async fn set_online(&self, user_id: &str, online: bool) -> AppResult<()> {
        self.user_repo.set_online(user_id, online).await?;
        tracing::debug!(user_id = %user_id, online = online, "Presence updated");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            token: Some("token123".to_string()),
            name: None,
            bio: None,
            avatar_url: None,
            is_online: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: MockDatabase) -> UserService {
        UserService::new(UserRepository::new(Arc::new(db.into_connection())))
    }

    #[tokio::test]
    async fn authenticate_with_unknown_token_is_unauthorized() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let result = service.authenticate_by_token("bogus").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn authenticate_with_known_token_returns_the_user() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user("u1", "alice")]]),
        );

        let user = service.authenticate_by_token("token123").await.unwrap();
        assert_eq!(user.id, "u1");
    }

    #[tokio::test]
    async fn get_by_username_returns_the_user() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user("u1", "Alice")]]),
        );

        let user = service.get_by_username("ALICE").await.unwrap();
        assert_eq!(user.id, "u1");
    }

    #[tokio::test]
    async fn get_by_unknown_username_is_not_found() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let result = service.get_by_username("ghost").await;
        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn empty_search_query_is_rejected() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.search("   ", 10, 0).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
