//! API endpoints.

mod relationships;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/relationships", relationships::router())
        .nest("/users", users::router())
}
