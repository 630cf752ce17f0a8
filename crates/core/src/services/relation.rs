//! Relation annotation service.
//!
//! Decorates profile search results with the viewer-relative relationship
//! state. Direction ("who sent it") is computed here and nowhere else.

use ludus_common::AppResult;
use ludus_db::{
    entities::{
        friendship::{self, FriendshipStatus},
        user,
    },
    repositories::FriendshipRepository,
};
use serde::Serialize;

/// Relationship state of a profile relative to a viewing user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationState {
    /// No edge exists between the pair.
    NoRelation,
    /// The viewer sent a request that is still pending.
    OutgoingPending,
    /// The other user sent a request the viewer has not acted on.
    IncomingPending,
    /// The pair has an accepted edge.
    Friends,
    /// The pair's edge was declined; a new request may be sent.
    PreviouslyDeclined,
}

/// Relation service (read-only over the friendship store).
#[derive(Clone)]
pub struct RelationService {
    friendship_repo: FriendshipRepository,
}

impl RelationService {
    /// Create a new relation service.
    #[must_use]
    pub const fn new(friendship_repo: FriendshipRepository) -> Self {
        Self { friendship_repo }
    }

    /// Classify an edge (or its absence) relative to `viewer`.
    #[must_use]
    pub fn classify(viewer: &str, edge: Option<&friendship::Model>) -> RelationState {
        match edge {
            None => RelationState::NoRelation,
            Some(e) => match e.status {
                FriendshipStatus::Accepted => RelationState::Friends,
                FriendshipStatus::Declined => RelationState::PreviouslyDeclined,
                FriendshipStatus::Pending if e.requester_id == viewer => {
                    RelationState::OutgoingPending
                }
                FriendshipStatus::Pending => RelationState::IncomingPending,
            },
        }
    }

    /// The viewer-relative state for a single other user.
    pub async fn relation_to(&self, viewer: &str, other: &str) -> AppResult<RelationState> {
        let edge = self.friendship_repo.find_by_pair(viewer, other).await?;
        Ok(Self::classify(viewer, edge.as_ref()))
    }

    /// Annotate a candidate set with viewer-relative states.
    ///
    /// The viewer is excluded from the result; self-results are never
    /// actionable.
    pub async fn annotate(
        &self,
        viewer: &str,
        candidates: Vec<user::Model>,
    ) -> AppResult<Vec<(user::Model, RelationState)>> {
        let mut annotated = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if candidate.id == viewer {
                continue;
            }
            let relation = self.relation_to(viewer, &candidate.id).await?;
            annotated.push((candidate, relation));
        }
        Ok(annotated)
    }
}
