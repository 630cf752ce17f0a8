//! Friend list service.
//!
//! Classifies a user's edge set into the buckets a friends dashboard needs:
//! accepted friends split by presence, incoming pending, outgoing pending.
//! Presence is read fresh from the profile table at call time and counts are
//! derived from the same queries, so there is no second source of truth that
//! can drift from the edge set.

use std::collections::HashMap;

use ludus_common::AppResult;
use ludus_db::{
    entities::{friendship, user},
    repositories::{FriendshipRepository, UserRepository},
};
use serde::Serialize;

/// Accepted friends split by presence.
#[derive(Debug, Default, Serialize)]
pub struct FriendBuckets {
    /// Friends currently online.
    pub online: Vec<user::Model>,
    /// Friends currently offline.
    pub offline: Vec<user::Model>,
}

/// A pending request joined with the counterpart profile.
#[derive(Debug, Serialize)]
pub struct PendingEntry {
    /// The pending edge (its id is what accept/decline/cancel act on).
    pub edge: friendship::Model,
    /// The other member of the pair.
    pub user: user::Model,
}

/// Derived bucket sizes.
#[derive(Debug, Serialize)]
pub struct FriendCounts {
    /// Number of accepted friends.
    pub friends: u64,
    /// Number of unanswered incoming requests.
    pub incoming: u64,
    /// Number of unanswered outgoing requests.
    pub outgoing: u64,
}

/// Friend list service for read-side aggregation.
#[derive(Clone)]
pub struct FriendListService {
    friendship_repo: FriendshipRepository,
    user_repo: UserRepository,
}

impl FriendListService {
    /// Create a new friend list service.
    #[must_use]
    pub const fn new(friendship_repo: FriendshipRepository, user_repo: UserRepository) -> Self {
        Self {
            friendship_repo,
            user_repo,
        }
    }

    /// Accepted friends of a user, split online/offline at read time.
    pub async fn friends(&self, user_id: &str) -> AppResult<FriendBuckets> {
        let edges = self.friendship_repo.find_accepted(user_id).await?;
        let profiles = self.join_counterparts(user_id, &edges).await?;

        let mut buckets = FriendBuckets::default();
        for profile in profiles {
            if profile.is_online {
                buckets.online.push(profile);
            } else {
                buckets.offline.push(profile);
            }
        }
        Ok(buckets)
    }

    /// Pending requests addressed to the user.
    pub async fn incoming(&self, user_id: &str) -> AppResult<Vec<PendingEntry>> {
        let edges = self.friendship_repo.find_incoming_pending(user_id).await?;
        self.join_entries(user_id, edges).await
    }

    /// Pending requests the user has sent.
    pub async fn outgoing(&self, user_id: &str) -> AppResult<Vec<PendingEntry>> {
        let edges = self.friendship_repo.find_outgoing_pending(user_id).await?;
        self.join_entries(user_id, edges).await
    }

    /// Bucket sizes, derived from the edge set on every call.
    pub async fn counts(&self, user_id: &str) -> AppResult<FriendCounts> {
        let friends = self.friendship_repo.count_accepted(user_id).await?;
        let incoming = self.friendship_repo.count_incoming_pending(user_id).await?;
        let outgoing = self.friendship_repo.count_outgoing_pending(user_id).await?;
        Ok(FriendCounts {
            friends,
            incoming,
            outgoing,
        })
    }

    /// Resolve the counterpart profile of each edge, preserving edge order.
    async fn join_counterparts(
        &self,
        user_id: &str,
        edges: &[friendship::Model],
    ) -> AppResult<Vec<user::Model>> {
        let ids: Vec<String> = edges
            .iter()
            .filter_map(|e| e.counterpart_of(user_id).map(str::to_string))
            .collect();
        let users = self.user_repo.find_by_ids(&ids).await?;
        let mut by_id: HashMap<String, user::Model> =
            users.into_iter().map(|u| (u.id.clone(), u)).collect();

        Ok(edges
            .iter()
            .filter_map(|e| e.counterpart_of(user_id))
            .filter_map(|id| by_id.remove(id))
            .collect())
    }

    async fn join_entries(
        &self,
        user_id: &str,
        edges: Vec<friendship::Model>,
    ) -> AppResult<Vec<PendingEntry>> {
        let profiles = self.join_counterparts(user_id, &edges).await?;
        let mut by_id: HashMap<String, user::Model> =
            profiles.into_iter().map(|u| (u.id.clone(), u)).collect();

        Ok(edges
            .into_iter()
            .filter_map(|edge| {
                let counterpart = edge.counterpart_of(user_id)?.to_string();
                by_id.remove(&counterpart).map(|user| PendingEntry { edge, user })
            })
            .collect())
    }
}
