//! Friendship entity (one edge per unordered pair of users).
//!
//! The pair is stored in canonical order (`user_low_id < user_high_id`
//! lexicographically) so the unique index over the two columns enforces the
//! one-edge-per-pair invariant regardless of who sent the request.
//! `requester_id` records direction separately; the recipient is whichever
//! member of the pair the requester is not.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a friendship edge.
///
/// `Declined -> Pending` (re-request) is the only backward transition;
/// `Accepted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "declined")]
    Declined,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "friendship")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Smaller member of the pair (canonical order)
    pub user_low_id: String,

    /// Larger member of the pair (canonical order)
    pub user_high_id: String,

    /// The user who sent the (current) request
    pub requester_id: String,

    /// Lifecycle state
    pub status: FriendshipStatus,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// The user who must act on a pending edge.
    #[must_use]
    pub fn recipient_id(&self) -> &str {
        if self.requester_id == self.user_low_id {
            &self.user_high_id
        } else {
            &self.user_low_id
        }
    }

    /// The member of the pair that is not `user_id`.
    ///
    /// Returns `None` if `user_id` is not part of this edge.
    #[must_use]
    pub fn counterpart_of(&self, user_id: &str) -> Option<&str> {
        if user_id == self.user_low_id {
            Some(&self.user_high_id)
        } else if user_id == self.user_high_id {
            Some(&self.user_low_id)
        } else {
            None
        }
    }

    /// Whether `user_id` is one of the two members of the pair.
    #[must_use]
    pub fn involves(&self, user_id: &str) -> bool {
        user_id == self.user_low_id || user_id == self.user_high_id
    }
}

/// Order a pair of user ids canonically (low, high).
#[must_use]
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserLowId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    UserLow,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserHighId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    UserHigh,
}

impl ActiveModelBehavior for ActiveModel {}
