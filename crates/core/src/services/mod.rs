//! Business logic services.

#![allow(missing_docs)]

pub mod friend_list;
pub mod friendship;
pub mod relation;
pub mod user;

pub use friend_list::{FriendBuckets, FriendCounts, FriendListService, PendingEntry};
pub use friendship::FriendshipService;
pub use relation::{RelationService, RelationState};
pub use user::UserService;
