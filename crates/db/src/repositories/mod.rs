//! Database repositories.

mod friendship;
mod user;

pub use friendship::FriendshipRepository;
pub use user::UserRepository;
