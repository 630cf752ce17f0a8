//! End-to-end lifecycle scenarios through the service layer.
//!
//! These run against a real `PostgreSQL` instance and are ignored by
//! default. Run with: `cargo test --test friendship_scenario -- --ignored`

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use ludus_common::{AppError, IdGenerator};
use ludus_core::{FriendListService, FriendshipService, RelationService, RelationState};
use ludus_db::entities::friendship::FriendshipStatus;
use ludus_db::entities::user;
use ludus_db::repositories::{FriendshipRepository, UserRepository};
use ludus_db::test_utils::TestDatabase;
use sea_orm::Set;

struct Services {
    friendships: FriendshipService,
    relations: RelationService,
    lists: FriendListService,
    users: UserRepository,
}

async fn setup() -> (TestDatabase, Services) {
    let db = TestDatabase::create_unique().await.unwrap();
    ludus_db::migrate(db.connection()).await.unwrap();

    let conn = Arc::clone(&db.conn);
    let friendship_repo = FriendshipRepository::new(Arc::clone(&conn));
    let user_repo = UserRepository::new(conn);

    let services = Services {
        friendships: FriendshipService::new(friendship_repo.clone(), user_repo.clone()),
        relations: RelationService::new(friendship_repo.clone()),
        lists: FriendListService::new(friendship_repo, user_repo.clone()),
        users: user_repo,
    };
    (db, services)
}

async fn create_user(repo: &UserRepository, username: &str, online: bool) -> String {
    let id_gen = IdGenerator::new();
    let id = id_gen.generate();
    let now = chrono::Utc::now();
    repo.create(user::ActiveModel {
        id: Set(id.clone()),
        username: Set(username.to_string()),
        username_lower: Set(username.to_lowercase()),
        token: Set(Some(id_gen.generate_token())),
        name: Set(None),
        bio: Set(None),
        avatar_url: Set(None),
        is_online: Set(online),
        created_at: Set(now.into()),
        updated_at: Set(None),
    })
    .await
    .unwrap();
    id
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn send_accept_cancel_annotate_scenario() {
    let (db, svc) = setup().await;
    let a = create_user(&svc.users, "alice", false).await;
    let b = create_user(&svc.users, "bob", true).await;

    // A sends to B
    let edge = svc.friendships.send_request(&a, &b).await.unwrap();
    assert_eq!(edge.status, FriendshipStatus::Pending);
    assert_eq!(edge.requester_id, a);

    // B accepts
    let accepted = svc.friendships.accept_request(&b, &edge.id).await.unwrap();
    assert_eq!(accepted.status, FriendshipStatus::Accepted);

    // A's late cancel lost the race
    let cancel = svc.friendships.cancel_request(&a, &edge.id).await;
    assert!(matches!(cancel, Err(AppError::Conflict(_))));

    // A now sees B as a friend, and B shows up in the online bucket
    assert_eq!(
        svc.relations.relation_to(&a, &b).await.unwrap(),
        RelationState::Friends
    );
    let buckets = svc.lists.friends(&a).await.unwrap();
    assert_eq!(buckets.online.len(), 1);
    assert_eq!(buckets.online[0].id, b);
    assert!(buckets.offline.is_empty());

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn duplicate_sends_resolve_to_actionable_outcomes() {
    let (db, svc) = setup().await;
    let a = create_user(&svc.users, "alice", false).await;
    let b = create_user(&svc.users, "bob", false).await;

    svc.friendships.send_request(&a, &b).await.unwrap();

    // Same direction again: duplicate
    let again = svc.friendships.send_request(&a, &b).await;
    assert!(matches!(again, Err(AppError::DuplicateRequest)));

    // Opposite direction: the caller should accept instead
    let reverse = svc.friendships.send_request(&b, &a).await;
    assert!(matches!(reverse, Err(AppError::AlreadyIncoming)));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn counts_track_the_edge_set() {
    let (db, svc) = setup().await;
    let a = create_user(&svc.users, "alice", false).await;
    let b = create_user(&svc.users, "bob", false).await;
    let c = create_user(&svc.users, "carol", false).await;

    let ab = svc.friendships.send_request(&a, &b).await.unwrap();
    svc.friendships.send_request(&c, &a).await.unwrap();

    let counts = svc.lists.counts(&a).await.unwrap();
    assert_eq!((counts.friends, counts.incoming, counts.outgoing), (0, 1, 1));

    svc.friendships.accept_request(&b, &ab.id).await.unwrap();

    let counts = svc.lists.counts(&a).await.unwrap();
    assert_eq!((counts.friends, counts.incoming, counts.outgoing), (1, 1, 0));

    db.drop_database().await.unwrap();
}
