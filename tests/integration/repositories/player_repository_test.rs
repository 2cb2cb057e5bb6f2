// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::super::helpers::setup_database;
use replayrs::domain::models::job_run::JobRun;
use replayrs::domain::models::player::{Player, PlayerDirectory};
use replayrs::domain::repositories::job_run_repository::JobRunRepository;
use replayrs::domain::repositories::player_repository::PlayerRepository;
use replayrs::domain::services::ingest_service::PlayerResolver;
use replayrs::domain::services::run_tracker::RunTracker;
use replayrs::infrastructure::database::entities::player as player_entity;
use replayrs::infrastructure::repositories::job_run_repo_impl::JobRunRepositoryImpl;
use replayrs::infrastructure::repositories::player_repo_impl::PlayerRepositoryImpl;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;
use uuid::Uuid;

async fn setup() -> (Arc<PlayerRepositoryImpl>, Uuid) {
    let db = setup_database().await;
    let run = JobRunRepositoryImpl::new(db.clone())
        .create(&JobRun::new(None))
        .await
        .unwrap();
    (Arc::new(PlayerRepositoryImpl::new(db)), run.id)
}

#[tokio::test]
async fn test_get_or_create_by_name_reuses_existing() {
    let (repo, run_id) = setup().await;

    let (first, created) = repo.get_or_create_by_name("Alice", run_id).await.unwrap();
    assert!(created);
    assert!(first.external_id.is_none());

    let (second, created) = repo.get_or_create_by_name("Alice", run_id).await.unwrap();
    assert!(!created);
    assert_eq!(first.id, second.id);
    assert_eq!(repo.count().await.unwrap(), 1);
}

/// 并发按外部标识创建同一玩家只产生一行
#[tokio::test]
async fn test_concurrent_get_or_create_by_external_id() {
    let (repo, run_id) = setup().await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move {
                repo.get_or_create_by_external_id("Alice", "42", run_id)
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut ids = Vec::new();
    let mut created = 0;
    for handle in handles {
        let (player, was_created) = handle.await.unwrap();
        ids.push(player.id);
        if was_created {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(repo.count().await.unwrap(), 1);
}

/// 并发按名称创建同一玩家只产生一行
#[tokio::test]
async fn test_concurrent_get_or_create_by_name() {
    let (repo, run_id) = setup().await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.get_or_create_by_name("Bob", run_id).await.unwrap() })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_backfill_external_id() {
    let (repo, run_id) = setup().await;
    let (player, _) = repo.get_or_create_by_name("Alice", run_id).await.unwrap();

    let updated = repo
        .backfill_external_id(player.id, "42")
        .await
        .unwrap()
        .expect("backfill should succeed");
    assert_eq!(updated.id, player.id);
    assert_eq!(updated.external_id.as_deref(), Some("42"));

    // second backfill is a no-op
    assert!(repo
        .backfill_external_id(player.id, "99")
        .await
        .unwrap()
        .is_none());
    let found = repo.find_by_external_id("42").await.unwrap().unwrap();
    assert_eq!(found.id, player.id);
}

#[tokio::test]
async fn test_backfill_rejects_taken_external_id() {
    let (repo, run_id) = setup().await;
    let (owner, _) = repo
        .get_or_create_by_external_id("Alice", "42", run_id)
        .await
        .unwrap();
    let (impostor, _) = repo.get_or_create_by_name("Alicia", run_id).await.unwrap();

    assert!(repo
        .backfill_external_id(impostor.id, "42")
        .await
        .unwrap()
        .is_none());

    let still_name_only = repo.find_by_id(impostor.id).await.unwrap().unwrap();
    assert!(still_name_only.external_id.is_none());
    assert_eq!(
        repo.find_by_external_id("42").await.unwrap().unwrap().id,
        owner.id
    );
}

#[tokio::test]
async fn test_name_lookup_returns_player_with_external_id() {
    let (repo, run_id) = setup().await;
    let (with_id, _) = repo
        .get_or_create_by_external_id("Carol", "7", run_id)
        .await
        .unwrap();

    let (found, created) = repo.get_or_create_by_name("Carol", run_id).await.unwrap();
    assert!(!created);
    assert_eq!(found.id, with_id.id);
}

/// 先有带外部标识 7 的 Alice，后有一个只有名称的 Alice
async fn seed_namesakes(
    db: &DatabaseConnection,
    repo: &PlayerRepositoryImpl,
    run_id: Uuid,
) -> (Player, Player) {
    let (with_id, _) = repo
        .get_or_create_by_external_id("Alice", "7", run_id)
        .await
        .unwrap();
    // name lookup would return the older row, so insert the name-only row directly
    let name_only = Player::new(run_id, "Alice", None);
    player_entity::ActiveModel::from(&name_only)
        .insert(db)
        .await
        .unwrap();
    (with_id, name_only)
}

#[tokio::test]
async fn test_find_name_only_ignores_players_with_external_id() {
    let db = setup_database().await;
    let run_id = JobRunRepositoryImpl::new(db.clone())
        .create(&JobRun::new(None))
        .await
        .unwrap()
        .id;
    let repo = PlayerRepositoryImpl::new(db.clone());

    assert!(repo.find_name_only("Alice").await.unwrap().is_none());
    let (_, name_only) = seed_namesakes(db.as_ref(), &repo, run_id).await;

    let found = repo.find_name_only("Alice").await.unwrap().unwrap();
    assert_eq!(found.id, name_only.id);
    assert!(found.external_id.is_none());
}

/// 新外部标识补写到只有名称的玩家，而不是另建第三个 Alice
#[tokio::test]
async fn test_resolver_backfills_name_only_row_despite_older_namesake() {
    let db = setup_database().await;
    let job_runs = Arc::new(JobRunRepositoryImpl::new(db.clone()));
    let handle = RunTracker::new(job_runs).start(None).await.unwrap();
    let repo = Arc::new(PlayerRepositoryImpl::new(db.clone()));
    let (with_id, name_only) = seed_namesakes(db.as_ref(), &repo, handle.id()).await;

    let resolver = PlayerResolver::new(repo.clone(), handle.context());
    let player = resolver
        .resolve_directory(&PlayerDirectory::parse("Alice_42"))
        .await
        .unwrap();

    assert_eq!(player.id, name_only.id);
    assert_eq!(player.external_id.as_deref(), Some("42"));
    assert_eq!(handle.context().players_created(), 0);

    let alices = player_entity::Entity::find()
        .filter(player_entity::Column::PlayerName.eq("Alice"))
        .all(db.as_ref())
        .await
        .unwrap();
    assert_eq!(alices.len(), 2);
    let untouched = repo.find_by_id(with_id.id).await.unwrap().unwrap();
    assert_eq!(untouched.external_id.as_deref(), Some("7"));
}
