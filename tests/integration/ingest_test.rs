// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_app, replay_text, TestApp};
use chrono::{TimeZone, Utc};
use replayrs::domain::repositories::job_run_repository::JobRunRepository;
use replayrs::domain::repositories::match_repository::MatchRepository;
use replayrs::domain::repositories::player_repository::PlayerRepository;
use replayrs::infrastructure::database::entities::player as player_entity;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

const MONTH: &str = "2024_08_August";
const DAY: &str = "2024_08_August/03_Saturday";
const ALICE_DIR: &str = "2024_08_August/03_Saturday/Alice_42";
const ALICE_MATCH: &str = "2024_08_August/03_Saturday/Alice_42/00-12-30_1v1_Alice_Bob.txt";

const ONE_VS_ONE: &str = "  0 Alice (China)\n  1 Bob (USA Airforce)";

/// 一个月、一天、一个玩家目录、一个对局文件
async fn mount_single_match(app: &TestApp) {
    app.mount_listing("", &[("2024_08_August/", "2024-08-31 23:59")])
        .await;
    app.mount_listing(MONTH, &[("03_Saturday/", "2024-08-03 23:59")])
        .await;
    mount_alice_day(app).await;
}

/// 03_Saturday 当天的目录与对局
async fn mount_alice_day(app: &TestApp) {
    app.mount_listing(DAY, &[("Alice_42/", "2024-08-03 12:45")])
        .await;
    app.mount_listing(
        ALICE_DIR,
        &[
            ("00-12-30_1v1_Alice_Bob.txt", "2024-08-03 12:40"),
            ("00-12-30_1v1_Alice_Bob.rep", "2024-08-03 12:40"),
        ],
    )
    .await;
    app.mount_text(
        ALICE_MATCH,
        &replay_text("1v1", "2024 Aug 03, 12:27:56", ONE_VS_ONE),
    )
    .await;
}

/// 端到端：单个玩家目录中的单个对局
#[tokio::test]
async fn test_ingest_single_player_directory() {
    let app = create_test_app().await;
    mount_single_match(&app).await;

    let summary = app.service().run(None).await.unwrap();
    assert!(summary.success);
    assert_eq!(summary.matches_loaded, 1);
    assert_eq!(summary.players_created, 2);
    assert_eq!(summary.failed_units, 0);

    let alice = app
        .players
        .find_by_external_id("42")
        .await
        .unwrap()
        .expect("Alice should exist");
    assert_eq!(alice.player_name, "Alice");

    let alices = player_entity::Entity::find()
        .filter(player_entity::Column::PlayerName.eq("Alice"))
        .count(app.db.as_ref())
        .await
        .unwrap();
    assert_eq!(alices, 1);

    let replay = app
        .matches
        .find_by_replay_url(&app.replay_url(ALICE_MATCH))
        .await
        .unwrap()
        .expect("match should exist");
    assert_eq!(replay.match_type.as_deref(), Some("1v1"));
    assert_eq!(replay.starting_cash, Some(10000));
    assert_eq!(replay.game_version, "1.04");
    assert_eq!(replay.map.as_deref(), Some("Tournament Desert"));
    assert_eq!(replay.match_length_secs, Some(754));
    assert_eq!(replay.replay_size_kb, Some(300));
    assert_eq!(replay.replay_uploaded_by, alice.id);
    assert_eq!(
        replay.replay_upload_timestamp,
        Some(Utc.with_ymd_and_hms(2024, 8, 3, 12, 40, 0).unwrap())
    );
    assert_eq!(
        replay.match_timestamp,
        Some(Utc.with_ymd_and_hms(2024, 8, 3, 12, 27, 56).unwrap())
    );

    let participants = app.matches.find_players(replay.id).await.unwrap();
    assert_eq!(participants.len(), 2);
    assert!(participants.iter().all(|p| p.team.is_none()));
    assert!(participants.iter().any(|p| p.player_id == alice.id));

    let run = app
        .job_runs
        .find_by_id(summary.job_run_id)
        .await
        .unwrap()
        .expect("job run should exist");
    assert!(run.success);
    assert!(run.duration_ms.is_some_and(|ms| ms >= 0));
    assert_eq!(run.matches_loaded, 1);
    assert_eq!(run.players_created, 2);
    assert!(run.high_water_mark.is_none());
    assert!(!run.logs.is_empty());
}

/// 对未变化的远端重复运行不会新增对局
#[tokio::test]
async fn test_second_run_is_idempotent() {
    let app = create_test_app().await;
    mount_single_match(&app).await;

    let first = app.service().run(None).await.unwrap();
    assert_eq!(first.matches_loaded, 1);

    let second = app.service().run(None).await.unwrap();
    assert!(second.success);
    assert_eq!(second.matches_loaded, 0);
    assert_eq!(second.players_created, 0);

    assert_eq!(app.matches.count().await.unwrap(), 1);
    assert_eq!(app.players.count().await.unwrap(), 2);

    let run = app
        .job_runs
        .find_by_id(second.job_run_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        run.high_water_mark,
        Some(Utc.with_ymd_and_hms(2024, 8, 3, 12, 40, 0).unwrap())
    );
}

/// 高水位之前的目录项不会被访问
#[tokio::test]
async fn test_high_water_mark_skips_older_entries() {
    let app = create_test_app().await;
    app.mount_listing("", &[("2024_08_August/", "2024-08-31 23:59")])
        .await;
    app.mount_listing(
        MONTH,
        &[
            ("01_Thursday/", "2024-08-01 23:59"),
            ("03_Saturday/", "2024-08-03 23:59"),
        ],
    )
    .await;
    app.mount_listing("2024_08_August/01_Thursday", &[("Old_1/", "2024-08-01 20:00")])
        .await;
    app.mount_listing("2024_08_August/01_Thursday/Old_1", &[]).await;
    mount_alice_day(&app).await;

    let first = app.service().run(None).await.unwrap();
    assert_eq!(first.matches_loaded, 1);
    let seen = app
        .server
        .received_requests()
        .await
        .unwrap_or_default()
        .len();

    let second = app.service().run(None).await.unwrap();
    assert!(second.success);
    assert_eq!(second.matches_loaded, 0);

    let requests = app.server.received_requests().await.unwrap_or_default();
    assert!(requests.len() > seen);
    // the floor is inclusive, so the newest match file is listed again
    assert!(requests[seen..]
        .iter()
        .any(|r| r.url.path().ends_with("Alice_42")));
    assert!(!requests[seen..]
        .iter()
        .any(|r| r.url.path().ends_with("Old_1")));
}

/// 月、日目录的修改时间停留在首个玩家目录创建时
async fn mount_stale_day(app: &TestApp, files: &[(&str, &str)], player_modified: &str) {
    app.mount_listing("", &[("2024_08_August/", "2024-08-01 00:00")])
        .await;
    app.mount_listing(MONTH, &[("03_Saturday/", "2024-08-03 10:00")])
        .await;
    app.mount_listing(DAY, &[("Alice_42/", player_modified)]).await;
    app.mount_listing(ALICE_DIR, files).await;
}

/// 已有日目录中新增的对局不会更新日目录的修改时间，仍须被采集
#[tokio::test]
async fn test_new_match_in_stale_day_directory_is_ingested() {
    let app = create_test_app().await;
    mount_stale_day(
        &app,
        &[("00-12-30_1v1_Alice_Bob.txt", "2024-08-03 12:40")],
        "2024-08-03 12:40",
    )
    .await;
    app.mount_text(
        ALICE_MATCH,
        &replay_text("1v1", "2024 Aug 03, 12:27:56", ONE_VS_ONE),
    )
    .await;
    let first = app.service().run(None).await.unwrap();
    assert_eq!(first.matches_loaded, 1);

    // a later upload into the same player directory
    app.server.reset().await;
    let later = format!("{}/late.txt", ALICE_DIR);
    mount_stale_day(
        &app,
        &[
            ("00-12-30_1v1_Alice_Bob.txt", "2024-08-03 12:40"),
            ("late.txt", "2024-08-03 13:30"),
        ],
        "2024-08-03 13:30",
    )
    .await;
    app.mount_text(&later, &replay_text("1v1", "2024 Aug 03, 13:10:00", ONE_VS_ONE))
        .await;

    let second = app.service().run(None).await.unwrap();
    assert!(second.success);
    assert_eq!(second.matches_loaded, 1);
    assert!(app
        .matches
        .find_by_replay_url(&app.replay_url(&later))
        .await
        .unwrap()
        .is_some());
    assert_eq!(app.matches.count().await.unwrap(), 2);
}

/// 时间列损坏的目录行被跳过，并在运行日志中留下警告
#[tokio::test]
async fn test_skipped_listing_row_is_recorded_in_run_log() {
    let app = create_test_app().await;
    app.mount_listing("", &[("2024_08_August/", "2024-08-31 23:59")])
        .await;
    app.mount_listing(MONTH, &[("03_Saturday/", "2024-08-03 23:59")])
        .await;
    app.mount_listing(
        DAY,
        &[("Alice_42/", "2024-08-03 12:45"), ("Broken_7/", "garbage")],
    )
    .await;
    app.mount_listing(ALICE_DIR, &[("00-12-30_1v1_Alice_Bob.txt", "2024-08-03 12:40")])
        .await;
    app.mount_text(
        ALICE_MATCH,
        &replay_text("1v1", "2024 Aug 03, 12:27:56", ONE_VS_ONE),
    )
    .await;

    let summary = app.service().run(None).await.unwrap();
    assert!(summary.success);
    assert_eq!(summary.matches_loaded, 1);

    let run = app
        .job_runs
        .find_by_id(summary.job_run_id)
        .await
        .unwrap()
        .unwrap();
    assert!(run
        .logs
        .iter()
        .any(|line| line.contains("WARNING") && line.contains("Broken_7") && line.contains("garbage")));

    let requests = app.server.received_requests().await.unwrap_or_default();
    assert!(!requests.iter().any(|r| r.url.path().contains("Broken_7")));
}

/// 单个对局的时间字段损坏不影响其他对局与运行结果
#[tokio::test]
async fn test_malformed_match_date_does_not_affect_siblings() {
    let app = create_test_app().await;
    app.mount_listing("", &[("2024_08_August/", "2024-08-31 23:59")])
        .await;
    app.mount_listing(MONTH, &[("03_Saturday/", "2024-08-03 23:59")])
        .await;
    app.mount_listing(DAY, &[("Alice_42/", "2024-08-03 14:00")])
        .await;
    app.mount_listing(
        ALICE_DIR,
        &[
            ("first.txt", "2024-08-03 12:00"),
            ("second.txt", "2024-08-03 12:30"),
            ("third.txt", "2024-08-03 13:00"),
        ],
    )
    .await;
    app.mount_text(
        &format!("{}/first.txt", ALICE_DIR),
        &replay_text("1v1", "2024 Aug 03, 11:50:00", ONE_VS_ONE),
    )
    .await;
    app.mount_text(
        &format!("{}/second.txt", ALICE_DIR),
        &replay_text("1v1", "sometime in August", ONE_VS_ONE),
    )
    .await;
    app.mount_text(
        &format!("{}/third.txt", ALICE_DIR),
        &replay_text("1v1", "2024 Aug 03, 12:50:00", ONE_VS_ONE),
    )
    .await;

    let summary = app.service().run(None).await.unwrap();
    assert!(summary.success);
    assert_eq!(summary.failed_units, 0);
    assert_eq!(summary.matches_loaded, 3);

    let first = app
        .matches
        .find_by_replay_url(&app.replay_url(&format!("{}/first.txt", ALICE_DIR)))
        .await
        .unwrap()
        .unwrap();
    assert!(first.match_timestamp.is_some());

    let second = app
        .matches
        .find_by_replay_url(&app.replay_url(&format!("{}/second.txt", ALICE_DIR)))
        .await
        .unwrap()
        .unwrap();
    assert!(second.match_timestamp.is_none());

    let run = app
        .job_runs
        .find_by_id(summary.job_run_id)
        .await
        .unwrap()
        .unwrap();
    assert!(run
        .logs
        .iter()
        .any(|line| line.contains("WARNING") && line.contains("second.txt")));
}

/// 对局文件获取失败只放弃该单元
#[tokio::test]
async fn test_failed_match_fetch_is_isolated() {
    let app = create_test_app().await;
    app.mount_listing("", &[("2024_08_August/", "2024-08-31 23:59")])
        .await;
    app.mount_listing(MONTH, &[("03_Saturday/", "2024-08-03 23:59")])
        .await;
    app.mount_listing(DAY, &[("Alice_42/", "2024-08-03 14:00")])
        .await;
    app.mount_listing(
        ALICE_DIR,
        &[("good.txt", "2024-08-03 12:00"), ("gone.txt", "2024-08-03 12:30")],
    )
    .await;
    app.mount_text(
        &format!("{}/good.txt", ALICE_DIR),
        &replay_text("1v1", "2024 Aug 03, 11:50:00", ONE_VS_ONE),
    )
    .await;
    app.mount_status(&format!("{}/gone.txt", ALICE_DIR), 500)
        .await;

    let summary = app.service().run(None).await.unwrap();
    assert!(summary.success);
    assert_eq!(summary.matches_loaded, 1);
    assert_eq!(summary.failed_units, 1);

    let run = app
        .job_runs
        .find_by_id(summary.job_run_id)
        .await
        .unwrap()
        .unwrap();
    assert!(run
        .logs
        .iter()
        .any(|line| line.contains("ERROR") && line.contains("gone.txt")));
}

/// 先按名称出现的玩家在其目录被发现时补写外部标识
#[tokio::test]
async fn test_name_only_player_is_backfilled() {
    let app = create_test_app().await;
    app.mount_listing("", &[("2024_08_August/", "2024-08-31 23:59")])
        .await;
    app.mount_listing(
        MONTH,
        &[
            ("01_Thursday/", "2024-08-01 23:59"),
            ("02_Friday/", "2024-08-02 23:59"),
        ],
    )
    .await;
    app.mount_listing("2024_08_August/01_Thursday", &[("Bob_43/", "2024-08-01 20:00")])
        .await;
    app.mount_listing(
        "2024_08_August/01_Thursday/Bob_43",
        &[("bob.txt", "2024-08-01 19:00")],
    )
    .await;
    app.mount_text(
        "2024_08_August/01_Thursday/Bob_43/bob.txt",
        &replay_text("1v1", "2024 Aug 01, 18:40:00", "  0 Bob (USA)\n  1 Alice (China)"),
    )
    .await;
    app.mount_listing("2024_08_August/02_Friday", &[("Alice_42/", "2024-08-02 20:00")])
        .await;
    app.mount_listing(
        "2024_08_August/02_Friday/Alice_42",
        &[("alice.txt", "2024-08-02 19:00")],
    )
    .await;
    app.mount_text(
        "2024_08_August/02_Friday/Alice_42/alice.txt",
        &replay_text("1v1", "2024 Aug 02, 18:40:00", ONE_VS_ONE),
    )
    .await;

    let summary = app.service().run(None).await.unwrap();
    assert!(summary.success);
    assert_eq!(summary.matches_loaded, 2);
    assert_eq!(summary.players_created, 2);

    let alices = player_entity::Entity::find()
        .filter(player_entity::Column::PlayerName.eq("Alice"))
        .all(app.db.as_ref())
        .await
        .unwrap();
    assert_eq!(alices.len(), 1);
    assert_eq!(alices[0].external_id.as_deref(), Some("42"));

    let bob = app.players.find_by_external_id("43").await.unwrap().unwrap();
    assert_eq!(bob.player_name, "Bob");
}

/// 带队伍块的花名册
#[tokio::test]
async fn test_team_roster_is_persisted() {
    let app = create_test_app().await;
    app.mount_listing("", &[("2024_08_August/", "2024-08-31 23:59")])
        .await;
    app.mount_listing(MONTH, &[("03_Saturday/", "2024-08-03 23:59")])
        .await;
    app.mount_listing(DAY, &[("Alice_42/", "2024-08-03 14:00")])
        .await;
    app.mount_listing(ALICE_DIR, &[("2v2.txt", "2024-08-03 12:00")])
        .await;
    app.mount_text(
        &format!("{}/2v2.txt", ALICE_DIR),
        &replay_text(
            "2v2",
            "2024 Aug 03, 11:00:00",
            "Team 1\n  0 Alice (China)\n  1 Carol (GLA)\nTeam 2\n  2 Dave (USA)\n  3 Eve (USA Laser)",
        ),
    )
    .await;

    let summary = app.service().run(None).await.unwrap();
    assert_eq!(summary.matches_loaded, 1);

    let replay = app
        .matches
        .find_by_replay_url(&app.replay_url(&format!("{}/2v2.txt", ALICE_DIR)))
        .await
        .unwrap()
        .unwrap();
    let mut teams: Vec<Option<i32>> = app
        .matches
        .find_players(replay.id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.team)
        .collect();
    teams.sort();
    assert_eq!(teams, vec![Some(1), Some(1), Some(2), Some(2)]);
    assert_eq!(app.players.count().await.unwrap(), 4);
}

/// 忽略的月份不会被访问
#[tokio::test]
async fn test_ignored_month_is_not_listed() {
    let app = create_test_app().await;
    app.mount_listing(
        "",
        &[
            ("2024_05_May/", "2024-05-31 23:59"),
            ("2024_08_August/", "2024-08-31 23:59"),
        ],
    )
    .await;
    app.mount_listing(MONTH, &[]).await;

    let summary = app.service().run(None).await.unwrap();
    assert!(summary.success);
    assert_eq!(summary.failed_units, 0);

    let requests = app.server.received_requests().await.unwrap_or_default();
    assert!(!requests.iter().any(|r| r.url.path().contains("2024_05_May")));
}

/// 日目录列表失败只放弃该分支
#[tokio::test]
async fn test_day_listing_failure_aborts_branch_only() {
    let app = create_test_app().await;
    app.mount_listing("", &[("2024_08_August/", "2024-08-31 23:59")])
        .await;
    app.mount_listing(
        MONTH,
        &[
            ("02_Friday/", "2024-08-02 23:59"),
            ("03_Saturday/", "2024-08-03 23:59"),
        ],
    )
    .await;
    app.mount_status("2024_08_August/02_Friday", 503).await;
    mount_alice_day(&app).await;

    let summary = app.service().run(None).await.unwrap();
    assert!(summary.success);
    assert_eq!(summary.failed_units, 1);
    assert_eq!(summary.matches_loaded, 1);
}

/// 根目录不可用时运行仍被最终化为失败
#[tokio::test]
async fn test_root_listing_failure_finishes_run() {
    let app = create_test_app().await;
    app.mount_status("", 500).await;

    let summary = app.service().run(None).await.unwrap();
    assert!(!summary.success);

    let run = app
        .job_runs
        .find_by_id(summary.job_run_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!run.success);
    assert!(run.duration_ms.is_some_and(|ms| ms >= 0));
    assert!(run.logs.iter().any(|line| line.contains("Ingest aborted")));
    assert_eq!(app.matches.count().await.unwrap(), 0);
}

/// 手动起点覆盖数据库中的高水位
#[tokio::test]
async fn test_since_override_is_recorded() {
    let app = create_test_app().await;
    mount_single_match(&app).await;

    let since = Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap();
    let summary = app.service().run(Some(since)).await.unwrap();
    assert!(summary.success);
    assert_eq!(summary.matches_loaded, 0);

    let run = app
        .job_runs
        .find_by_id(summary.job_run_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(run.high_water_mark, Some(since));
}
