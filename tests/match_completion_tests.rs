mod utils;

use std::sync::Arc;

use matchday::{
    ledger::{LedgerRepository, MatchStatus},
    ActorContext, AppError, CompleteMatchRequest,
};
use utils::{goal, line, LedgerSetup};

#[tokio::test]
async fn test_two_one_home_win_records_results() {
    let mut setup = LedgerSetup::new().await;
    let home = setup.team("Harbour City").await;
    let away = setup.team("Valley Rovers").await;
    let striker = setup.player("Ines Costa", Some(&home)).await;
    let winger = setup.player("Tom Reyes", Some(&home)).await;
    let visitor = setup.player("Kofi Mensah", Some(&away)).await;
    let fixture = setup.fixture(&home, &away, "2024-09-14").await;

    let completed = setup
        .complete(
            &fixture,
            2,
            1,
            vec![
                line(&striker, 90, 2, 0),
                line(&winger, 78, 0, 2),
                line(&visitor, 90, 1, 0),
            ],
            vec![goal(&striker, 12), goal(&visitor, 55), goal(&striker, 81)],
        )
        .await;

    assert_eq!(completed.status, MatchStatus::Completed);
    assert_eq!((completed.home_score, completed.away_score), (2, 1));

    let snapshot = setup.snapshot().await;
    assert_eq!(snapshot.player_stats.len(), 3);
    assert_eq!(snapshot.scores.len(), 3);
    for score in &snapshot.scores {
        let expected = if score.player_id == striker.id { 1.0 } else { 0.0 };
        assert_eq!(score.result, Some(expected), "score at {}'", score.minute_scored);
    }

    let table = setup.analytics().standings().await.unwrap();
    assert_eq!(table[0].team_id, home.id);
    assert_eq!(table[0].points, 3);
    assert_eq!(table[1].points, 0);
    assert_eq!(table[1].goal_difference, -1);
}

#[tokio::test]
async fn test_one_one_draw_gives_half_results_and_a_point_each() {
    let mut setup = LedgerSetup::new().await;
    let home = setup.team("Harbour City").await;
    let away = setup.team("Valley Rovers").await;
    let home_scorer = setup.player("Ines Costa", Some(&home)).await;
    let away_scorer = setup.player("Kofi Mensah", Some(&away)).await;
    let fixture = setup.fixture(&home, &away, "2024-09-21").await;

    setup
        .complete(
            &fixture,
            1,
            1,
            vec![line(&home_scorer, 90, 1, 0), line(&away_scorer, 90, 1, 0)],
            vec![goal(&home_scorer, 30), goal(&away_scorer, 88)],
        )
        .await;

    let snapshot = setup.snapshot().await;
    assert!(snapshot.scores.iter().all(|s| s.result == Some(0.5)));

    let table = setup.analytics().standings().await.unwrap();
    assert!(table.iter().all(|row| row.points == 1 && row.draws == 1));
}

#[tokio::test]
async fn test_recompletion_conflicts_and_changes_nothing() {
    let mut setup = LedgerSetup::new().await;
    let home = setup.team("Harbour City").await;
    let away = setup.team("Valley Rovers").await;
    let striker = setup.player("Ines Costa", Some(&home)).await;
    let fixture = setup.fixture(&home, &away, "2024-09-14").await;

    setup
        .complete(&fixture, 1, 0, vec![line(&striker, 90, 1, 0)], vec![goal(&striker, 9)])
        .await;
    let before = setup.snapshot().await;

    for request in [
        CompleteMatchRequest::default(),
        CompleteMatchRequest {
            home_score: 4,
            away_score: 4,
            player_stats: vec![line(&striker, 90, 4, 0)],
            scoring_events: vec![goal(&striker, 1)],
        },
    ] {
        let err = setup
            .completion_service()
            .complete_match(&fixture.id, request, &ActorContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    assert_eq!(setup.snapshot().await, before);
}

#[tokio::test]
async fn test_non_participating_player_aborts_whole_completion() {
    let mut setup = LedgerSetup::new().await;
    let home = setup.team("Harbour City").await;
    let away = setup.team("Valley Rovers").await;
    let neutral = setup.team("Mountain United").await;
    let striker = setup.player("Ines Costa", Some(&home)).await;
    let outsider = setup.player("Lars Berg", Some(&neutral)).await;
    let free_agent = setup.player("Noa Levi", None).await;
    let fixture = setup.fixture(&home, &away, "2024-09-14").await;
    let before = setup.snapshot().await;

    for intruder in [&outsider, &free_agent] {
        let err = setup
            .completion_service()
            .complete_match(
                &fixture.id,
                CompleteMatchRequest {
                    home_score: 2,
                    away_score: 0,
                    player_stats: vec![line(&striker, 90, 1, 0), line(intruder, 90, 1, 0)],
                    scoring_events: vec![goal(&striker, 10), goal(intruder, 20)],
                },
                &ActorContext::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    let after = setup.snapshot().await;
    assert_eq!(after, before);
    let stored = setup.repo.get_match(&fixture.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MatchStatus::Upcoming);
}

#[tokio::test]
async fn test_unknown_player_is_bad_request() {
    let setup = LedgerSetup::new().await;
    let home = setup.team("Harbour City").await;
    let away = setup.team("Valley Rovers").await;
    let fixture = setup.fixture(&home, &away, "2024-09-14").await;

    let err = setup
        .completion_service()
        .complete_match(
            &fixture.id,
            CompleteMatchRequest {
                home_score: 1,
                scoring_events: vec![matchday::completion::ScoringEvent {
                    player_id: "ghost".to_string(),
                    minute_scored: Some(5),
                    goal_type: Some("penalty".to_string()),
                }],
                ..Default::default()
            },
            &ActorContext::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(ref msg) if msg.contains("ghost")));
}

#[tokio::test]
async fn test_repeated_stat_line_overwrites_counters() {
    let mut setup = LedgerSetup::new().await;
    let home = setup.team("Harbour City").await;
    let away = setup.team("Valley Rovers").await;
    let striker = setup.player("Ines Costa", Some(&home)).await;
    let fixture = setup.fixture(&home, &away, "2024-09-14").await;

    setup
        .complete(
            &fixture,
            0,
            0,
            vec![line(&striker, 45, 3, 3), line(&striker, 90, 0, 1)],
            vec![],
        )
        .await;

    let snapshot = setup.snapshot().await;
    assert_eq!(snapshot.player_stats.len(), 1);
    let stored = &snapshot.player_stats[0];
    assert_eq!(
        (stored.minutes_played, stored.goals, stored.assists),
        (90, 0, 1)
    );
}

#[tokio::test]
async fn test_concurrent_completions_let_exactly_one_win() {
    let mut setup = LedgerSetup::new().await;
    let home = setup.team("Harbour City").await;
    let away = setup.team("Valley Rovers").await;
    let striker = setup.player("Ines Costa", Some(&home)).await;
    let fixture = setup.fixture(&home, &away, "2024-09-14").await;

    let service = Arc::new(setup.completion_service());
    let mut handles = Vec::new();
    for (home_score, away_score) in [(1, 0), (3, 3)] {
        let service = Arc::clone(&service);
        let match_id = fixture.id.clone();
        let request = CompleteMatchRequest {
            home_score,
            away_score,
            player_stats: vec![line(&striker, 90, home_score, 0)],
            scoring_events: vec![],
        };
        handles.push(tokio::spawn(async move {
            service
                .complete_match(&match_id, request, &ActorContext::default())
                .await
        }));
    }

    let mut successes = Vec::new();
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(completed) => successes.push(completed),
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes.len(), 1);
    assert_eq!(conflicts, 1);

    // the stored result is the winner's, not a mix of both payloads
    let winner = &successes[0];
    let snapshot = setup.snapshot().await;
    let stored = snapshot.matches.iter().find(|m| m.id == fixture.id).unwrap();
    assert_eq!(
        (stored.home_score, stored.away_score),
        (winner.home_score, winner.away_score)
    );
    assert_eq!(snapshot.player_stats[0].goals, winner.home_score);
}

#[tokio::test]
async fn test_completed_match_cannot_be_deleted() {
    let setup = LedgerSetup::new().await;
    let home = setup.team("Harbour City").await;
    let away = setup.team("Valley Rovers").await;
    let played = setup.fixture(&home, &away, "2024-09-14").await;
    let pending = setup.fixture(&away, &home, "2024-12-14").await;

    setup.complete(&played, 0, 0, vec![], vec![]).await;

    assert!(matches!(
        setup.repo.delete_match(&played.id).await,
        Err(AppError::Conflict(_))
    ));
    setup.repo.delete_match(&pending.id).await.unwrap();
    assert!(setup.repo.get_match(&pending.id).await.unwrap().is_none());
}
