mod common;

use common::{match_at, players};
use matchbot_store::store::roster::RosterEntry;
use matchbot_store::{DbError, Match, MatchState, Player, Team};
use time::macros::datetime;

#[tokio::test]
async fn player_cannot_be_seated_twice_in_one_match() {
    let service = common::service().await;
    let roster = players(service.pool(), &["p1", "p2"]).await;
    let m = match_at(0, vec![roster[0].clone()], vec![roster[1].clone()]);
    service.create_match(&m).await.unwrap();

    let mut conn = service.pool().acquire().await.unwrap();
    let err = RosterEntry::insert_many(&mut conn, &m.id, Team::Two, &roster[..1])
        .await
        .unwrap_err();
    drop(conn);

    assert!(err.is_constraint(), "{err:?}");
    let entries = RosterEntry::get_by_match(service.pool(), &m.id).await.unwrap();
    assert_eq!(
        entries,
        vec![
            RosterEntry {
                match_id: m.id.clone(),
                player_id: "p1".to_string(),
                team: Team::One,
            },
            RosterEntry {
                match_id: m.id.clone(),
                player_id: "p2".to_string(),
                team: Team::Two,
            },
        ]
    );
}

#[tokio::test]
async fn unknown_match_has_empty_teams() {
    let service = common::service().await;
    assert!(RosterEntry::get_team(service.pool(), "nope", Team::One)
        .await
        .unwrap()
        .is_empty());
    assert!(RosterEntry::get_by_match(service.pool(), "nope")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn list_by_state_honours_limit_and_order() {
    let service = common::service().await;
    let roster = players(service.pool(), &["p1", "p2"]).await;
    for minute in [30, 10, 20] {
        service
            .create_match(&match_at(minute, vec![roster[0].clone()], vec![roster[1].clone()]))
            .await
            .unwrap();
    }

    let listed = Match::list_by_state(service.pool(), MatchState::Running, 2)
        .await
        .unwrap();
    let threads: Vec<&str> = listed.iter().map(|m| m.thread_id.as_str()).collect();
    assert_eq!(threads, vec!["thread-10", "thread-20"]);
    assert!(listed.iter().all(|m| m.team1.is_empty() && m.team2.is_empty()));

    let none = Match::list_by_state(service.pool(), MatchState::Team2Won, 50)
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn stored_state_is_read_back() {
    let service = common::service().await;
    let roster = players(service.pool(), &["p1", "p2"]).await;
    let mut m = match_at(0, vec![roster[0].clone()], vec![roster[1].clone()]);
    assert!(Match::get_state(service.pool(), &m.id)
        .await
        .unwrap_err()
        .is_not_found());

    service.create_match(&m).await.unwrap();
    service
        .transition_match(&mut m, MatchState::AwaitingVotes)
        .await
        .unwrap();

    assert_eq!(
        Match::get_state(service.pool(), &m.id).await.unwrap(),
        MatchState::AwaitingVotes
    );
}

#[tokio::test]
async fn unknown_state_code_is_a_conversion_error() {
    let service = common::service().await;
    let roster = players(service.pool(), &["p1", "p2"]).await;
    let m = match_at(0, vec![roster[0].clone()], vec![roster[1].clone()]);
    service.create_match(&m).await.unwrap();
    sqlx::query("UPDATE matches SET state = 99 WHERE id = ?")
        .bind(&m.id)
        .execute(service.pool())
        .await
        .unwrap();

    let err = service.get_match_by_id(&m.id).await.unwrap_err();
    assert!(err.to_string().contains("unknown state 99"), "{err}");
    let err = service.update_match(&m).await.unwrap_err();
    assert!(matches!(err, DbError::Conversion(_)), "{err:?}");
}

#[tokio::test]
async fn player_directory_upserts() {
    let pool = common::pool().await;
    let mut player = Player::new("123456789");
    player.save(&pool).await.unwrap();

    player.elo = 1234;
    player.linked_account = Some("someone".to_string());
    player.last_rank_update = Some(datetime!(2023-03-02 12:30:00.25 UTC));
    player.credits = 40;
    player.save(&pool).await.unwrap();

    assert_eq!(Player::get(&pool, "123456789").await.unwrap(), player);
    assert!(Player::get(&pool, "nobody").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn login_registers_unknown_players_once() {
    let pool = common::pool().await;

    let created = Player::get_or_create(&pool, "42").await.unwrap();
    assert_eq!(created, Player::new("42"));

    let mut rich = created.clone();
    rich.credits = 500;
    rich.save(&pool).await.unwrap();
    let again = Player::get_or_create(&pool, "42").await.unwrap();
    assert_eq!(again.credits, 500);
}
