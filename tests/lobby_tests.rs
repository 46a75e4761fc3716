//! From room to dealt session.

mod common;

use std::time::Duration;

use common::{wait_for_version, Harness};
use uno_sync::core::{GameMode, GameRng, SequentialIds, SessionId, SessionStatus, SyncConfig};
use uno_sync::lobby::{local_roster, LobbyError, Room, RoomCode};
use uno_sync::sync::Coordinator;

#[tokio::test]
async fn test_room_invite_to_first_version() {
    let harness = Harness::new(SyncConfig::default().with_poll_interval(Duration::from_millis(50)));
    let rng = GameRng::new(5);
    let mut room = Room::open(SessionId::new(common::SESSION), "u-host", "Ada", 3, &rng).unwrap();
    harness.host.open_room().await.unwrap();

    // A guest arrives through the invite link.
    let token = room.code.invite_token();
    let code = RoomCode::from_invite(&token).unwrap();
    assert_eq!(code, room.code);
    room.join("u-bob", "Bob").unwrap();

    assert_eq!(
        room.seat_players("u-host"),
        Err(LobbyError::WaitingForPlayers {
            joined: 2,
            expected: 3
        })
    );
    room.join("u-cy", "Cy").unwrap();
    assert_eq!(room.seat_players("u-bob"), Err(LobbyError::NotHost));

    let seeds = room.seat_players("u-host").unwrap();
    let version = harness
        .host
        .start_session(
            &seeds,
            GameMode::Online,
            &mut SequentialIds::new(),
            &mut GameRng::new(77),
        )
        .await
        .unwrap();
    room.mark_active();
    assert_eq!(version, 1);

    let bob = harness.peer(seeds[1].id.as_str()).await;
    wait_for_version(bob.as_ref(), 1).await;
    let session = bob.session_store().get().unwrap();
    assert_eq!(session.status, SessionStatus::Active);
    let names: Vec<_> = session.players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Ada", "Bob", "Cy"]);
    assert_eq!(
        session.players[1].user_id.as_deref(),
        Some("u-bob")
    );

    room.mark_finished();
    assert_eq!(room.join("u-late", "Dee"), Err(LobbyError::RoomFinished));
}

#[test]
fn test_room_slots_survive_rejoin() {
    let rng = GameRng::new(9);
    let mut room = Room::open(SessionId::new("r"), "u-host", "Ada", 4, &rng).unwrap();
    assert_eq!(room.join("u-bob", "Bob"), Ok(1));
    assert_eq!(room.join("u-cy", "Cy"), Ok(2));

    room.leave("u-bob");
    assert_eq!(room.join("u-dee", "Dee"), Ok(1));
    assert_eq!(room.join("u-cy", "Cy"), Ok(2));
    assert_eq!(room.join("u-bob", "Bob"), Ok(3));
    assert_eq!(room.join("u-eve", "Eve"), Err(LobbyError::RoomFull));
}

#[test]
fn test_local_roster_feeds_builder_sized_session() {
    let seeds = local_roster(&["  Ada ", "Bob", "Cy"]).unwrap();
    let ids: Vec<_> = seeds.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["p_1", "p_2", "p_3"]);
    assert_eq!(seeds[0].name, "Ada");

    let solo = local_roster(&["Ada"]).unwrap();
    assert_eq!(solo.len(), 2);
    assert!(solo[1].is_automated);
    assert_eq!(solo[1].id.as_str(), "p_ai_1");

    assert_eq!(local_roster(&["Ada", "ada"]), Err(LobbyError::DuplicateNames));
    assert_eq!(local_roster(&["Ada", "   "]), Err(LobbyError::MissingNames));
}
