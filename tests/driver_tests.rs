//! Automated players finishing whole games through coordinators.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::Harness;
use uno_sync::cards::STANDARD_DECK_SIZE;
use uno_sync::core::{DriverConfig, PlayerId, SyncConfig, SystemClock};
use uno_sync::driver::{AutoPlayer, BaselinePolicy, RandomPolicy};
use uno_sync::sync::Coordinator;
use uno_sync::{GameResult, UnoRules};

const GAME_TIMEOUT: Duration = Duration::from_secs(30);

fn instant() -> DriverConfig {
    DriverConfig::default().with_think_delay(Duration::ZERO)
}

fn ids(count: usize) -> Vec<PlayerId> {
    (1..=count).map(|i| PlayerId::new(format!("p_{i}"))).collect()
}

#[tokio::test]
async fn test_local_table_plays_to_completion() {
    let harness = Harness::new(SyncConfig::default());
    harness.start(3, 404).await;

    let driver = AutoPlayer::new(
        harness.host.clone() as Arc<dyn Coordinator>,
        UnoRules::default(),
        ids(3),
        BaselinePolicy,
        Arc::new(SystemClock),
        instant(),
        1,
    );
    let result = tokio::time::timeout(GAME_TIMEOUT, driver.run())
        .await
        .expect("game did not finish")
        .expect("store closed");

    let session = harness.host.session_store().get().unwrap();
    assert!(session.is_finished());
    assert_eq!(session.winner.as_ref(), Some(&result.winner));
    assert_eq!(session.round_points, Some(result.round_points));
    let winner = session.player(session.seat_of(&result.winner).unwrap()).unwrap();
    assert_eq!(winner.hand_size(), 0);
    assert_eq!(session.audit_cards(STANDARD_DECK_SIZE), Ok(()));
}

#[tokio::test]
async fn test_mixed_policies_share_one_table() {
    let harness = Harness::new(SyncConfig::default());
    harness.start(2, 12).await;
    let [first, second]: [PlayerId; 2] = ids(2).try_into().unwrap();

    let coordinator = harness.host.clone() as Arc<dyn Coordinator>;
    let careful = AutoPlayer::new(
        coordinator.clone(),
        UnoRules::default(),
        vec![first],
        BaselinePolicy,
        Arc::new(SystemClock),
        instant(),
        2,
    )
    .spawn();
    let reckless = AutoPlayer::new(
        coordinator,
        UnoRules::default(),
        vec![second],
        RandomPolicy,
        Arc::new(SystemClock),
        instant(),
        3,
    )
    .spawn();

    let (a, b) = tokio::time::timeout(GAME_TIMEOUT, async {
        (careful.await.unwrap(), reckless.await.unwrap())
    })
    .await
    .expect("game did not finish");
    assert_eq!(a, b);
    assert!(a.is_some());
}

#[tokio::test]
async fn test_peers_play_to_completion_over_the_hub() {
    let harness = Harness::new(SyncConfig::default().with_poll_interval(Duration::from_millis(50)));
    harness.host.open_room().await.unwrap();
    harness.start(3, 2024).await;

    let mut drivers = Vec::new();
    for (n, player) in ids(3).into_iter().enumerate() {
        let peer = harness.peer(player.as_str()).await;
        drivers.push(
            AutoPlayer::new(
                peer as Arc<dyn Coordinator>,
                UnoRules::default(),
                vec![player],
                BaselinePolicy,
                Arc::new(SystemClock),
                instant(),
                n as u64,
            )
            .spawn(),
        );
    }

    let results: Vec<Option<GameResult>> = tokio::time::timeout(GAME_TIMEOUT, async {
        let mut results = Vec::new();
        for driver in drivers {
            results.push(driver.await.unwrap());
        }
        results
    })
    .await
    .expect("game did not finish");

    let host_view = harness.host.session_store().get().unwrap();
    assert!(host_view.is_finished());
    for result in results {
        let result = result.expect("driver lost its store");
        assert_eq!(Some(&result.winner), host_view.winner.as_ref());
    }
    assert_eq!(host_view.audit_cards(STANDARD_DECK_SIZE), Ok(()));
}
