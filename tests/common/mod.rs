//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

use uno_sync::cards::{Card, Color};
use uno_sync::core::{
    CardId, GameMode, GameRng, GameSession, ManualClock, Player, PlayerId, PlayerSeed, Seat,
    SequentialIds, SessionId, SessionStatus, SyncConfig, TurnState,
};
use uno_sync::sync::{
    Coordinator, HostCoordinator, MemoryHub, MemoryRecordStore, PeerCoordinator, RecordStore,
    Transport,
};
use uno_sync::zones::Pile;
use uno_sync::UnoRules;

static LOGGING: OnceCell<()> = OnceCell::new();

/// Install a test-writer subscriber once. `TEST_LOG` wins over `RUST_LOG`.
pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "warn".to_string());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_test_writer()
            .without_time()
            .try_init();
    });
}

pub const SESSION: &str = "room-1";

pub fn red(id: u32, n: u8) -> Card {
    Card::number(CardId(id), Color::Red, n)
}

pub fn blue(id: u32, n: u8) -> Card {
    Card::number(CardId(id), Color::Blue, n)
}

pub fn green(id: u32, n: u8) -> Card {
    Card::number(CardId(id), Color::Green, n)
}

pub fn seeds(count: usize) -> Vec<PlayerSeed> {
    (1..=count)
        .map(|i| PlayerSeed::human(format!("p_{i}"), format!("Player {i}")))
        .collect()
}

/// A hand-arranged active session. Draw pile cards are bottom to top.
pub fn arranged(hands: Vec<Vec<Card>>, draw: Vec<Card>, top: Card) -> GameSession {
    let players = hands
        .into_iter()
        .enumerate()
        .map(|(i, hand)| {
            let mut player = Player::from_seed(PlayerSeed::human(
                format!("p_{}", i + 1),
                format!("Player {}", i + 1),
            ));
            player.hand = hand.into_iter().collect();
            player
        })
        .collect();

    let mut session = GameSession {
        id: SessionId::new(SESSION),
        mode: GameMode::Online,
        players,
        draw_pile: Pile::from_cards(draw),
        discard_pile: Pile::from_cards([top]),
        deck_size: 0,
        current_turn: Seat(0),
        direction: 1,
        active_color: top.color.unwrap_or(Color::Red),
        winner: None,
        round_points: None,
        history: im::Vector::new(),
        turn_state: TurnState::default(),
        pending_declaration: None,
        version: 0,
        status: SessionStatus::Active,
        rng: GameRng::new(11).state(),
        started_at_ms: 0,
    };
    session.deck_size = session.total_cards();
    session
}

/// A host wired to in-memory infrastructure.
pub struct Harness {
    pub records: Arc<MemoryRecordStore>,
    pub hub: Arc<MemoryHub>,
    pub clock: Arc<ManualClock>,
    pub host: Arc<HostCoordinator>,
    pub config: SyncConfig,
}

impl Harness {
    pub fn new(config: SyncConfig) -> Self {
        init_logging();
        let records = Arc::new(MemoryRecordStore::new());
        let hub = Arc::new(MemoryHub::new());
        let clock = Arc::new(ManualClock::new(1_000));
        let host = Arc::new(HostCoordinator::new(
            SessionId::new(SESSION),
            UnoRules::default(),
            records.clone() as Arc<dyn RecordStore>,
            hub.clone() as Arc<dyn Transport>,
            clock.clone(),
            config.clone(),
        ));
        host.spawn();
        Self {
            records,
            hub,
            clock,
            host,
            config,
        }
    }

    /// Deal a seeded session for `players` humans.
    pub async fn start(&self, players: usize, seed: u64) -> u64 {
        self.host
            .start_session(
                &seeds(players),
                GameMode::Online,
                &mut SequentialIds::new(),
                &mut GameRng::new(seed),
            )
            .await
            .unwrap()
    }

    pub async fn peer(&self, id: &str) -> Arc<PeerCoordinator> {
        self.peer_on(id, self.records.clone()).await
    }

    /// A joined peer reading the record through `records`.
    pub async fn peer_on(&self, id: &str, records: Arc<dyn RecordStore>) -> Arc<PeerCoordinator> {
        let peer = Arc::new(PeerCoordinator::new(
            SessionId::new(SESSION),
            PlayerId::new(id),
            records,
            self.hub.clone() as Arc<dyn Transport>,
            self.config.clone(),
        ));
        peer.join().await.unwrap();
        peer
    }

    pub fn host_version(&self) -> u64 {
        self.host.session_store().version().unwrap_or(0)
    }
}

/// Wait until `coordinator` has adopted at least `version`.
pub async fn wait_for_version(coordinator: &dyn Coordinator, version: u64) {
    let mut events = coordinator.session_store().subscribe();
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while coordinator.session_store().version().unwrap_or(0) < version {
            let _ = events.recv().await;
        }
    })
    .await
    .expect("version never arrived");
}
