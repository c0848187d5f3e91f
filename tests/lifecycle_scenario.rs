use std::time::Duration;

use axum::extract::ws::Message;
use indexmap::IndexMap;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use geo_quiz_back::{
    config::AppConfig,
    dto::{
        metadata::MetadataSubmission,
        ws::{ClientMessage, RegisterPlayer, SubmitGuess},
    },
    services::{countdown_service::run_countdown_driver, game_service, metadata_service},
    state::{
        AppState, SharedState,
        catalog::{Round, RoundCatalog},
        engine::GamePhase,
        registry::ConnectionId,
    },
};

type Inbox = mpsc::UnboundedReceiver<Message>;

fn config(retain_metadata_on_disconnect: bool) -> AppConfig {
    AppConfig {
        round_duration: Duration::from_secs(5),
        retain_metadata_on_disconnect,
        ..AppConfig::default()
    }
}

fn catalog() -> RoundCatalog {
    RoundCatalog::new(vec![
        Round {
            image_path: "images/berlin.jpg".into(),
            lat: 52.52,
            lng: 13.405,
            label: "Berlin".into(),
        },
        Round {
            image_path: "images/paris.jpg".into(),
            lat: 48.8566,
            lng: 2.3522,
            label: "Paris".into(),
        },
    ])
}

fn start(config: AppConfig, catalog: RoundCatalog) -> SharedState {
    let (state, ticks) = AppState::new(config, catalog);
    tokio::spawn(run_countdown_driver(state.clone(), ticks));
    state
}

async fn connect(state: &SharedState) -> (ConnectionId, Inbox) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = game_service::open_connection(state, tx).await;

    let greeting: Vec<_> = [
        next_event(&mut rx).await,
        next_event(&mut rx).await,
        next_event(&mut rx).await,
    ]
    .into_iter()
    .map(|event| event["event"].as_str().unwrap_or_default().to_string())
    .collect();
    assert_eq!(greeting, vec!["connected", "game-state", "players-update"]);

    (id, rx)
}

async fn next_event(rx: &mut Inbox) -> Value {
    match rx.recv().await {
        Some(Message::Text(text)) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

async fn send(state: &SharedState, id: &ConnectionId, message: ClientMessage) {
    game_service::handle_client_message(state, id, message)
        .await
        .unwrap();
}

async fn expect_countdown(rx: &mut Inbox) {
    for remaining in (0..5).rev() {
        assert_eq!(
            next_event(rx).await,
            json!({"event": "countdown-update", "data": {"secondsRemaining": remaining}})
        );
    }
}

async fn phase(state: &SharedState) -> GamePhase {
    game_service::snapshot(state).await.phase
}

#[tokio::test(start_paused = true)]
async fn two_round_game_runs_to_completion() {
    let state = start(config(false), catalog());
    let (admin, mut admin_rx) = connect(&state).await;
    let (player, mut player_rx) = connect(&state).await;

    send(
        &state,
        &player,
        ClientMessage::RegisterPlayer(RegisterPlayer {
            name: "Ada".into(),
            device: "phone".into(),
        }),
    )
    .await;
    let update = next_event(&mut admin_rx).await;
    assert_eq!(update["event"], "players-update");
    assert_eq!(update["data"][0]["name"], "Ada");
    next_event(&mut player_rx).await;

    send(&state, &admin, ClientMessage::StartGame).await;
    assert_eq!(
        next_event(&mut admin_rx).await,
        json!({"event": "game-started", "data": {"image": {"imagePath": "images/berlin.jpg"}, "countdown": 5}})
    );

    send(
        &state,
        &player,
        ClientMessage::SubmitGuess(SubmitGuess {
            lat: 50.0,
            lng: 10.0,
        }),
    )
    .await;
    assert_eq!(
        next_event(&mut admin_rx).await,
        json!({"event": "new-guess", "data": {"playerName": "Ada", "totalGuesses": 1}})
    );

    expect_countdown(&mut admin_rx).await;
    let finished = next_event(&mut admin_rx).await;
    assert_eq!(finished["event"], "round-finished");
    assert_eq!(
        finished["data"]["correctLocation"],
        json!({"lat": 52.52, "lng": 13.405})
    );
    let guess = &finished["data"]["guesses"][player.as_str()];
    assert_eq!(guess["playerName"], "Ada");
    assert_eq!(guess["lat"], 50.0);
    assert_eq!(phase(&state).await, GamePhase::Results);

    send(&state, &admin, ClientMessage::NextRound).await;
    assert_eq!(
        next_event(&mut admin_rx).await,
        json!({"event": "next-round", "data": {
            "image": {"imagePath": "images/paris.jpg"},
            "countdown": 5,
            "round": 2,
            "totalRounds": 2
        }})
    );

    expect_countdown(&mut admin_rx).await;
    let finished = next_event(&mut admin_rx).await;
    assert_eq!(finished["event"], "round-finished");
    assert_eq!(
        finished["data"]["correctLocation"],
        json!({"lat": 48.8566, "lng": 2.3522})
    );
    assert_eq!(finished["data"]["guesses"], json!({}));

    send(&state, &admin, ClientMessage::NextRound).await;
    assert_eq!(
        next_event(&mut admin_rx).await,
        json!({"event": "game-finished", "data": {}})
    );
    assert_eq!(phase(&state).await, GamePhase::Finished);

    // No timer survives the end of the game.
    let silence = tokio::time::timeout(Duration::from_secs(30), admin_rx.recv()).await;
    assert!(silence.is_err(), "unexpected event after game end: {silence:?}");
}

#[tokio::test(start_paused = true)]
async fn late_guess_is_not_reported() {
    let state = start(config(false), catalog());
    let (admin, mut admin_rx) = connect(&state).await;
    let (player, _player_rx) = connect(&state).await;
    send(
        &state,
        &player,
        ClientMessage::RegisterPlayer(RegisterPlayer {
            name: "Bob".into(),
            device: String::new(),
        }),
    )
    .await;
    next_event(&mut admin_rx).await;

    send(&state, &admin, ClientMessage::StartGame).await;
    next_event(&mut admin_rx).await;
    expect_countdown(&mut admin_rx).await;
    assert_eq!(next_event(&mut admin_rx).await["event"], "round-finished");

    send(
        &state,
        &player,
        ClientMessage::SubmitGuess(SubmitGuess { lat: 1.0, lng: 1.0 }),
    )
    .await;
    send(&state, &admin, ClientMessage::NextRound).await;
    assert_eq!(next_event(&mut admin_rx).await["event"], "next-round");
    expect_countdown(&mut admin_rx).await;

    let finished = next_event(&mut admin_rx).await;
    assert_eq!(finished["event"], "round-finished");
    assert_eq!(finished["data"]["guesses"], json!({}));
}

#[tokio::test(start_paused = true)]
async fn empty_catalog_error_reaches_only_the_requester() {
    let state = start(config(false), RoundCatalog::default());
    let (admin, mut admin_rx) = connect(&state).await;
    let (_other, mut other_rx) = connect(&state).await;

    let result =
        game_service::handle_client_message(&state, &admin, ClientMessage::StartGame).await;
    assert!(result.is_err());

    assert_eq!(
        next_event(&mut admin_rx).await,
        json!({"event": "error", "data": "no rounds found in the round catalog"})
    );
    assert!(other_rx.try_recv().is_err());
    assert_eq!(phase(&state).await, GamePhase::Waiting);
}

#[tokio::test(start_paused = true)]
async fn metadata_is_revealed_to_its_owner_and_dropped_on_disconnect() {
    let state = start(config(false), catalog());
    let (admin, mut admin_rx) = connect(&state).await;
    let (player, mut player_rx) = connect(&state).await;
    send(
        &state,
        &player,
        ClientMessage::RegisterPlayer(RegisterPlayer {
            name: "Cy".into(),
            device: "tablet".into(),
        }),
    )
    .await;
    next_event(&mut admin_rx).await;
    next_event(&mut player_rx).await;

    let mut entries = IndexMap::new();
    entries.insert("screen".to_string(), json!("1920x1080"));
    metadata_service::submit(&state, player.clone(), MetadataSubmission { entries })
        .await
        .unwrap();

    send(&state, &admin, ClientMessage::StartGame).await;
    next_event(&mut player_rx).await;
    send(&state, &admin, ClientMessage::RevealPrivateData).await;

    assert_eq!(
        next_event(&mut player_rx).await,
        json!({"event": "private-data", "data": {"entries": {"screen": "1920x1080"}}})
    );
    assert_eq!(
        next_event(&mut player_rx).await,
        json!({"event": "private-data-revealed", "data": {"participants": 1}})
    );
    assert_eq!(phase(&state).await, GamePhase::Revealing);

    send(&state, &admin, ClientMessage::ReturnToLobby).await;
    assert_eq!(
        next_event(&mut player_rx).await,
        json!({"event": "returned-to-lobby", "data": {}})
    );

    game_service::close_connection(&state, &player).await;
    assert!(metadata_service::get(&state, player.clone()).is_err());
    assert!(game_service::players(&state).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn metadata_can_be_retained_after_disconnect() {
    let state = start(config(true), catalog());
    let (player, _player_rx) = connect(&state).await;

    let mut entries = IndexMap::new();
    entries.insert("lang".to_string(), json!("de"));
    metadata_service::submit(&state, player.clone(), MetadataSubmission { entries })
        .await
        .unwrap();
    game_service::close_connection(&state, &player).await;

    let stored = metadata_service::get(&state, player.clone()).unwrap();
    assert_eq!(stored.entries["lang"], json!("de"));

    let mut entries = IndexMap::new();
    entries.insert("lang".to_string(), json!("en"));
    assert!(
        metadata_service::submit(&state, player, MetadataSubmission { entries })
            .await
            .is_err()
    );
}

#[tokio::test(start_paused = true)]
async fn submission_for_a_closed_connection_stores_nothing() {
    let state = start(config(false), catalog());
    let (player, _player_rx) = connect(&state).await;
    game_service::close_connection(&state, &player).await;

    let mut entries = IndexMap::new();
    entries.insert("lang".to_string(), json!("de"));
    let result =
        metadata_service::submit(&state, player.clone(), MetadataSubmission { entries }).await;

    assert!(result.is_err());
    assert!(state.metadata().get(&player).is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submit_and_close_never_orphan_metadata() {
    let state = start(config(false), catalog());

    let mut workers = Vec::new();
    for _ in 0..200 {
        let state = state.clone();
        workers.push(tokio::spawn(async move {
            let (tx, _rx) = mpsc::unbounded_channel();
            let id = game_service::open_connection(&state, tx).await;

            let submitter = {
                let state = state.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    let mut entries = IndexMap::new();
                    entries.insert("k".to_string(), json!(1));
                    let _ = metadata_service::submit(&state, id, MetadataSubmission { entries })
                        .await;
                })
            };
            game_service::close_connection(&state, &id).await;
            submitter.await.unwrap();
            id
        }));
    }

    for worker in workers {
        let id = worker.await.unwrap();
        assert!(state.metadata().get(&id).is_none(), "orphaned metadata for {id}");
    }
}
