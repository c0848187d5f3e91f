use std::{sync::Arc, time::Duration, time::SystemTime};

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::{
    dto::{
        game::{GameSnapshot, GuessSummary, Location, PlayerSummary, RoundImage},
        ws::{
            CountdownUpdateEvent, EmptyEvent, GameStartedEvent, NewGuessEvent, NextRoundEvent,
            PrivateDataEvent, PrivateDataRevealedEvent, RoundFinishedEvent, ServerMessage,
        },
    },
    state::{
        catalog::RoundCatalog,
        countdown::{Countdown, CountdownTick, RoundToken},
        metadata::MetadataStore,
        registry::{ConnectionId, ConnectionRegistry, Participant},
    },
};

/// Phases of a game run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Lobby: players join, nothing is running.
    Waiting,
    /// A round is running and accepts guesses.
    Playing,
    /// The countdown expired; the round summary is on screen.
    Results,
    /// Every catalog round has been played.
    Finished,
    /// Collected metadata has been handed back to participants.
    Revealing,
}

/// A participant's answer for the current round.
#[derive(Debug, Clone, PartialEq)]
pub struct Guess {
    /// Display name of the submitter at submission time.
    pub player_name: String,
    /// Guessed latitude.
    pub lat: f64,
    /// Guessed longitude.
    pub lng: f64,
    /// Wall-clock submission time.
    pub submitted_at: SystemTime,
}

/// Failures the engine reports back to the command originator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `start-game` was requested but the catalog holds no rounds.
    #[error("no rounds found in the round catalog")]
    EmptyCatalog,
}

/// Fan-out capability the engine emits through.
pub trait Notifier: Send + Sync {
    /// Deliver `message` to every connection.
    fn broadcast(&self, message: &ServerMessage);
    /// Deliver `message` to a single connection.
    fn unicast(&self, connection_id: &ConnectionId, message: &ServerMessage);
}

/// Timing of every round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSettings {
    /// Seconds each round counts down from.
    pub countdown_secs: u32,
    /// Period between two ticks; each tick consumes exactly this much round time.
    pub tick_interval: Duration,
}

/// Authoritative owner of the game state.
///
/// Every method runs synchronously to completion and emits its broadcasts before
/// returning, so callers serialise access (the application keeps the engine behind a
/// single mutex) and observers never see a half-applied transition.
pub struct LifecycleEngine {
    catalog: Arc<RoundCatalog>,
    settings: RoundSettings,
    notifier: Arc<dyn Notifier>,
    ticks: mpsc::UnboundedSender<CountdownTick>,
    registry: ConnectionRegistry,
    phase: GamePhase,
    current_round: Option<usize>,
    guesses: IndexMap<ConnectionId, Guess>,
    time_left: Duration,
    countdown: Option<Countdown>,
    next_token: RoundToken,
}

impl LifecycleEngine {
    /// Create an engine waiting in the lobby.
    pub fn new(
        catalog: Arc<RoundCatalog>,
        settings: RoundSettings,
        notifier: Arc<dyn Notifier>,
        ticks: mpsc::UnboundedSender<CountdownTick>,
    ) -> Self {
        Self {
            catalog,
            settings,
            notifier,
            ticks,
            registry: ConnectionRegistry::new(),
            phase: GamePhase::Waiting,
            current_round: None,
            guesses: IndexMap::new(),
            time_left: Duration::ZERO,
            countdown: None,
            next_token: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Zero-based index of the current round.
    pub fn current_round(&self) -> Option<usize> {
        self.current_round
    }

    /// Seconds left in the running round.
    pub fn countdown_remaining(&self) -> u32 {
        whole_seconds(self.time_left)
    }

    /// Token of the live countdown, if one is running.
    pub fn countdown_token(&self) -> Option<RoundToken> {
        self.countdown.as_ref().map(Countdown::token)
    }

    /// Guesses submitted for the current round, keyed by connection.
    pub fn guesses(&self) -> &IndexMap<ConnectionId, Guess> {
        &self.guesses
    }

    /// Registered participants.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Participants in join order, as broadcast in `players-update`.
    pub fn players(&self) -> Vec<PlayerSummary> {
        self.registry
            .snapshot()
            .into_iter()
            .map(PlayerSummary::from)
            .collect()
    }

    /// Snapshot for late joiners and the REST API.
    pub fn snapshot(&self) -> GameSnapshot {
        let round_is_current = matches!(self.phase, GamePhase::Playing | GamePhase::Results);
        let image = self
            .current_round
            .filter(|_| round_is_current)
            .and_then(|index| self.catalog.get(index))
            .map(RoundImage::from);

        GameSnapshot {
            phase: self.phase,
            round: self.current_round.map(|index| index + 1),
            total_rounds: self.catalog.len(),
            seconds_remaining: if self.phase == GamePhase::Playing {
                self.countdown_remaining()
            } else {
                0
            },
            image,
            total_guesses: self.guesses.len(),
            total_players: self.registry.len(),
        }
    }

    /// Register or rename the participant behind `connection_id`.
    pub fn register(&mut self, connection_id: ConnectionId, name: String, device: String) {
        info!(id = %connection_id, name = %name, "player registered");
        self.registry.register(connection_id, name, device);
        self.broadcast_players();
    }

    /// Drop a connection: its participant entry and any pending guess.
    ///
    /// Returns the removed participant. Unknown connections cause no broadcast.
    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<Participant> {
        let removed = self.registry.remove(connection_id)?;
        self.guesses.shift_remove(connection_id);
        info!(id = %connection_id, name = %removed.name, "player removed");
        self.broadcast_players();
        Some(removed)
    }

    /// Start a fresh game from the lobby or after a finished game.
    ///
    /// An empty catalog is reported to `origin` only and leaves the state untouched.
    /// Requests while a game is running are ignored.
    pub fn start_game(&mut self, origin: &ConnectionId) -> Result<(), EngineError> {
        if !matches!(self.phase, GamePhase::Waiting | GamePhase::Finished) {
            debug!(phase = ?self.phase, id = %origin, "ignoring start-game outside of lobby");
            return Ok(());
        }

        let Some(first) = self.catalog.get(0) else {
            let err = EngineError::EmptyCatalog;
            self.notifier
                .unicast(origin, &ServerMessage::Error(err.to_string()));
            return Err(err);
        };
        let image = RoundImage::from(first);

        self.cancel_countdown();
        self.current_round = Some(0);
        self.guesses.clear();
        self.phase = GamePhase::Playing;
        self.start_countdown();

        info!(rounds = self.catalog.len(), "game started");
        self.notifier
            .broadcast(&ServerMessage::GameStarted(GameStartedEvent {
                image,
                countdown: self.countdown_remaining(),
            }));
        Ok(())
    }

    /// Record a guess for the running round. Last write wins.
    ///
    /// Guesses outside of `Playing` and from unregistered connections are dropped.
    pub fn submit_guess(&mut self, connection_id: &ConnectionId, lat: f64, lng: f64) {
        if self.phase != GamePhase::Playing {
            debug!(phase = ?self.phase, id = %connection_id, "ignoring late guess");
            return;
        }
        let Some(participant) = self.registry.get(connection_id) else {
            debug!(id = %connection_id, "ignoring guess from unregistered connection");
            return;
        };

        let player_name = participant.name.clone();
        self.guesses.insert(
            connection_id.clone(),
            Guess {
                player_name: player_name.clone(),
                lat,
                lng,
                submitted_at: SystemTime::now(),
            },
        );

        debug!(id = %connection_id, name = %player_name, lat, lng, "guess recorded");
        self.notifier
            .broadcast(&ServerMessage::NewGuess(NewGuessEvent {
                player_name,
                total_guesses: self.guesses.len(),
            }));
    }

    /// Apply one countdown tick: drain one tick interval from the round's time left and
    /// broadcast `countdown-update` whenever the whole-second value changes.
    ///
    /// Ticks from a countdown that is no longer live are discarded.
    pub fn on_countdown_tick(&mut self, tick: CountdownTick) {
        if self.countdown_token() != Some(tick.token) {
            debug!(token = tick.token, "discarding stale countdown tick");
            return;
        }

        let shown = self.countdown_remaining();
        self.time_left = self.time_left.saturating_sub(self.settings.tick_interval);
        let seconds_remaining = self.countdown_remaining();
        if seconds_remaining != shown {
            self.notifier
                .broadcast(&ServerMessage::CountdownUpdate(CountdownUpdateEvent {
                    seconds_remaining,
                }));
        }

        if self.time_left.is_zero() {
            self.finish_round();
        }
    }

    /// Move from the results screen to the next round, or finish the game when the
    /// catalog is exhausted.
    pub fn advance_round(&mut self, origin: &ConnectionId) {
        if self.phase != GamePhase::Results {
            debug!(phase = ?self.phase, id = %origin, "ignoring next-round outside of results");
            return;
        }
        self.cancel_countdown();

        let next = self.current_round.map_or(0, |index| index + 1);
        let Some(round) = self.catalog.get(next) else {
            self.phase = GamePhase::Finished;
            info!("game finished");
            self.notifier
                .broadcast(&ServerMessage::GameFinished(EmptyEvent::default()));
            return;
        };
        let image = RoundImage::from(round);

        self.current_round = Some(next);
        self.guesses.clear();
        self.phase = GamePhase::Playing;
        self.start_countdown();

        info!(round = next + 1, "next round started");
        self.notifier
            .broadcast(&ServerMessage::NextRound(NextRoundEvent {
                image,
                countdown: self.countdown_remaining(),
                round: next + 1,
                total_rounds: self.catalog.len(),
            }));
    }

    /// Hand every live participant the metadata collected for its connection.
    pub fn reveal_private_data(&mut self, metadata: &MetadataStore) {
        if !matches!(self.phase, GamePhase::Playing | GamePhase::Results) {
            debug!(phase = ?self.phase, "ignoring reveal-private-data");
            return;
        }
        self.cancel_countdown();
        self.phase = GamePhase::Revealing;

        let mut participants = 0;
        for connection_id in self.registry.connection_ids() {
            let entries = metadata.get(connection_id).unwrap_or_default();
            self.notifier.unicast(
                connection_id,
                &ServerMessage::PrivateData(PrivateDataEvent { entries }),
            );
            participants += 1;
        }

        info!(participants, "private data revealed");
        self.notifier
            .broadcast(&ServerMessage::PrivateDataRevealed(
                PrivateDataRevealedEvent { participants },
            ));
    }

    /// Leave the reveal (or final) screen and wait for a new game.
    pub fn return_to_lobby(&mut self) {
        if !matches!(self.phase, GamePhase::Revealing | GamePhase::Finished) {
            debug!(phase = ?self.phase, "ignoring return-to-lobby");
            return;
        }
        self.cancel_countdown();
        self.current_round = None;
        self.guesses.clear();
        self.time_left = Duration::ZERO;
        self.phase = GamePhase::Waiting;

        info!("returned to lobby");
        self.notifier
            .broadcast(&ServerMessage::ReturnedToLobby(EmptyEvent::default()));
    }

    fn finish_round(&mut self) {
        self.cancel_countdown();
        self.phase = GamePhase::Results;

        let Some(round) = self.current_round.and_then(|index| self.catalog.get(index)) else {
            return;
        };
        let guesses = self
            .guesses
            .iter()
            .map(|(id, guess)| (id.clone(), GuessSummary::from(guess)))
            .collect();

        info!(guesses = self.guesses.len(), "round finished");
        self.notifier
            .broadcast(&ServerMessage::RoundFinished(RoundFinishedEvent {
                correct_location: Location::from(round),
                guesses,
            }));
    }

    fn start_countdown(&mut self) {
        self.cancel_countdown();
        let token = self.next_token;
        self.next_token += 1;
        self.time_left = Duration::from_secs(u64::from(self.settings.countdown_secs));
        self.countdown = Some(Countdown::start(
            token,
            self.settings.tick_interval,
            self.ticks.clone(),
        ));
    }

    fn cancel_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            debug!(token = countdown.token(), "countdown cancelled");
        }
    }

    fn broadcast_players(&self) {
        self.notifier
            .broadcast(&ServerMessage::PlayersUpdate(self.players()));
    }
}

/// Seconds shown to players: `left` rounded up, so the display reaches zero only when
/// the round is over.
fn whole_seconds(left: Duration) -> u32 {
    let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}
