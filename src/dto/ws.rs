//! Event envelopes exchanged over the game WebSocket.
//!
//! Every frame is a JSON object `{"event": "<name>", "data": <payload>}`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        game::{GameSnapshot, GuessSummary, Location, PlayerSummary, RoundImage},
        sse::ServerEvent,
        validation::validate_display_name,
    },
    state::registry::ConnectionId,
};

const MAX_NAME_LEN: usize = 64;
const MAX_DEVICE_LEN: usize = 128;

/// Raw envelope, decoded before the payload is interpreted.
#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Reasons an inbound frame is rejected.
#[derive(Debug, Error)]
pub enum InboundError {
    /// Not a JSON envelope, or the payload does not match the event.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The event name is not part of the protocol.
    #[error("unknown event `{0}`")]
    UnknownEvent(String),
    /// Payload failed validation.
    #[error("invalid payload: {0}")]
    Invalid(#[from] ValidationErrors),
}

/// Messages accepted from game WebSocket clients.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Join (or rename) as a participant.
    RegisterPlayer(RegisterPlayer),
    /// Submit a guess for the current round.
    SubmitGuess(SubmitGuess),
    /// Administrator: start a new game.
    StartGame,
    /// Administrator: advance to the next round.
    NextRound,
    /// Administrator: hand collected metadata back to its owners.
    RevealPrivateData,
    /// Administrator: go back to the waiting lobby.
    ReturnToLobby,
}

impl ClientMessage {
    /// Parse and validate an inbound text frame.
    pub fn from_json_str(text: &str) -> Result<Self, InboundError> {
        let Envelope { event, data } = serde_json::from_str(text)?;
        let message = match event.as_str() {
            "register-player" => {
                let payload: RegisterPlayer = serde_json::from_value(data)?;
                payload.validate()?;
                Self::RegisterPlayer(payload)
            }
            "submit-guess" => {
                let payload: SubmitGuess = serde_json::from_value(data)?;
                payload.validate()?;
                Self::SubmitGuess(payload)
            }
            "start-game" => Self::StartGame,
            "next-round" => Self::NextRound,
            "reveal-private-data" => Self::RevealPrivateData,
            "return-to-lobby" => Self::ReturnToLobby,
            _ => return Err(InboundError::UnknownEvent(event)),
        };
        Ok(message)
    }
}

/// Payload of `register-player`.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct RegisterPlayer {
    pub name: String,
    #[serde(default)]
    pub device: String,
}

impl Validate for RegisterPlayer {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_display_name(&self.name) {
            errors.add("name", e);
        } else if self.name.chars().count() > MAX_NAME_LEN {
            let mut e = validator::ValidationError::new("length");
            e.message = Some(format!("Name must be at most {MAX_NAME_LEN} characters").into());
            errors.add("name", e);
        }

        if self.device.chars().count() > MAX_DEVICE_LEN {
            let mut e = validator::ValidationError::new("length");
            e.message = Some(format!("Device must be at most {MAX_DEVICE_LEN} characters").into());
            errors.add("device", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Payload of `submit-guess`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, ToSchema, Validate)]
pub struct SubmitGuess {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

/// Messages pushed to game WebSocket clients.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Unicast right after the socket opens.
    Connected(ConnectedEvent),
    /// Unicast right after the socket opens so late joiners can catch up.
    GameState(GameSnapshot),
    /// Full participant list, on every join or leave.
    PlayersUpdate(Vec<PlayerSummary>),
    /// First round of a new game.
    GameStarted(GameStartedEvent),
    /// Someone guessed; coordinates are withheld until the round ends.
    NewGuess(NewGuessEvent),
    /// A later round started.
    NextRound(NextRoundEvent),
    /// The catalog is exhausted.
    GameFinished(EmptyEvent),
    /// One countdown tick.
    CountdownUpdate(CountdownUpdateEvent),
    /// The countdown expired; the answer and every guess are revealed.
    RoundFinished(RoundFinishedEvent),
    /// Unicast: metadata collected for the receiving connection.
    PrivateData(PrivateDataEvent),
    /// Metadata has been handed back to every participant.
    PrivateDataRevealed(PrivateDataRevealedEvent),
    /// The game went back to the waiting lobby.
    ReturnedToLobby(EmptyEvent),
    /// Unicast to the connection whose command failed.
    Error(String),
}

impl ServerMessage {
    /// Protocol name of the event.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::GameState(_) => "game-state",
            Self::PlayersUpdate(_) => "players-update",
            Self::GameStarted(_) => "game-started",
            Self::NewGuess(_) => "new-guess",
            Self::NextRound(_) => "next-round",
            Self::GameFinished(_) => "game-finished",
            Self::CountdownUpdate(_) => "countdown-update",
            Self::RoundFinished(_) => "round-finished",
            Self::PrivateData(_) => "private-data",
            Self::PrivateDataRevealed(_) => "private-data-revealed",
            Self::ReturnedToLobby(_) => "returned-to-lobby",
            Self::Error(_) => "error",
        }
    }

    /// Full envelope as sent over the WebSocket.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// SSE form: event name plus the bare payload as data.
    pub fn to_server_event(&self) -> serde_json::Result<ServerEvent> {
        let data = match serde_json::to_value(self)? {
            Value::Object(mut envelope) => envelope.remove("data").unwrap_or(Value::Null),
            other => other,
        };
        Ok(ServerEvent::new(self.event_name(), data.to_string()))
    }
}

/// Payload-less event body, serialised as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct EmptyEvent {}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Identity assigned to the connection.
pub struct ConnectedEvent {
    pub connection_id: ConnectionId,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
/// Sent when the first round starts.
pub struct GameStartedEvent {
    pub image: RoundImage,
    pub countdown: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Lightweight notification of a submitted guess.
pub struct NewGuessEvent {
    pub player_name: String,
    pub total_guesses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Sent when a later round starts. `round` is one-based.
pub struct NextRoundEvent {
    pub image: RoundImage,
    pub countdown: u32,
    pub round: usize,
    pub total_rounds: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Remaining seconds of the running round.
pub struct CountdownUpdateEvent {
    pub seconds_remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Round summary: correct answer plus every guess keyed by connection.
pub struct RoundFinishedEvent {
    pub correct_location: Location,
    #[schema(value_type = Object)]
    pub guesses: IndexMap<ConnectionId, GuessSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
/// Metadata collected for the receiving connection.
pub struct PrivateDataEvent {
    #[schema(value_type = Object)]
    pub entries: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
/// Number of participants that received their metadata.
pub struct PrivateDataRevealedEvent {
    pub participants: usize,
}
