use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{
    catalog::Round,
    engine::{GamePhase, Guess},
    registry::{ConnectionId, Participant},
};

use super::format_system_time;

/// Public part of a round: the photo, never the answer.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundImage {
    pub image_path: String,
}

impl From<&Round> for RoundImage {
    fn from(round: &Round) -> Self {
        Self {
            image_path: round.image_path.clone(),
        }
    }
}

/// A point on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl From<&Round> for Location {
    fn from(round: &Round) -> Self {
        Self {
            lat: round.lat,
            lng: round.lng,
        }
    }
}

/// Participant entry of the `players-update` list.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub connection_id: ConnectionId,
    pub name: String,
    pub device: String,
}

impl From<Participant> for PlayerSummary {
    fn from(value: Participant) -> Self {
        Self {
            connection_id: value.connection_id,
            name: value.name,
            device: value.device,
        }
    }
}

/// A guess as revealed once the round is over.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuessSummary {
    pub player_name: String,
    pub lat: f64,
    pub lng: f64,
    /// RFC 3339 submission timestamp.
    pub submitted_at: String,
}

impl From<&Guess> for GuessSummary {
    fn from(guess: &Guess) -> Self {
        Self {
            player_name: guess.player_name.clone(),
            lat: guess.lat,
            lng: guess.lng,
            submitted_at: format_system_time(guess.submitted_at),
        }
    }
}

/// Snapshot of the game sent to late joiners and served over REST.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub phase: GamePhase,
    /// One-based number of the current round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<usize>,
    pub total_rounds: usize,
    pub seconds_remaining: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<RoundImage>,
    pub total_guesses: usize,
    pub total_players: usize,
}
