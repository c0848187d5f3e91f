//! Applies countdown ticks to the engine.

use tracing::info;

use crate::state::{SharedState, countdown::CountdownTicks};

/// Drain countdown ticks and apply each one under the engine lock.
///
/// Runs for the lifetime of the process; returns only once every tick sender (held by
/// the engine and its running timer) is gone.
pub async fn run_countdown_driver(state: SharedState, mut ticks: CountdownTicks) {
    while let Some(tick) = ticks.recv().await {
        state
            .with_engine(|engine| engine.on_countdown_tick(tick))
            .await;
    }
    info!("countdown driver stopped");
}
