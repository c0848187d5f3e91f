use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

/// Identifies the round a countdown was started for.
pub type RoundToken = u64;

/// Tick posted by a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    /// Token of the countdown that produced the tick.
    pub token: RoundToken,
}

/// Receiving side of the tick channel, drained by the countdown driver.
pub type CountdownTicks = mpsc::UnboundedReceiver<CountdownTick>;

/// Handle to a running repeating timer. Dropping it stops the timer.
///
/// The timer task only posts [`CountdownTick`]s; it never touches game state. Ticks
/// already queued when the handle is dropped still carry the old token and are
/// discarded by the engine.
#[derive(Debug)]
pub struct Countdown {
    token: RoundToken,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Spawn a timer that posts a tick tagged with `token` every `period`, starting one
    /// period from now.
    pub fn start(
        token: RoundToken,
        period: Duration,
        ticks: mpsc::UnboundedSender<CountdownTick>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if ticks.send(CountdownTick { token }).is_err() {
                    break;
                }
            }
        });

        Self { token, task }
    }

    /// Token the timer tags its ticks with.
    pub fn token(&self) -> RoundToken {
        self.token
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period_with_token() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let started = Instant::now();
        let _countdown = Countdown::start(7, Duration::from_secs(1), tx);

        for expected in 1..=3u64 {
            let tick = rx.recv().await.unwrap();
            assert_eq!(tick, CountdownTick { token: 7 });
            assert_eq!(started.elapsed(), Duration::from_secs(expected));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let countdown = Countdown::start(1, Duration::from_secs(1), tx);
        assert_eq!(rx.recv().await, Some(CountdownTick { token: 1 }));

        drop(countdown);

        // The aborted task drops the only sender, closing the channel.
        assert_eq!(rx.recv().await, None);
    }
}
