//! Tokio-backed playback timer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::frame::TileSource;
use crate::sequencer::{RadarSequencer, SequencerOptions};
use crate::surface::{MapSurface, PlaybackTimer};

/// Sent once per elapsed interval. The receiver should call `on_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

/// Repeating timer that delivers [`Tick`]s over a channel.
///
/// Restarting cancels the previous task, so at most one ticker runs at a time.
pub struct IntervalTicker {
    tx: mpsc::Sender<Tick>,
    floor: Duration,
    cancel: Option<CancellationToken>,
}

impl IntervalTicker {
    pub fn new(tx: mpsc::Sender<Tick>, floor: Duration) -> Self {
        Self {
            tx,
            floor,
            cancel: None,
        }
    }

    /// Convenience constructor returning the receiving end too.
    pub fn channel(floor: Duration) -> (Self, mpsc::Receiver<Tick>) {
        let (tx, rx) = mpsc::channel(8);
        (Self::new(tx, floor), rx)
    }
}

impl PlaybackTimer for IntervalTicker {
    fn start(&mut self, interval: Duration) {
        self.stop();

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No tokio runtime, radar playback timer not started");
            return;
        };

        let period = interval.max(self.floor);
        let token = CancellationToken::new();
        let child = token.clone();
        let tx = self.tx.clone();

        handle.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        if tx.send(Tick).await.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::trace!("Radar ticker stopped");
        });

        self.cancel = Some(token);
    }

    fn stop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }

    fn is_running(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| !t.is_cancelled())
    }
}

impl<S: MapSurface> RadarSequencer<S, IntervalTicker> {
    /// Sequencer timed by a tokio interval. Feed every [`Tick`] from the
    /// returned receiver into [`RadarSequencer::on_tick`].
    pub fn with_interval(
        surface: S,
        tiles: TileSource,
        options: SequencerOptions,
    ) -> (Self, mpsc::Receiver<Tick>) {
        let (ticker, rx) = IntervalTicker::channel(options.min_step);
        (Self::new(surface, ticker, tiles, options), rx)
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
