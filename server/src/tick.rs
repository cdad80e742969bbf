//! Fixed-rate clock driving the world.
//!
//! The tick task never touches world state itself. It only posts a tick event
//! into the server's event loop, which is the single writer of the world.

use log::{debug, info};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Spawns the tick task. Each period `on_tick` produces one event for `sink`.
/// The task ends when `shutdown` flips to true, when its sender is dropped, or
/// when the sink closes.
pub fn spawn_tick_loop<T, F>(
    period: Duration,
    sink: mpsc::UnboundedSender<T>,
    mut shutdown: watch::Receiver<bool>,
    mut on_tick: F,
) -> JoinHandle<()>
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    tokio::spawn(async move {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // The first tick completes immediately
        timer.tick().await;

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    if sink.send(on_tick()).is_err() {
                        debug!("Tick sink closed");
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Tick loop stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_tick_loop(Duration::from_millis(100), tx, shutdown_rx, || ());

        // nothing before the first full period
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());

        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(()));
        }
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_loop() {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_tick_loop(Duration::from_millis(100), tx, shutdown_rx, || ());

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        // sender dropped with the task
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_sink_stops_loop() {
        let (tx, rx) = mpsc::unbounded_channel::<u8>();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(rx);
        let handle = spawn_tick_loop(Duration::from_millis(10), tx, shutdown_rx, || 1);
        handle.await.unwrap();
    }
}
