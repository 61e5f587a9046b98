//! Periodic status announcer.

use std::time::Duration;

use chrono::Local;
use tokio::time::{Instant, MissedTickBehavior};

use super::Broadcaster;
use crate::shutdown::ShutdownSignal;
use crate::ws::messages;

/// Broadcasts a timestamped status line every `period` while anyone is
/// connected.
///
/// Each wait races the timer against `signal`, so the loop ends as soon as
/// shutdown is requested rather than up to one period later. Returns the
/// number of announcements sent.
pub async fn run_announcer(
    broadcaster: Broadcaster,
    signal: ShutdownSignal,
    period: Duration,
) -> usize {
    tracing::info!(period_secs = period.as_secs(), "periodic announcer started");
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sent = 0_usize;

    loop {
        tokio::select! {
            biased;
            () = signal.triggered() => break,
            _ = ticker.tick() => {}
        }

        let active = broadcaster.registry().count().await;
        if active == 0 {
            continue;
        }
        tracing::info!(active, "sending periodic broadcast");
        broadcaster
            .broadcast_all(&messages::periodic_status(Local::now(), active))
            .await;
        sent += 1;
    }

    tracing::info!(sent, "periodic announcer stopped");
    sent
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::ConnectionRegistry;
    use crate::domain::test_support::{RecordingHandle, as_shared, client};

    fn engine() -> Broadcaster {
        Broadcaster::new(Arc::new(ConnectionRegistry::new()), Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn announces_on_each_tick_while_clients_connected() {
        let engine = engine();
        let handle = RecordingHandle::new();
        engine.registry().register(client("a"), as_shared(&handle)).await;
        let signal = ShutdownSignal::new();

        let task = tokio::spawn(run_announcer(
            engine.clone(),
            signal.clone(),
            Duration::from_secs(10),
        ));
        tokio::time::sleep(Duration::from_secs(25)).await;
        signal.trigger();

        let Ok(sent) = task.await else {
            panic!("announcer task panicked");
        };
        assert_eq!(sent, 2);
        let messages = handle.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.starts_with("Periodic broadcast [")));
    }

    #[tokio::test(start_paused = true)]
    async fn stays_quiet_with_no_clients() {
        let engine = engine();
        let signal = ShutdownSignal::new();
        let task = tokio::spawn(run_announcer(engine, signal.clone(), Duration::from_secs(1)));
        tokio::time::sleep(Duration::from_secs(5)).await;
        signal.trigger();

        let Ok(sent) = task.await else {
            panic!("announcer task panicked");
        };
        assert_eq!(sent, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_promptly_on_shutdown() {
        let signal = ShutdownSignal::new();
        let task = tokio::spawn(run_announcer(
            engine(),
            signal.clone(),
            Duration::from_secs(3600),
        ));
        tokio::task::yield_now().await;

        let started = Instant::now();
        signal.trigger();
        let Ok(_) = task.await else {
            panic!("announcer task panicked");
        };
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
