//! Fixed-rate driver for the engine. The tick loop sleeps on a tokio interval,
//! honours pause and stop requests, and picks up tick-rate changes between ticks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tracing::{debug, info};

use crate::engine::SimEngine;
use crate::terrain::Terrain;

const MIN_TICK_MS: u64 = 1;

/// Shared run-state switches. All methods take `&self` so one instance can be
/// held by the loop and by whoever controls it.
#[derive(Debug)]
pub struct TickControl {
    paused: AtomicBool,
    stop_requested: AtomicBool,
    tick_ms: AtomicU64,
    wake: Notify,
}

impl TickControl {
    pub fn new(tick_ms: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            tick_ms: AtomicU64::new(tick_ms.max(MIN_TICK_MS)),
            wake: Notify::new(),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.wake.notify_one();
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    pub fn tick_ms(&self) -> u64 {
        self.tick_ms.load(Ordering::Acquire)
    }

    /// Returns the previous interval.
    pub fn set_tick_ms(&self, ms: u64) -> u64 {
        self.tick_ms.swap(ms.max(MIN_TICK_MS), Ordering::AcqRel)
    }

    /// Returns immediately unless paused. A stop request also releases the wait.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.wake.notified().await;
        }
    }
}

/// Steps `engine` once per interval until `max_ticks` have run or a stop is
/// requested. `after_tick` sees the engine while the lock from that tick is
/// still held. Returns how many ticks this call executed.
pub async fn run<T, F>(
    engine: &Mutex<SimEngine<T>>,
    control: &TickControl,
    max_ticks: Option<u64>,
    mut after_tick: F,
) -> u64
where
    T: Terrain,
    F: FnMut(&mut SimEngine<T>),
{
    let mut period = control.tick_ms();
    let mut interval = tokio::time::interval(Duration::from_millis(period));
    let mut executed = 0u64;
    info!(tick_ms = period, ?max_ticks, "tick loop started");

    loop {
        if max_ticks.is_some_and(|limit| executed >= limit) || control.is_stop_requested() {
            break;
        }
        control.wait_if_paused().await;
        if control.is_stop_requested() {
            break;
        }

        let wanted = control.tick_ms();
        if wanted != period {
            debug!(from = period, to = wanted, "tick interval changed");
            period = wanted;
            interval = tokio::time::interval(Duration::from_millis(period));
        }
        interval.tick().await;

        let mut guard = engine.lock().await;
        guard.step();
        after_tick(&mut *guard);
        executed += 1;
    }

    info!(executed, "tick loop stopped");
    executed
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Mutex;

    use super::{run, TickControl};
    use crate::config::SimConfig;
    use crate::engine::SimEngine;
    use crate::terrain::{TerrainGrid, TerrainKind};

    fn engine() -> SimEngine {
        SimEngine::new(
            SimConfig::default(),
            TerrainGrid::filled(16, 16, TerrainKind::Ground),
            9,
        )
    }

    #[tokio::test]
    async fn runs_requested_number_of_ticks() {
        let engine = Mutex::new(engine());
        let control = TickControl::new(1);
        let executed = run(&engine, &control, Some(5), |_| {}).await;
        assert_eq!(executed, 5);
        assert_eq!(engine.lock().await.tick(), 5);
    }

    #[tokio::test]
    async fn paused_loop_waits_for_resume() {
        let engine = Arc::new(Mutex::new(engine()));
        let control = Arc::new(TickControl::new(1));
        control.pause();

        let task = {
            let engine = Arc::clone(&engine);
            let control = Arc::clone(&control);
            tokio::spawn(async move { run(&engine, &control, Some(3), |_| {}).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(engine.lock().await.tick(), 0);

        control.resume();
        let executed = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("loop finished")
            .expect("task joined");
        assert_eq!(executed, 3);
    }

    #[tokio::test]
    async fn stop_request_ends_unbounded_loop() {
        let engine = Arc::new(Mutex::new(engine()));
        let control = Arc::new(TickControl::new(1));
        let task = {
            let engine = Arc::clone(&engine);
            let control = Arc::clone(&control);
            tokio::spawn(async move { run(&engine, &control, None, |_| {}).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        control.request_stop();
        let executed = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("loop finished")
            .expect("task joined");
        assert!(executed > 0);
    }

    #[test]
    fn tick_rate_is_clamped() {
        let control = TickControl::new(0);
        assert_eq!(control.tick_ms(), 1);
        assert_eq!(control.set_tick_ms(50), 1);
        assert_eq!(control.tick_ms(), 50);
    }
}
