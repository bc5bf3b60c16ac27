use std::sync::{Arc, Mutex};

use crate::types::{ActorId, DeathCause, SimEvent, Vec2};

/// Notifications the core emits for score, sound and visual layers. Every
/// method defaults to a no-op. Implementations must return promptly because
/// they run inside the tick.
pub trait SimHooks {
    fn on_capture(&mut self, _predator: ActorId, _prey: ActorId) {}
    fn on_player_level_up(&mut self, _level: u8) {}
    fn on_player_death(&mut self, _cause: DeathCause) {}
    fn on_disturbance(&mut self, _cell: Vec2) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl SimHooks for NoopHooks {}

/// Records every notification as a [`SimEvent`]. Clones share one buffer, so a
/// caller can keep a handle while the engine owns another.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SimEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: SimEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    pub fn drain(&self) -> Vec<SimEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SimHooks for EventLog {
    fn on_capture(&mut self, predator: ActorId, prey: ActorId) {
        self.push(SimEvent::Captured { predator, prey });
    }

    fn on_player_level_up(&mut self, level: u8) {
        self.push(SimEvent::PlayerLevelUp { level });
    }

    fn on_player_death(&mut self, cause: DeathCause) {
        self.push(SimEvent::PlayerDied { cause });
    }

    fn on_disturbance(&mut self, cell: Vec2) {
        self.push(SimEvent::Disturbed {
            x: cell.x,
            y: cell.y,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{EventLog, NoopHooks, SimHooks};
    use crate::types::{ActorId, DeathCause, SimEvent, Vec2};

    #[test]
    fn noop_hooks_accept_every_call() {
        let mut hooks = NoopHooks;
        hooks.on_capture(ActorId(1), ActorId(2));
        hooks.on_player_level_up(2);
        hooks.on_player_death(DeathCause::Burned);
        hooks.on_disturbance(Vec2::new(0, 0));
    }

    #[test]
    fn event_log_clones_share_buffer() {
        let log = EventLog::new();
        let mut engine_side = log.clone();
        engine_side.on_capture(ActorId(1), ActorId(2));
        engine_side.on_player_level_up(3);
        assert_eq!(log.len(), 2);
        let drained = log.drain();
        assert_eq!(
            drained,
            vec![
                SimEvent::Captured {
                    predator: ActorId(1),
                    prey: ActorId(2)
                },
                SimEvent::PlayerLevelUp { level: 3 },
            ]
        );
        assert!(log.is_empty());
    }
}
