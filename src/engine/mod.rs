use std::collections::{BTreeMap, HashSet};

use tracing::{debug, error, info, warn};

use crate::config::SimConfig;
use crate::constants::ASTAR_MAX_EXPANSIONS;
use crate::error::{SimError, SimResult};
use crate::hooks::{NoopHooks, SimHooks};
use crate::path::PathBuffer;
use crate::rng::Rng;
use crate::spatial::SpatialIndex;
use crate::terrain::{FullViewport, Terrain, TerrainGrid, Viewport};
use crate::types::{
    Actor, ActorId, ActorKind, Awareness, DeathCause, Direction, InputMask, Intent, Movement,
    SimEvent, Snapshot, Traits, Vec2,
};

mod awareness_system;
mod displacement_system;
mod movement_system;
mod spawn_system;

pub use self::displacement_system::Disturbance;
pub use self::spawn_system::ActorSpec;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerStats {
    pub score: u32,
    pub experience: u32,
}

pub struct SimEngine<T: Terrain = TerrainGrid> {
    pub config: SimConfig,
    terrain: T,
    viewport: Box<dyn Viewport + Send>,
    hooks: Box<dyn SimHooks + Send>,
    rng: Rng,
    actors: Vec<Actor>,
    spatial: SpatialIndex,
    disturbances: BTreeMap<Vec2, Disturbance>,
    player: Option<ActorId>,
    player_input: InputMask,
    player_stats: PlayerStats,
    events: Vec<SimEvent>,
    tick_counter: u64,
}

impl<T: Terrain> SimEngine<T> {
    pub fn new(config: SimConfig, terrain: T, seed: u32) -> Self {
        let viewport = FullViewport {
            width: terrain.width(),
            height: terrain.height(),
        };
        let spatial = SpatialIndex::new(terrain.width(), terrain.height());
        Self {
            config,
            terrain,
            viewport: Box::new(viewport),
            hooks: Box::new(NoopHooks),
            rng: Rng::new(seed),
            actors: Vec::new(),
            spatial,
            disturbances: BTreeMap::new(),
            player: None,
            player_input: InputMask::default(),
            player_stats: PlayerStats::default(),
            events: Vec::new(),
            tick_counter: 0,
        }
    }

    pub fn with_viewport(mut self, viewport: impl Viewport + Send + 'static) -> Self {
        self.viewport = Box::new(viewport);
        self
    }

    pub fn with_hooks(mut self, hooks: impl SimHooks + Send + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn terrain(&self) -> &T {
        &self.terrain
    }

    pub fn terrain_mut(&mut self) -> &mut T {
        &mut self.terrain
    }

    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.index())
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id.index())
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn alive_count(&self) -> usize {
        self.actors.iter().filter(|actor| actor.alive).count()
    }

    pub fn player(&self) -> Option<ActorId> {
        self.player
    }

    pub fn player_alive(&self) -> bool {
        self.player
            .and_then(|id| self.actor(id))
            .map(|actor| actor.alive)
            .unwrap_or(false)
    }

    pub fn player_stats(&self) -> PlayerStats {
        self.player_stats
    }

    pub fn press(&mut self, dir: Direction) {
        self.player_input.press(dir);
    }

    pub fn release(&mut self, dir: Direction) {
        self.player_input.release(dir);
    }

    pub fn step(&mut self) {
        self.tick_counter += 1;
        let active = self.active_actors();
        let ready = self.tick_stuns(&active);
        self.run_awareness(&ready);
        self.run_movement(&ready);
        self.resolve_hazards();
        self.run_displacement();
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            actors: self.actors.iter().map(Actor::view).collect(),
            disturbed_cells: self.disturbances.len(),
            player_score: self.player_stats.score,
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    fn active_actors(&self) -> Vec<ActorId> {
        let area = self
            .viewport
            .current_viewport()
            .expand(self.config.tick.viewport_margin);
        let mut active = self.spatial.within(area);
        if let Some(player) = self.player {
            if self.spatial.contains(player) && !active.contains(&player) {
                active.push(player);
            }
        }
        active
    }

    /// Counts stuns down and returns the actors that were not stunned at the start of the tick.
    fn tick_stuns(&mut self, active: &[ActorId]) -> Vec<ActorId> {
        let mut ready = Vec::with_capacity(active.len());
        for &id in active {
            let Some(actor) = self.actors.get_mut(id.index()) else {
                continue;
            };
            if !actor.alive {
                continue;
            }
            if actor.stunned > 0 {
                actor.stunned -= 1;
                continue;
            }
            ready.push(id);
        }
        ready
    }

    /// Replaces an actor's intent. Entering or leaving flight adjusts the
    /// observation cadence immediately, even mid-cooldown.
    pub(crate) fn set_intent(&mut self, id: ActorId, intent: Intent) {
        let penalty = self.config.behavior.flee_reaction_penalty;
        let Some(actor) = self.actors.get_mut(id.index()) else {
            return;
        };
        if actor.intent == intent {
            return;
        }
        let was_fleeing = matches!(actor.intent, Intent::Flee(_));
        let now_fleeing = matches!(intent, Intent::Flee(_));
        if let Some(awareness) = actor.awareness.as_mut() {
            if now_fleeing && !was_fleeing {
                awareness.cadence_modifier = awareness.cadence_modifier.saturating_add(penalty);
            } else if was_fleeing && !now_fleeing {
                awareness.cadence_modifier = awareness.cadence_modifier.saturating_sub(penalty);
            }
        }
        actor.path.reset();
        actor.intent = intent;
    }

    fn is_valid_position(&self, pos: Vec2) -> bool {
        self.terrain.in_bounds(pos.x, pos.y)
            && self.terrain.terrain_at(pos.x, pos.y).is_passable()
            && self.spatial.at(pos).is_none()
    }

    /// Removes an actor from play without emitting capture or death events.
    pub fn remove_actor(&mut self, id: ActorId) -> SimResult<()> {
        if id.index() >= self.actors.len() {
            return Err(SimError::UnknownActor(id));
        }
        if self.kill(id).is_some() {
            debug!(actor = %id, "actor removed");
        }
        Ok(())
    }

    fn kill(&mut self, id: ActorId) -> Option<(u8, bool)> {
        let actor = self.actors.get_mut(id.index())?;
        if !actor.alive {
            return None;
        }
        let dominance = actor.dominance;
        let was_player = actor.is_player;
        actor.strip();
        self.spatial.remove(id);
        Some((dominance, was_player))
    }

    fn resolve_hazards(&mut self) {
        let burning: Vec<ActorId> = self
            .actors
            .iter()
            .filter(|actor| actor.alive)
            .filter(|actor| {
                self.terrain
                    .terrain_at(actor.pos.x, actor.pos.y)
                    .is_hazard()
            })
            .map(|actor| actor.id)
            .collect();
        for id in burning {
            let Some((_, was_player)) = self.kill(id) else {
                continue;
            };
            info!(actor = %id, "actor burned");
            self.events.push(SimEvent::ActorBurned { actor_id: id });
            if was_player {
                self.notify_player_death(DeathCause::Burned);
            }
        }
    }

    fn notify_capture(&mut self, predator: ActorId, prey: ActorId) {
        self.events.push(SimEvent::Captured { predator, prey });
        self.hooks.on_capture(predator, prey);
    }

    fn notify_player_death(&mut self, cause: DeathCause) {
        info!(?cause, tick = self.tick_counter, "player died");
        self.events.push(SimEvent::PlayerDied { cause });
        self.hooks.on_player_death(cause);
    }

    fn notify_level_up(&mut self, level: u8) {
        info!(level, "player levelled up");
        self.events.push(SimEvent::PlayerLevelUp { level });
        self.hooks.on_player_level_up(level);
    }

    fn notify_disturbance(&mut self, cell: Vec2) {
        self.events.push(SimEvent::Disturbed {
            x: cell.x,
            y: cell.y,
        });
        self.hooks.on_disturbance(cell);
    }

    /// Cross-checks actor records against the spatial index. Each violation is
    /// logged and returned. An empty result means the world is consistent.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen_cells = HashSet::new();
        for actor in &self.actors {
            if actor.alive {
                match self.spatial.position_of(actor.id) {
                    Some(pos) if pos != actor.pos => problems.push(format!(
                        "actor {} indexed at ({}, {}) but stands at ({}, {})",
                        actor.id, pos.x, pos.y, actor.pos.x, actor.pos.y
                    )),
                    None => problems.push(format!("live actor {} missing from index", actor.id)),
                    _ => {}
                }
                if !seen_cells.insert(actor.pos) {
                    problems.push(format!(
                        "two live actors share ({}, {})",
                        actor.pos.x, actor.pos.y
                    ));
                }
                if actor.intent == Intent::Pursue(actor.id) {
                    problems.push(format!("actor {} pursues itself", actor.id));
                }
            } else {
                if self.spatial.contains(actor.id) {
                    problems.push(format!("dead actor {} still indexed", actor.id));
                }
                if actor.intent != Intent::None {
                    problems.push(format!("dead actor {} still holds {:?}", actor.id, actor.intent));
                }
            }
        }
        for problem in &problems {
            error!(tick = self.tick_counter, %problem, "invariant violated");
        }
        problems
    }
}
