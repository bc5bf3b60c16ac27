use super::*;

const SPAWN_ATTEMPTS: usize = 24;

#[derive(Clone, Copy, Debug)]
pub struct ActorSpec {
    pub pos: Vec2,
    pub dominance: u8,
    pub kind: ActorKind,
    pub traits: Traits,
    pub awareness: Option<Awareness>,
    pub movement: Option<Movement>,
}

impl<T: Terrain> SimEngine<T> {
    pub fn spawn_actor(&mut self, spec: ActorSpec) -> SimResult<ActorId> {
        self.place(spec, false)
    }

    /// A creature with awareness and movement tuned from the population config.
    pub fn spawn_creature(&mut self, pos: Vec2, dominance: u8, kind: ActorKind) -> SimResult<ActorId> {
        let spec = self.creature_spec(pos, dominance, kind, Traits::default());
        self.spawn_actor(spec)
    }

    pub fn spawn_player(&mut self, pos: Vec2) -> SimResult<ActorId> {
        if let Some(existing) = self.player.filter(|_| self.player_alive()) {
            return Err(SimError::PlayerExists(existing));
        }
        let id = self.place(
            ActorSpec {
                pos,
                dominance: 1,
                kind: ActorKind::Predator,
                traits: Traits::default(),
                awareness: None,
                movement: Some(Movement::new(0)),
            },
            true,
        )?;
        self.player = Some(id);
        self.player_stats = PlayerStats::default();
        info!(player = %id, x = pos.x, y = pos.y, "player spawned");
        Ok(id)
    }

    pub fn seed_population(&mut self, count: usize) -> usize {
        let max_dominance = self.config.population.max_dominance.max(1);
        let mut placed = 0;
        for _ in 0..count {
            let Some(pos) = self.pick_spawn_cell() else {
                warn!(requested = count, placed, "no free cell left for spawning");
                break;
            };
            let dominance = self.rng.int(1, max_dominance as i32) as u8;
            let roll = self.rng.next_f32();
            let kind = if roll < 0.35 {
                ActorKind::Predator
            } else if roll < 0.85 {
                ActorKind::Herbivore
            } else {
                ActorKind::Scavenger
            };
            let traits = Traits {
                herding: kind == ActorKind::Herbivore && self.rng.bool(0.3),
                territorial: kind == ActorKind::Predator && self.rng.bool(0.3),
                hiding: self.rng.bool(0.25),
            };
            let spec = self.creature_spec(pos, dominance, kind, traits);
            match self.spawn_actor(spec) {
                Ok(_) => placed += 1,
                Err(err) => warn!(%err, "spawn rejected"),
            }
        }
        info!(placed, alive = self.alive_count(), "population seeded");
        placed
    }

    fn creature_spec(&self, pos: Vec2, dominance: u8, kind: ActorKind, traits: Traits) -> ActorSpec {
        let population = &self.config.population;
        ActorSpec {
            pos,
            dominance,
            kind,
            traits,
            awareness: Some(Awareness::new(
                population.awareness_range,
                population.accuracy,
                population.observe_cadence,
            )),
            movement: Some(Movement::new(crate::constants::movement_cadence_for(
                dominance,
                population.max_dominance,
            ))),
        }
    }

    fn pick_spawn_cell(&mut self) -> Option<Vec2> {
        let (width, height) = (self.terrain.width(), self.terrain.height());
        if width <= 0 || height <= 0 {
            return None;
        }
        for _ in 0..SPAWN_ATTEMPTS {
            let pos = Vec2::new(self.rng.int(0, width - 1), self.rng.int(0, height - 1));
            if self.is_spawnable(pos) {
                return Some(pos);
            }
        }
        // dense maps: fall back to a scan from a random row
        let start = self.rng.int(0, height - 1);
        (0..height)
            .map(|offset| (start + offset) % height)
            .flat_map(|y| (0..width).map(move |x| Vec2::new(x, y)))
            .find(|pos| self.is_spawnable(*pos))
    }

    fn is_spawnable(&self, pos: Vec2) -> bool {
        self.is_valid_position(pos) && !self.terrain.terrain_at(pos.x, pos.y).is_water()
    }

    fn place(&mut self, spec: ActorSpec, is_player: bool) -> SimResult<ActorId> {
        if !self.terrain.in_bounds(spec.pos.x, spec.pos.y) {
            return Err(SimError::OutOfBounds(spec.pos));
        }
        if !self.terrain.terrain_at(spec.pos.x, spec.pos.y).is_passable() {
            return Err(SimError::InvalidMap(format!(
                "cannot spawn on impassable cell ({}, {})",
                spec.pos.x, spec.pos.y
            )));
        }
        let id = ActorId(self.actors.len() as u32);
        self.spatial.add(id, spec.pos)?;
        self.actors.push(Actor {
            id,
            pos: spec.pos,
            dominance: spec.dominance,
            kind: spec.kind,
            alive: true,
            is_player,
            awareness: spec.awareness,
            movement: spec.movement,
            intent: Intent::None,
            stunned: 0,
            traits: spec.traits,
            path: PathBuffer::new(),
        });
        debug!(actor = %id, kind = ?spec.kind, dominance = spec.dominance, "actor spawned");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::open_engine;
    use crate::error::SimError;
    use crate::terrain::TerrainKind;
    use crate::types::{ActorId, ActorKind, Vec2};

    #[test]
    fn spawning_into_occupied_cell_fails() {
        let mut engine = open_engine(10, 10);
        let first = engine
            .spawn_creature(Vec2::new(3, 3), 2, ActorKind::Herbivore)
            .expect("free cell");
        let err = engine.spawn_creature(Vec2::new(3, 3), 2, ActorKind::Predator);
        assert!(matches!(
            err,
            Err(SimError::CellOccupied { occupant, .. }) if occupant == first
        ));
        assert_eq!(engine.actors().len(), 1);
    }

    #[test]
    fn spawning_on_ocean_or_outside_fails() {
        let mut engine = open_engine(10, 10);
        engine
            .terrain_mut()
            .set(Vec2::new(1, 1), TerrainKind::Ocean)
            .expect("in bounds");
        assert!(engine
            .spawn_creature(Vec2::new(1, 1), 1, ActorKind::Herbivore)
            .is_err());
        assert!(matches!(
            engine.spawn_creature(Vec2::new(10, 0), 1, ActorKind::Herbivore),
            Err(SimError::OutOfBounds(_))
        ));
    }

    #[test]
    fn creature_cadence_follows_dominance() {
        let mut engine = open_engine(10, 10);
        let max = engine.config.population.max_dominance;
        let strong = engine
            .spawn_creature(Vec2::new(1, 1), max, ActorKind::Predator)
            .expect("free cell");
        let weak = engine
            .spawn_creature(Vec2::new(2, 2), 1, ActorKind::Herbivore)
            .expect("free cell");
        let cadence = |id: ActorId| {
            engine
                .actor(id)
                .and_then(|a| a.movement)
                .map(|m| m.turns_to_skip)
        };
        assert_eq!(cadence(strong), Some(0));
        assert_eq!(cadence(weak), Some(max as u32 - 1));
    }

    #[test]
    fn seeding_fills_distinct_free_cells() {
        let mut engine = open_engine(6, 6);
        assert_eq!(engine.seed_population(20), 20);
        assert_eq!(engine.spatial().len(), 20);
        assert!(engine.check_invariants().is_empty());
        // only 16 cells remain
        assert_eq!(engine.seed_population(30), 16);
    }

    #[test]
    fn only_one_live_player() {
        let mut engine = open_engine(6, 6);
        engine.spawn_player(Vec2::new(0, 0)).expect("free cell");
        assert!(engine.spawn_player(Vec2::new(1, 1)).is_err());
    }
}
