use super::*;
use crate::pathfind::astar;

impl<T: Terrain> SimEngine<T> {
    /// Creatures move first, then the player.
    pub(super) fn run_movement(&mut self, ready: &[ActorId]) {
        for &id in ready {
            if Some(id) == self.player || !self.movement_turn(id) {
                continue;
            }
            let Some(intent) = self.actor(id).map(|actor| actor.intent) else {
                continue;
            };
            match intent {
                Intent::Pursue(target) => self.pursue(id, target),
                Intent::Flee(threat) => self.flee(id, threat),
                Intent::None => {}
            }
        }

        if let Some(player) = self.player {
            if ready.contains(&player) && self.movement_turn(player) {
                self.move_player(player);
            }
        }
    }

    /// Advances the movement counter and reports whether the actor may move this tick.
    fn movement_turn(&mut self, id: ActorId) -> bool {
        let Some(actor) = self.actors.get_mut(id.index()) else {
            return false;
        };
        if !actor.alive || actor.is_stunned() {
            return false;
        }
        let Some(movement) = actor.movement.as_mut() else {
            return false;
        };
        movement.turns_since_move += 1;
        if movement.turns_since_move <= movement.turns_to_skip {
            return false;
        }
        movement.turns_since_move = 0;
        true
    }

    fn pursue(&mut self, id: ActorId, target: ActorId) {
        let target_alive = self.actor(target).map(|t| t.alive).unwrap_or(false);
        let (Some(pos), Some(target_pos)) = (
            self.spatial.position_of(id),
            self.spatial.position_of(target),
        ) else {
            self.set_intent(id, Intent::None);
            return;
        };
        if !target_alive {
            self.set_intent(id, Intent::None);
            return;
        }

        let threshold = self.config.behavior.path_replan_threshold;
        let needs_route = self
            .actor(id)
            .map(|actor| actor.path.len() < threshold)
            .unwrap_or(false);
        if needs_route && !self.plan_route(id, pos, target_pos) {
            debug!(actor = %id, target = %target, "no route to target");
            self.set_intent(id, Intent::None);
            return;
        }

        let Some(waypoint) = self.actor(id).and_then(|actor| actor.path.current()) else {
            self.set_intent(id, Intent::None);
            return;
        };
        let dir = Direction::toward(pos, waypoint);
        for dir in [Some(dir), other_axis(pos, waypoint, dir)].into_iter().flatten() {
            let next = pos.step(dir);
            if self.spatial.at(next) == Some(target) {
                self.capture(id, target);
                return;
            }
            if !self.is_valid_position(next) {
                continue;
            }
            if self.relocate(id, next, dir) && next == waypoint {
                if let Some(actor) = self.actor_mut(id) {
                    actor.path.advance();
                }
            }
            return;
        }

        // occupants move on, terrain does not
        let ahead = pos.step(dir);
        if !self.is_walkable(ahead) {
            debug!(actor = %id, x = ahead.x, y = ahead.y, "route blocked by terrain, replanning");
            if let Some(actor) = self.actor_mut(id) {
                actor.path.reset();
            }
        }
    }

    fn is_walkable(&self, cell: Vec2) -> bool {
        self.terrain.in_bounds(cell.x, cell.y) && self.terrain.terrain_at(cell.x, cell.y).is_passable()
    }

    /// Fills the actor's path with an A* route and skips the cell it stands on.
    fn plan_route(&mut self, id: ActorId, from: Vec2, to: Vec2) -> bool {
        let route = astar(from, to, ASTAR_MAX_EXPANSIONS, |cell| self.is_walkable(cell));
        let Some(actor) = self.actors.get_mut(id.index()) else {
            return false;
        };
        actor.path.reset();
        let Some(route) = route else {
            return false;
        };
        for cell in route {
            if !actor.path.push(cell.x, cell.y) {
                break;
            }
        }
        actor.path.advance();
        !actor.path.is_empty()
    }

    /// The predator kills its target, gets stunned in proportion to the prey's
    /// dominance and goes idle.
    pub(super) fn capture(&mut self, predator: ActorId, prey: ActorId) {
        let Some((prey_dominance, prey_was_player)) = self.kill(prey) else {
            return;
        };
        let stun = prey_dominance as u32 * self.config.behavior.stun_per_dominance;
        self.set_intent(predator, Intent::None);
        if let Some(actor) = self.actor_mut(predator) {
            actor.stunned = stun;
        }
        info!(%predator, %prey, stun, tick = self.tick_counter, "prey captured");
        self.notify_capture(predator, prey);
        if prey_was_player {
            self.notify_player_death(DeathCause::Captured);
        }
    }

    /// Steps away from the threat. When that cell is unusable, tries one side at random.
    fn flee(&mut self, id: ActorId, threat: Direction) {
        let Some(pos) = self.spatial.position_of(id) else {
            return;
        };
        let escape = threat.opposite();
        if self.try_step(id, pos, escape) {
            return;
        }
        let [left, right] = escape.perpendicular();
        let side = if self.rng.bool(0.5) { left } else { right };
        self.try_step(id, pos, side);
    }

    fn try_step(&mut self, id: ActorId, pos: Vec2, dir: Direction) -> bool {
        let next = pos.step(dir);
        self.is_valid_position(next) && self.relocate(id, next, dir)
    }

    fn move_player(&mut self, id: ActorId) {
        let Some(dir) = self.player_input.take() else {
            return;
        };
        let Some(pos) = self.spatial.position_of(id) else {
            return;
        };
        if let Some(movement) = self.actor_mut(id).and_then(|actor| actor.movement.as_mut()) {
            movement.facing = dir;
        }
        let next = pos.step(dir);
        if let Some(other) = self.spatial.at(next) {
            let player_dominance = self.actor(id).map(|p| p.dominance).unwrap_or(0);
            let other_dominance = self.actor(other).map(|o| o.dominance).unwrap_or(u8::MAX);
            if other_dominance > player_dominance {
                return;
            }
            self.consume(id, other);
        }
        if self.is_valid_position(next) {
            self.relocate(id, next, dir);
        }
    }

    fn consume(&mut self, player: ActorId, prey: ActorId) {
        let Some((dominance, _)) = self.kill(prey) else {
            return;
        };
        self.player_stats.score += dominance as u32;
        self.player_stats.experience += dominance as u32;
        info!(%prey, score = self.player_stats.score, "player consumed actor");
        self.notify_capture(player, prey);

        let factor = self.config.behavior.level_up_factor.max(1);
        loop {
            let Some(level) = self.actor(player).map(|p| p.dominance) else {
                return;
            };
            let needed = level as u32 * factor;
            if self.player_stats.experience < needed || level == u8::MAX {
                return;
            }
            self.player_stats.experience -= needed;
            if let Some(actor) = self.actor_mut(player) {
                actor.dominance = level + 1;
            }
            self.notify_level_up(level + 1);
        }
    }

    /// Moves an actor on the index and in its record, then applies terrain effects:
    /// water slows movement and liquid cells ripple.
    fn relocate(&mut self, id: ActorId, to: Vec2, dir: Direction) -> bool {
        let Some(from) = self.spatial.position_of(id) else {
            return false;
        };
        if let Err(err) = self.spatial.move_actor(id, to) {
            warn!(actor = %id, %err, "move rejected by spatial index");
            return false;
        }
        let was_water = self.terrain.terrain_at(from.x, from.y).is_water();
        let destination = self.terrain.terrain_at(to.x, to.y);
        let delta = self.config.behavior.water_cadence_delta;
        if let Some(actor) = self.actors.get_mut(id.index()) {
            actor.pos = to;
            if let Some(movement) = actor.movement.as_mut() {
                movement.facing = dir;
                if destination.is_water() && !was_water {
                    movement.turns_to_skip = movement.turns_to_skip.saturating_add(delta);
                } else if was_water && !destination.is_water() {
                    movement.turns_to_skip = movement.turns_to_skip.saturating_sub(delta);
                }
            }
        }
        if destination.is_liquid() {
            self.disturb(to, self.config.displacement.move_magnitude);
        }
        true
    }
}

/// For a diagonal waypoint, the orthogonal step along the axis `taken` skipped.
/// Either step ends next to the waypoint.
fn other_axis(from: Vec2, to: Vec2, taken: Direction) -> Option<Direction> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    if dx == 0 || dy == 0 {
        return None;
    }
    let alternative = match taken {
        Direction::Left | Direction::Right if dy > 0 => Direction::Down,
        Direction::Left | Direction::Right => Direction::Up,
        Direction::Up | Direction::Down if dx > 0 => Direction::Right,
        Direction::Up | Direction::Down => Direction::Left,
    };
    Some(alternative)
}
