use super::*;
use crate::constants::proximity_multiplier;
use crate::fov::compute_fov;

#[derive(Clone, Copy, Debug)]
struct Observer {
    id: ActorId,
    pos: Vec2,
    dominance: u8,
    kind: ActorKind,
    traits: Traits,
    awareness: Awareness,
}

impl<T: Terrain> SimEngine<T> {
    pub(super) fn run_awareness(&mut self, ready: &[ActorId]) {
        for &id in ready {
            let Some(observer) = self.ready_observer(id) else {
                continue;
            };
            let intent = self.observe(&observer);
            if intent != observer_intent(&self.actors, id) {
                debug!(actor = %id, ?intent, tick = self.tick_counter, "intent changed");
            }
            self.set_intent(id, intent);
        }
    }

    /// Advances the observation counter and returns the actor when its turn has come.
    fn ready_observer(&mut self, id: ActorId) -> Option<Observer> {
        let actor = self.actors.get_mut(id.index())?;
        if !actor.alive || actor.is_player || actor.is_stunned() {
            return None;
        }
        let awareness = actor.awareness.as_mut()?;
        awareness.turns_since_observe += 1;
        if awareness.turns_since_observe <= awareness.cadence() {
            return None;
        }
        awareness.turns_since_observe = 0;
        Some(Observer {
            id,
            pos: actor.pos,
            dominance: actor.dominance,
            kind: actor.kind,
            traits: actor.traits,
            awareness: *awareness,
        })
    }

    fn observe(&mut self, observer: &Observer) -> Intent {
        let prey = if observer.kind == ActorKind::Predator {
            self.find_prey(observer)
        } else {
            None
        };
        let scores = self.survey(observer);
        let (bucket, score) = self.strongest_bucket(&scores);
        if let Some(prey) = prey {
            if self.config.behavior.prey_priority > score.abs() {
                return Intent::Pursue(prey);
            }
        }
        if score < 0 {
            Intent::Flee(bucket)
        } else {
            Intent::Flee(bucket.opposite())
        }
    }

    /// Walks candidates nearest first within twice the awareness range. A more
    /// dominant candidate replaces the current pick only while its dominance
    /// gain outweighs half its distance from that pick.
    fn find_prey(&mut self, observer: &Observer) -> Option<ActorId> {
        let reach = observer.awareness.range.saturating_mul(2);
        let mut best: Option<(ActorId, Vec2, u8)> = None;
        for other in self.spatial.nearest_within(observer.pos, reach) {
            if other == observer.id {
                continue;
            }
            let Some(candidate) = self.actors.get(other.index()) else {
                continue;
            };
            if !candidate.alive || candidate.dominance >= observer.dominance {
                continue;
            }
            let concealed = candidate.traits.hiding
                && self
                    .terrain
                    .terrain_at(candidate.pos.x, candidate.pos.y)
                    .conceals();
            let (pos, dominance) = (candidate.pos, candidate.dominance);
            let chance = if concealed {
                observer.awareness.accuracy / 2
            } else {
                observer.awareness.accuracy
            };
            if !self.rng.percent(chance) {
                continue;
            }
            match best {
                None => best = Some((other, pos, dominance)),
                Some((_, best_pos, best_dominance)) => {
                    let gain = (dominance as i32 - best_dominance as i32).max(0);
                    let score = gain - (pos.dist(best_pos) / 2.0).floor() as i32;
                    if score > 0 {
                        best = Some((other, pos, dominance));
                    } else {
                        break;
                    }
                }
            }
        }
        best.map(|(id, _, _)| id)
    }

    /// Scores the four quadrants around the observer from what it can see.
    /// Negative totals mark danger.
    fn survey(&self, observer: &Observer) -> [i32; 4] {
        let mut scores = [0i32; 4];
        let terrain = &self.terrain;
        let visible = compute_fov(observer.pos, observer.awareness.range, |cell| {
            !terrain.in_bounds(cell.x, cell.y) || terrain.terrain_at(cell.x, cell.y).blocks_sight()
        });
        for cell in visible {
            if cell == observer.pos {
                continue;
            }
            let bucket = Direction::toward(observer.pos, cell).index();
            if terrain.terrain_at(cell.x, cell.y).is_hazard() {
                scores[bucket] -= 1;
            }
            let Some(other_id) = self.spatial.at(cell) else {
                continue;
            };
            let Some(other) = self.actors.get(other_id.index()) else {
                continue;
            };
            if !other.alive || other_id == observer.id {
                continue;
            }
            let proximity = proximity_multiplier(observer.pos.dist(cell));
            if other.dominance > observer.dominance
                && (other.kind == ActorKind::Predator || other.is_player)
            {
                scores[bucket] -= (other.dominance - observer.dominance) as i32 * proximity;
            } else if other.dominance == observer.dominance {
                if observer.traits.territorial {
                    scores[bucket] -= proximity;
                } else if observer.traits.herding && observer.pos.dist8(cell) > 1 {
                    scores[bucket] += 1;
                }
            }
        }
        scores
    }

    /// Quadrant with the largest absolute score. Ties are broken at random.
    fn strongest_bucket(&mut self, scores: &[i32; 4]) -> (Direction, i32) {
        let peak = scores.iter().map(|score| score.abs()).max().unwrap_or(0);
        let tied: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|dir| scores[dir.index()].abs() == peak)
            .collect();
        let dir = self.rng.pick(&tied).unwrap_or(Direction::Up);
        (dir, scores[dir.index()])
    }
}

fn observer_intent(actors: &[Actor], id: ActorId) -> Intent {
    actors
        .get(id.index())
        .map(|actor| actor.intent)
        .unwrap_or_default()
}
