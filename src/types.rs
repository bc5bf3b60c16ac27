use serde::Serialize;

use crate::path::PathBuffer;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn dist2(self, other: Vec2) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    pub fn dist(self, other: Vec2) -> f32 {
        (self.dist2(other) as f32).sqrt()
    }

    /// Chebyshev distance, so diagonal neighbours count as adjacent.
    pub fn dist8(self, other: Vec2) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    pub fn perpendicular(self) -> [Direction; 2] {
        match self {
            Direction::Up | Direction::Down => [Direction::Left, Direction::Right],
            Direction::Left | Direction::Right => [Direction::Up, Direction::Down],
        }
    }

    /// Nearest compass direction from `from` to `to` on a y-down grid.
    /// Exact diagonals round clockwise (north-east is east, south-east is south).
    pub fn toward(from: Vec2, to: Vec2) -> Self {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let (ax, ay) = (dx.abs(), dy.abs());
        if ax > ay {
            return if dx > 0 { Direction::Right } else { Direction::Left };
        }
        if ay > ax {
            return if dy > 0 { Direction::Down } else { Direction::Up };
        }
        match (dx > 0, dy > 0) {
            _ if dx == 0 => Direction::Right,
            (true, false) => Direction::Right,
            (true, true) => Direction::Down,
            (false, true) => Direction::Left,
            (false, false) => Direction::Up,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: Vec2::new(min.x.min(max.x), min.y.min(max.y)),
            max: Vec2::new(min.x.max(max.x), min.y.max(max.y)),
        }
    }

    pub fn from_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(
            Vec2::new(x, y),
            Vec2::new(x + (width - 1).max(0), y + (height - 1).max(0)),
        )
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    pub fn expand(&self, margin: i32) -> Self {
        Self {
            min: Vec2::new(self.min.x - margin, self.min.y - margin),
            max: Vec2::new(self.max.x + margin, self.max.y + margin),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ActorId(pub u32);

impl ActorId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Predator,
    Herbivore,
    Scavenger,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Captured,
    Burned,
}

/// What an actor is currently doing. `Flee` stores the direction the threat lies in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Intent {
    #[default]
    None,
    Pursue(ActorId),
    Flee(Direction),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Traits {
    pub herding: bool,
    pub territorial: bool,
    pub hiding: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Awareness {
    #[serde(rename = "turnsSinceObserve")]
    pub turns_since_observe: u32,
    #[serde(rename = "turnsToSkip")]
    pub turns_to_skip: u32,
    #[serde(rename = "cadenceModifier")]
    pub cadence_modifier: u32,
    pub range: u32,
    pub accuracy: u32,
}

impl Awareness {
    pub fn new(range: u32, accuracy: u32, turns_to_skip: u32) -> Self {
        Self {
            turns_since_observe: 0,
            turns_to_skip,
            cadence_modifier: 0,
            range,
            accuracy: accuracy.min(100),
        }
    }

    pub fn cadence(&self) -> u32 {
        self.turns_to_skip.saturating_add(self.cadence_modifier)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Movement {
    #[serde(rename = "turnsSinceMove")]
    pub turns_since_move: u32,
    #[serde(rename = "turnsToSkip")]
    pub turns_to_skip: u32,
    pub facing: Direction,
}

impl Movement {
    pub fn new(turns_to_skip: u32) -> Self {
        Self {
            turns_since_move: 0,
            turns_to_skip,
            facing: Direction::Down,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Actor {
    pub id: ActorId,
    pub pos: Vec2,
    pub dominance: u8,
    pub kind: ActorKind,
    pub alive: bool,
    pub is_player: bool,
    pub awareness: Option<Awareness>,
    pub movement: Option<Movement>,
    pub intent: Intent,
    pub stunned: u32,
    pub traits: Traits,
    pub path: PathBuffer,
}

impl Actor {
    pub fn is_stunned(&self) -> bool {
        self.stunned > 0
    }

    pub fn strip(&mut self) {
        self.alive = false;
        self.awareness = None;
        self.movement = None;
        self.intent = Intent::None;
        self.stunned = 0;
        self.path.reset();
    }

    pub fn view(&self) -> ActorView {
        ActorView {
            id: self.id,
            x: self.pos.x,
            y: self.pos.y,
            dominance: self.dominance,
            kind: self.kind,
            alive: self.alive,
            player: self.is_player,
            intent: self.intent,
            stunned: self.stunned,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputMask(u8);

impl InputMask {
    fn bit(dir: Direction) -> u8 {
        1 << dir.index()
    }

    pub fn press(&mut self, dir: Direction) {
        self.0 |= Self::bit(dir);
    }

    pub fn release(&mut self, dir: Direction) {
        self.0 &= !Self::bit(dir);
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns the held direction with the highest priority (up, right, down, left) and clears the mask.
    pub fn take(&mut self) -> Option<Direction> {
        let picked = Direction::ALL
            .into_iter()
            .find(|dir| self.0 & Self::bit(*dir) != 0);
        self.0 = 0;
        picked
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ActorView {
    pub id: ActorId,
    pub x: i32,
    pub y: i32,
    pub dominance: u8,
    pub kind: ActorKind,
    pub alive: bool,
    pub player: bool,
    pub intent: Intent,
    pub stunned: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    Captured {
        predator: ActorId,
        prey: ActorId,
    },
    PlayerLevelUp {
        level: u8,
    },
    PlayerDied {
        cause: DeathCause,
    },
    ActorBurned {
        #[serde(rename = "actorId")]
        actor_id: ActorId,
    },
    Disturbed {
        x: i32,
        y: i32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub actors: Vec<ActorView>,
    #[serde(rename = "disturbedCells")]
    pub disturbed_cells: usize,
    #[serde(rename = "playerScore")]
    pub player_score: u32,
    pub events: Vec<SimEvent>,
}

#[cfg(test)]
mod tests {
    use super::{Direction, InputMask, Rect, Vec2};

    #[test]
    fn toward_matches_compass_quadrants() {
        let origin = Vec2::new(5, 5);
        assert_eq!(Direction::toward(origin, Vec2::new(5, 1)), Direction::Up);
        assert_eq!(Direction::toward(origin, Vec2::new(10, 5)), Direction::Right);
        assert_eq!(Direction::toward(origin, Vec2::new(5, 15)), Direction::Down);
        assert_eq!(Direction::toward(origin, Vec2::new(1, 5)), Direction::Left);
        // south-east, mostly east
        assert_eq!(Direction::toward(origin, Vec2::new(20, 15)), Direction::Right);
        // south-east, mostly south
        assert_eq!(Direction::toward(origin, Vec2::new(15, 20)), Direction::Down);
    }

    #[test]
    fn exact_diagonals_round_clockwise() {
        let origin = Vec2::new(0, 0);
        assert_eq!(Direction::toward(origin, Vec2::new(1, -1)), Direction::Right);
        assert_eq!(Direction::toward(origin, Vec2::new(1, 1)), Direction::Down);
        assert_eq!(Direction::toward(origin, Vec2::new(-1, 1)), Direction::Left);
        assert_eq!(Direction::toward(origin, Vec2::new(-1, -1)), Direction::Up);
    }

    #[test]
    fn opposite_and_perpendicular_are_consistent() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            for side in dir.perpendicular() {
                assert_ne!(side, dir);
                assert_ne!(side, dir.opposite());
            }
        }
    }

    #[test]
    fn rect_contains_both_corners() {
        let rect = Rect::from_size(0, 0, 10, 1);
        assert!(rect.contains(Vec2::new(0, 0)));
        assert!(rect.contains(Vec2::new(9, 0)));
        assert!(!rect.contains(Vec2::new(10, 0)));
        assert!(rect.expand(1).contains(Vec2::new(10, 1)));
    }

    #[test]
    fn input_mask_is_cleared_after_sampling() {
        let mut mask = InputMask::default();
        mask.press(Direction::Left);
        mask.press(Direction::Down);
        assert_eq!(mask.take(), Some(Direction::Down));
        assert!(mask.is_empty());
        assert_eq!(mask.take(), None);
    }
}
