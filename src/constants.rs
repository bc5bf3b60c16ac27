pub const TICK_RATE: u32 = 10;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const MAX_PATH_LENGTH: usize = 32;
pub const PATH_REPLAN_THRESHOLD: usize = 5;
pub const ASTAR_MAX_EXPANSIONS: usize = 4_096;

pub const SPATIAL_BUCKET_SIZE: i32 = 16;
pub const VIEWPORT_MARGIN: i32 = 4;

pub const PREY_PRIORITY: i32 = 6;
pub const STUN_PER_DOMINANCE: u32 = 5;
pub const FLEE_REACTION_PENALTY: u32 = 5;
pub const WATER_CADENCE_DELTA: u32 = 2;
pub const LEVEL_UP_FACTOR: u32 = 5;

pub const NEAR_THREAT_RADIUS: f32 = 5.0;
pub const MID_THREAT_RADIUS: f32 = 7.0;

pub const MOVE_DISTURBANCE: u32 = 100;
pub const WATER_DECAY: u32 = 15;
pub const OCEAN_DECAY: u32 = 25;
pub const DISTURBANCE_SPREAD_DIVISOR: u32 = 4;

pub const MAX_DOMINANCE: u8 = 5;
pub const DEFAULT_AWARENESS_RANGE: u32 = 10;
pub const DEFAULT_ACCURACY: u32 = 80;
pub const DEFAULT_OBSERVE_CADENCE: u32 = 1;
pub const DEFAULT_POPULATION: usize = 40;

/// Threat weighting by distance: closer threats count for more.
pub fn proximity_multiplier(distance: f32) -> i32 {
    if distance <= NEAR_THREAT_RADIUS {
        return 3;
    }
    if distance <= MID_THREAT_RADIUS {
        return 2;
    }
    1
}

pub fn movement_cadence_for(dominance: u8, max_dominance: u8) -> u32 {
    max_dominance.saturating_sub(dominance) as u32
}
