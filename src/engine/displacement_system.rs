use super::*;
use crate::constants::DISTURBANCE_SPREAD_DIVISOR;
use crate::terrain::TerrainKind;

/// Ripple state of one liquid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Disturbance {
    pub magnitude: u32,
    pub decay: u32,
}

impl<T: Terrain> SimEngine<T> {
    /// Starts or refreshes a ripple at `cell`. Only liquid cells can be disturbed.
    pub fn disturb(&mut self, cell: Vec2, magnitude: u32) -> bool {
        if magnitude == 0 || !self.terrain.in_bounds(cell.x, cell.y) {
            return false;
        }
        let Some(decay) = self.decay_for(self.terrain.terrain_at(cell.x, cell.y)) else {
            return false;
        };
        match self.disturbances.get_mut(&cell) {
            Some(existing) => {
                existing.magnitude = existing.magnitude.max(magnitude);
            }
            None => {
                self.disturbances.insert(cell, Disturbance { magnitude, decay });
                self.notify_disturbance(cell);
            }
        }
        true
    }

    pub fn disturbance_at(&self, cell: Vec2) -> Option<Disturbance> {
        self.disturbances.get(&cell).copied()
    }

    pub fn disturbed_cells(&self) -> usize {
        self.disturbances.len()
    }

    fn decay_for(&self, kind: TerrainKind) -> Option<u32> {
        let decay = match kind {
            TerrainKind::Water => self.config.displacement.water_decay,
            TerrainKind::Ocean => self.config.displacement.ocean_decay,
            _ => return None,
        };
        Some(decay.max(1))
    }

    /// Decays every ripple once. A surviving cell pushes a quarter of its
    /// strength into liquid neighbours that were not rippling at tick start.
    pub(super) fn run_displacement(&mut self) {
        let current: Vec<(Vec2, Disturbance)> = self
            .disturbances
            .iter()
            .map(|(cell, state)| (*cell, *state))
            .collect();
        let rippling: HashSet<Vec2> = current.iter().map(|(cell, _)| *cell).collect();
        for (cell, state) in current {
            let remaining = state.magnitude.saturating_sub(state.decay);
            if remaining == 0 {
                self.disturbances.remove(&cell);
                continue;
            }
            if let Some(entry) = self.disturbances.get_mut(&cell) {
                entry.magnitude = remaining;
            }
            let spread = state.magnitude / DISTURBANCE_SPREAD_DIVISOR;
            if spread == 0 {
                continue;
            }
            for dir in Direction::ALL {
                let neighbour = cell.step(dir);
                if rippling.contains(&neighbour) || self.disturbances.contains_key(&neighbour) {
                    continue;
                }
                self.disturb(neighbour, spread);
            }
        }
    }
}
