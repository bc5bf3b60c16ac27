use std::collections::BTreeSet;

use crate::types::Vec2;

const OCTANTS: [[i32; 4]; 8] = [
    [1, 0, 0, 1],
    [0, 1, 1, 0],
    [0, -1, 1, 0],
    [-1, 0, 0, 1],
    [-1, 0, 0, -1],
    [0, -1, -1, 0],
    [0, 1, -1, 0],
    [1, 0, 0, -1],
];

/// Recursive shadow casting. Returns every cell visible from `origin` within a
/// circular `radius`, origin included, in row-major order. Opaque cells are
/// themselves visible but hide what lies behind them.
pub fn compute_fov<F>(origin: Vec2, radius: u32, is_opaque: F) -> Vec<Vec2>
where
    F: Fn(Vec2) -> bool,
{
    let mut seen = BTreeSet::new();
    seen.insert((origin.y, origin.x));
    let radius = radius.min(i32::MAX as u32) as i32;
    if radius > 0 {
        for [xx, xy, yx, yy] in OCTANTS {
            let octant = Octant {
                origin,
                radius,
                xx,
                xy,
                yx,
                yy,
            };
            octant.cast(1, 1.0, 0.0, &is_opaque, &mut seen);
        }
    }
    seen.into_iter().map(|(y, x)| Vec2::new(x, y)).collect()
}

struct Octant {
    origin: Vec2,
    radius: i32,
    xx: i32,
    xy: i32,
    yx: i32,
    yy: i32,
}

impl Octant {
    fn cast<F>(&self, row: i32, start: f32, end: f32, is_opaque: &F, seen: &mut BTreeSet<(i32, i32)>)
    where
        F: Fn(Vec2) -> bool,
    {
        if start < end {
            return;
        }
        let radius2 = self.radius * self.radius;
        let mut start = start;
        let mut next_start = start;
        for depth in row..=self.radius {
            let dy = -depth;
            let mut blocked = false;
            for dx in -depth..=0 {
                let cell = Vec2::new(
                    self.origin.x + dx * self.xx + dy * self.xy,
                    self.origin.y + dx * self.yx + dy * self.yy,
                );
                let left_slope = (dx as f32 - 0.5) / (dy as f32 + 0.5);
                let right_slope = (dx as f32 + 0.5) / (dy as f32 - 0.5);
                if start < right_slope {
                    continue;
                }
                if end > left_slope {
                    break;
                }

                if dx * dx + dy * dy <= radius2 {
                    seen.insert((cell.y, cell.x));
                }

                let opaque = is_opaque(cell);
                if blocked {
                    if opaque {
                        next_start = right_slope;
                        continue;
                    }
                    blocked = false;
                    start = next_start;
                } else if opaque && depth < self.radius {
                    blocked = true;
                    self.cast(depth + 1, start, left_slope, is_opaque, seen);
                    next_start = right_slope;
                }
            }
            if blocked {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::compute_fov;
    use crate::types::Vec2;

    #[test]
    fn open_field_sees_full_disc() {
        let origin = Vec2::new(10, 10);
        let cells = compute_fov(origin, 3, |_| false);
        assert!(cells.contains(&origin));
        assert!(cells.contains(&Vec2::new(13, 10)));
        assert!(cells.contains(&Vec2::new(10, 7)));
        assert!(cells.contains(&Vec2::new(12, 12)));
        // corner of the bounding square lies outside the circle
        assert!(!cells.contains(&Vec2::new(13, 13)));
        assert!(cells.iter().all(|c| c.dist2(origin) <= 9));
    }

    #[test]
    fn wall_hides_cells_behind_it() {
        let origin = Vec2::new(0, 0);
        let wall = Vec2::new(2, 0);
        let cells = compute_fov(origin, 6, |c| c == wall);
        assert!(cells.contains(&wall));
        assert!(!cells.contains(&Vec2::new(4, 0)));
        assert!(cells.contains(&Vec2::new(0, 4)));
    }

    #[test]
    fn zero_radius_sees_only_origin() {
        let origin = Vec2::new(3, 3);
        assert_eq!(compute_fov(origin, 0, |_| false), vec![origin]);
    }

    #[test]
    fn no_duplicates_on_octant_borders() {
        let cells = compute_fov(Vec2::new(5, 5), 5, |_| false);
        let mut sorted = cells.clone();
        sorted.dedup();
        assert_eq!(sorted.len(), cells.len());
    }
}
