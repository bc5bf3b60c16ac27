use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::types::Vec2;

const NEIGHBORS_8: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

fn chebyshev(a: Vec2, b: Vec2) -> i32 {
    a.dist8(b)
}

/// 8-directional A* with unit step cost. The returned route starts at `start`
/// and ends at `goal`. The goal cell is accepted even when `passable` rejects
/// it, since it is usually occupied by whatever is being chased.
/// Gives up after `max_expansions` nodes. A diagonal step needs at least one
/// open orthogonal neighbour, so every route can also be walked one axis at a time.
pub fn astar<F>(start: Vec2, goal: Vec2, max_expansions: usize, passable: F) -> Option<Vec<Vec2>>
where
    F: Fn(Vec2) -> bool,
{
    if start == goal {
        return Some(vec![start]);
    }

    // (f, h, insertion order): equal candidates pop first-in, which keeps
    // axis-aligned routes straight
    let mut open = BinaryHeap::<(Reverse<i32>, Reverse<i32>, Reverse<u32>, Vec2)>::new();
    let mut pushed = 0u32;
    let mut g_scores = HashMap::<Vec2, i32>::new();
    let mut came_from = HashMap::<Vec2, Vec2>::new();

    g_scores.insert(start, 0);
    let h = chebyshev(start, goal);
    open.push((Reverse(h), Reverse(h), Reverse(pushed), start));

    let mut expanded = 0usize;
    while let Some((_, _, _, cell)) = open.pop() {
        if cell == goal {
            return Some(reconstruct(start, goal, &came_from));
        }
        expanded += 1;
        if expanded > max_expansions {
            return None;
        }
        let g = g_scores.get(&cell).copied().unwrap_or(i32::MAX);

        for (dx, dy) in NEIGHBORS_8 {
            let next = Vec2::new(cell.x + dx, cell.y + dy);
            if next != goal && !passable(next) {
                continue;
            }
            if dx != 0
                && dy != 0
                && !passable(Vec2::new(cell.x + dx, cell.y))
                && !passable(Vec2::new(cell.x, cell.y + dy))
            {
                continue;
            }
            let tentative = g.saturating_add(1);
            if tentative >= g_scores.get(&next).copied().unwrap_or(i32::MAX) {
                continue;
            }
            g_scores.insert(next, tentative);
            came_from.insert(next, cell);
            let h = chebyshev(next, goal);
            pushed += 1;
            open.push((Reverse(tentative + h), Reverse(h), Reverse(pushed), next));
        }
    }
    None
}

fn reconstruct(start: Vec2, goal: Vec2, came_from: &HashMap<Vec2, Vec2>) -> Vec<Vec2> {
    let mut out = vec![goal];
    let mut cursor = goal;
    while cursor != start {
        let Some(prev) = came_from.get(&cursor).copied() else {
            break;
        };
        out.push(prev);
        cursor = prev;
    }
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::astar;
    use crate::types::Vec2;

    #[test]
    fn straight_line_on_open_ground() {
        let path = astar(Vec2::new(0, 0), Vec2::new(5, 0), 1_000, |_| true).expect("reachable");
        assert_eq!(path.first(), Some(&Vec2::new(0, 0)));
        assert_eq!(path.last(), Some(&Vec2::new(5, 0)));
        assert_eq!(path.len(), 6);
    }

    #[test]
    fn diagonal_moves_shorten_routes() {
        let path = astar(Vec2::new(0, 0), Vec2::new(4, 4), 1_000, |_| true).expect("reachable");
        assert_eq!(path.len(), 5);
        for pair in path.windows(2) {
            assert_eq!(pair[0].dist8(pair[1]), 1);
        }
    }

    #[test]
    fn routes_around_walls() {
        // wall at x == 2 spanning y in -5..5, open from y == 5 down
        let wall = |p: Vec2| p.x == 2 && (-5..5).contains(&p.y);
        let inside = |p: Vec2| p.x.abs() <= 10 && p.y.abs() <= 10;
        let path = astar(Vec2::new(0, 0), Vec2::new(4, 0), 10_000, |p| inside(p) && !wall(p))
            .expect("gap is reachable");
        assert!(path.iter().all(|p| !wall(*p)));
        assert!(path.iter().any(|p| p.x == 2 && p.y == 5));
    }

    #[test]
    fn axis_aligned_routes_stay_on_the_axis() {
        let path = astar(Vec2::new(2, 2), Vec2::new(12, 2), 1_000, |_| true).expect("reachable");
        assert!(path.iter().all(|p| p.y == 2));
    }

    #[test]
    fn never_squeezes_between_touching_corners() {
        let blocked = |p: Vec2| p == Vec2::new(1, 0) || p == Vec2::new(0, 1);
        let inside = |p: Vec2| p.x.abs() <= 3 && p.y.abs() <= 3;
        let path = astar(Vec2::new(0, 0), Vec2::new(1, 1), 1_000, |p| inside(p) && !blocked(p))
            .expect("reachable around the corner");
        assert!(path.len() > 2);
        assert!(path.iter().all(|p| !blocked(*p)));
    }

    #[test]
    fn unreachable_goal_returns_none() {
        let boxed = |p: Vec2| p.x.abs() <= 1 && p.y.abs() <= 1;
        assert!(astar(Vec2::new(0, 0), Vec2::new(5, 5), 1_000, boxed).is_none());
    }

    #[test]
    fn goal_cell_is_accepted_even_if_blocked() {
        let goal = Vec2::new(3, 0);
        let path = astar(Vec2::new(0, 0), goal, 1_000, |p| p != goal).expect("goal accepted");
        assert_eq!(path.last(), Some(&goal));
    }
}
