use crate::constants::MAX_PATH_LENGTH;
use crate::types::Vec2;

/// Fixed-capacity route with a read cursor. Lives inline on every actor so that
/// replanning only overwrites slots and never allocates.
#[derive(Clone, Debug)]
pub struct PathBuffer {
    points: [Vec2; MAX_PATH_LENGTH],
    len: usize,
    offset: usize,
}

impl Default for PathBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PathBuffer {
    pub const CAPACITY: usize = MAX_PATH_LENGTH;

    pub fn new() -> Self {
        Self {
            points: [Vec2::default(); MAX_PATH_LENGTH],
            len: 0,
            offset: 0,
        }
    }

    pub fn reset(&mut self) {
        self.len = 0;
        self.offset = 0;
    }

    /// Appends a waypoint. Returns `false` and drops it when the buffer is full.
    pub fn push(&mut self, x: i32, y: i32) -> bool {
        let Some(slot) = self.points.get_mut(self.len) else {
            return false;
        };
        *slot = Vec2::new(x, y);
        self.len += 1;
        true
    }

    /// Waypoint under the cursor, `None` once the cursor has passed the last one.
    pub fn current(&self) -> Option<Vec2> {
        if self.offset >= self.len {
            return None;
        }
        self.points.get(self.offset).copied()
    }

    pub fn advance(&mut self) {
        self.offset = (self.offset + 1).min(self.len);
    }

    /// Remaining waypoints from the cursor to the end.
    pub fn len(&self) -> usize {
        self.len - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == Self::CAPACITY
    }

    pub fn remaining(&self) -> &[Vec2] {
        self.points.get(self.offset..self.len).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::PathBuffer;
    use crate::types::Vec2;

    #[test]
    fn push_and_advance_track_remaining_length() {
        let mut path = PathBuffer::new();
        assert_eq!(path.len(), 0);
        assert_eq!(path.current(), None);

        path.push(0, 0);
        path.push(0, 1);
        assert_eq!(path.len(), 2);
        assert_eq!(path.current(), Some(Vec2::new(0, 0)));

        path.advance();
        assert_eq!(path.current(), Some(Vec2::new(0, 1)));
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn length_is_pushes_minus_advances_floored_at_zero() {
        for pushes in 0..6usize {
            for advances in 0..9usize {
                let mut path = PathBuffer::new();
                for i in 0..pushes {
                    path.push(i as i32, 0);
                }
                for _ in 0..advances {
                    path.advance();
                }
                assert_eq!(path.len(), pushes.saturating_sub(advances));
            }
        }
    }

    #[test]
    fn exhausted_buffer_returns_sentinel() {
        let mut path = PathBuffer::new();
        path.push(3, 4);
        path.advance();
        path.advance();
        assert_eq!(path.current(), None);
        assert!(path.is_empty());
    }

    #[test]
    fn pushes_beyond_capacity_are_ignored() {
        let mut path = PathBuffer::new();
        for i in 0..PathBuffer::CAPACITY {
            assert!(path.push(i as i32, 0));
        }
        assert!(path.is_full());
        assert!(!path.push(99, 99));
        assert_eq!(path.len(), PathBuffer::CAPACITY);
        assert!(path.remaining().iter().all(|p| p.x != 99));
    }

    #[test]
    fn reset_clears_points_and_cursor() {
        let mut path = PathBuffer::new();
        path.push(1, 1);
        path.push(2, 2);
        path.advance();
        path.reset();
        assert_eq!(path.len(), 0);
        assert_eq!(path.current(), None);
        path.push(7, 7);
        assert_eq!(path.current(), Some(Vec2::new(7, 7)));
    }
}
