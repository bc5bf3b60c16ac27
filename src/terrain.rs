use serde::Serialize;

use crate::error::{SimError, SimResult};
use crate::types::{Rect, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    Ocean,
    Lava,
    Water,
    Brush,
    Ground,
}

impl TerrainKind {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '#' => Some(Self::Ocean),
            '^' => Some(Self::Lava),
            '~' => Some(Self::Water),
            '"' => Some(Self::Brush),
            '.' => Some(Self::Ground),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Self::Ocean => '#',
            Self::Lava => '^',
            Self::Water => '~',
            Self::Brush => '"',
            Self::Ground => '.',
        }
    }

    /// Terrain a creature may stand on or route through.
    pub fn is_passable(self) -> bool {
        !matches!(self, Self::Ocean | Self::Lava)
    }

    pub fn is_hazard(self) -> bool {
        matches!(self, Self::Lava)
    }

    pub fn is_liquid(self) -> bool {
        matches!(self, Self::Water | Self::Ocean)
    }

    pub fn is_water(self) -> bool {
        matches!(self, Self::Water)
    }

    pub fn blocks_sight(self) -> bool {
        matches!(self, Self::Brush)
    }

    pub fn conceals(self) -> bool {
        matches!(self, Self::Brush)
    }
}

/// Read side of the terrain collaborator. Cells outside the world report `Ocean`.
pub trait Terrain {
    fn terrain_at(&self, x: i32, y: i32) -> TerrainKind;
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width() && y < self.height()
    }
}

pub trait Viewport {
    fn current_viewport(&self) -> Rect;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedViewport(pub Rect);

impl Viewport for FixedViewport {
    fn current_viewport(&self) -> Rect {
        self.0
    }
}

/// Viewport covering a whole world, for headless runs.
#[derive(Clone, Copy, Debug)]
pub struct FullViewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport for FullViewport {
    fn current_viewport(&self) -> Rect {
        Rect::from_size(0, 0, self.width, self.height)
    }
}

/// In-memory terrain grid, row-major.
#[derive(Clone, Debug)]
pub struct TerrainGrid {
    width: i32,
    height: i32,
    cells: Vec<TerrainKind>,
}

impl TerrainGrid {
    pub fn filled(width: i32, height: i32, kind: TerrainKind) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![kind; (width * height) as usize],
        }
    }

    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> SimResult<Self> {
        let height = rows.len() as i32;
        let width = rows
            .first()
            .map(|row| row.as_ref().chars().count() as i32)
            .unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(SimError::InvalidMap("map is empty".to_string()));
        }

        let mut cells = Vec::with_capacity((width * height) as usize);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() as i32 != width {
                return Err(SimError::InvalidMap(format!(
                    "row {y} has {} cells, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, c) in row.chars().enumerate() {
                let kind = TerrainKind::from_char(c).ok_or_else(|| {
                    SimError::InvalidMap(format!("unknown terrain {c:?} at ({x}, {y})"))
                })?;
                cells.push(kind);
            }
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn parse(text: &str) -> SimResult<Self> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        Self::from_rows(&rows)
    }

    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    pub fn set(&mut self, pos: Vec2, kind: TerrainKind) -> SimResult<()> {
        let idx = self
            .index_of(pos.x, pos.y)
            .ok_or(SimError::OutOfBounds(pos))?;
        if let Some(cell) = self.cells.get_mut(idx) {
            *cell = kind;
        }
        Ok(())
    }

    pub fn rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.width.max(1) as usize)
            .map(|row| row.iter().map(|kind| kind.to_char()).collect())
            .collect()
    }
}

impl Terrain for TerrainGrid {
    fn terrain_at(&self, x: i32, y: i32) -> TerrainKind {
        self.index_of(x, y)
            .and_then(|idx| self.cells.get(idx).copied())
            .unwrap_or(TerrainKind::Ocean)
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }
}
