use std::fmt;

use crate::types::{Coords, Occupant, OccupantKind};

/// Coordinate or reference failures are caller bugs, never gameplay events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArenaError {
    OutOfBounds {
        coords: Coords,
        cols: i32,
        rows: i32,
    },
    NotFound {
        coords: Coords,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { coords, cols, rows } => write!(
                f,
                "coords ({}, {}) are not valid: must be in range (0, 0) to ({}, {})",
                coords.x,
                coords.y,
                cols - 1,
                rows - 1
            ),
            Self::NotFound { coords } => {
                write!(f, "no such occupant at ({}, {})", coords.x, coords.y)
            }
        }
    }
}

impl std::error::Error for ArenaError {}

/// A fixed-size 2D grid where each cell holds a stack of occupants in
/// insertion order. Pure spatial index: no game rules, no entity lifecycle.
#[derive(Clone, Debug)]
pub struct Arena {
    cols: i32,
    rows: i32,
    cells: Vec<Vec<Occupant>>,
}

impl Arena {
    pub fn new(cols: i32, rows: i32) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            cells: vec![Vec::new(); (cols * rows) as usize],
        }
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn contains(&self, coords: Coords) -> bool {
        (0..self.cols).contains(&coords.x) && (0..self.rows).contains(&coords.y)
    }

    fn cell_index(&self, coords: Coords) -> Result<usize, ArenaError> {
        if !self.contains(coords) {
            return Err(ArenaError::OutOfBounds {
                coords,
                cols: self.cols,
                rows: self.rows,
            });
        }
        Ok((coords.x + coords.y * self.cols) as usize)
    }

    pub fn add(&mut self, coords: Coords, occupant: Occupant) -> Result<(), ArenaError> {
        let index = self.cell_index(coords)?;
        self.cells[index].push(occupant);
        Ok(())
    }

    /// Removes one matching occupant. `NotFound` means the caller's view of
    /// the arena has desynchronized and should be treated as fatal.
    pub fn remove(&mut self, coords: Coords, occupant: Occupant) -> Result<(), ArenaError> {
        let index = self.cell_index(coords)?;
        let cell = &mut self.cells[index];
        match cell.iter().position(|o| *o == occupant) {
            Some(position) => {
                cell.remove(position);
                Ok(())
            }
            None => Err(ArenaError::NotFound { coords }),
        }
    }

    /// Snapshot copy of a cell's stack, in insertion order.
    pub fn get(&self, coords: Coords) -> Result<Vec<Occupant>, ArenaError> {
        let index = self.cell_index(coords)?;
        Ok(self.cells[index].clone())
    }

    pub fn has_kind(&self, coords: Coords, kind: OccupantKind) -> Result<bool, ArenaError> {
        let index = self.cell_index(coords)?;
        Ok(self.cells[index].iter().any(|o| o.kind() == kind))
    }

    /// Row-major walk over every cell, yielding `(x, y, occupants)`.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, &[Occupant])> + '_ {
        self.cells.iter().enumerate().map(|(index, cell)| {
            let x = index as i32 % self.cols;
            let y = index as i32 / self.cols;
            (x, y, cell.as_slice())
        })
    }
}
