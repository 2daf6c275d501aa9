//! Occupancy storage: the single source of truth for which locked block sits
//! in which cell.
//!
//! Occupants live in an arena keyed by [`OccupantId`]; cells only hold
//! handles. Removal is two-phase: [`Grid::mark_for_removal`] deactivates an
//! occupant and frees its cell, [`Grid::commit_removals`] destroys it later.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};

use crate::config::EngineConfig;
use crate::shapes::ShapeKind;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct OccupantId(u64);

#[derive(Clone, PartialEq, Debug)]
pub struct Occupant {
    pub id: OccupantId,
    pub kind: ShapeKind,
    pub cell: Option<Cell>,
    pub world: WorldPos,
    /// Cleared when the occupant is marked for removal.
    pub locked: bool,
}

pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Option<OccupantId>>,
    occupants: BTreeMap<OccupantId, Occupant>,
    pending: BTreeSet<OccupantId>,
    next_id: u64,
    origin: WorldPos,
    cell_size: f32,
}

// ============================================================================
// Construction & Coordinates
// ============================================================================

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
            occupants: BTreeMap::new(),
            pending: BTreeSet::new(),
            next_id: 0,
            origin: WorldPos::default(),
            cell_size: 1.0,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let mut grid = Self::new(config.width, config.height);
        grid.origin = WorldPos {
            x: config.origin_x,
            y: config.origin_y,
        };
        grid.cell_size = config.cell_size;
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y)
            .then(|| y as usize * self.width + x as usize)
    }

    pub fn cell_to_world(&self, cell: Cell) -> WorldPos {
        WorldPos {
            x: self.origin.x + cell.x as f32 * self.cell_size,
            y: self.origin.y + cell.y as f32 * self.cell_size,
        }
    }

    /// Nearest cell to a world position. The result may be out of bounds.
    pub fn world_to_cell(&self, pos: WorldPos) -> Cell {
        Cell::new(
            ((pos.x - self.origin.x) / self.cell_size).round() as i32,
            ((pos.y - self.origin.y) / self.cell_size).round() as i32,
        )
    }
}

// ============================================================================
// Query & Mutate
// ============================================================================

impl Grid {
    /// Out-of-bounds cells count as occupied so validity checks double as
    /// boundary checks. Pending-destroy occupants never occupy.
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        let Some(idx) = self.index(x, y) else {
            debug!("occupancy query outside grid at ({x}, {y}) treated as blocked");
            return true;
        };
        self.cells[idx].is_some_and(|id| self.is_live(id))
    }

    fn is_live(&self, id: OccupantId) -> bool {
        !self.pending.contains(&id) && self.occupants.get(&id).is_some_and(|o| o.locked)
    }

    pub fn occupant(&self, id: OccupantId) -> Option<&Occupant> {
        self.occupants.get(&id)
    }

    /// The live occupant at `(x, y)`, if any.
    pub fn occupant_at(&self, x: i32, y: i32) -> Option<&Occupant> {
        let id = self.cells[self.index(x, y)?]?;
        if self.is_live(id) {
            self.occupants.get(&id)
        } else {
            None
        }
    }

    /// Creates a detached occupant; it blocks nothing until placed.
    pub fn spawn_occupant(&mut self, kind: ShapeKind) -> OccupantId {
        let id = OccupantId(self.next_id);
        self.next_id += 1;
        self.occupants.insert(
            id,
            Occupant {
                id,
                kind,
                cell: None,
                world: WorldPos::default(),
                locked: false,
            },
        );
        id
    }

    /// Writes `id` into `(x, y)`. Overwriting a filled cell is a caller bug:
    /// it is logged and the last write wins.
    pub fn place(&mut self, x: i32, y: i32, id: OccupantId) -> bool {
        let Some(idx) = self.index(x, y) else {
            warn!("place outside grid at ({x}, {y}) ignored");
            return false;
        };
        if !self.occupants.contains_key(&id) {
            warn!("place of unknown occupant {id:?} at ({x}, {y}) ignored");
            return false;
        }

        let current = self.cells[idx];
        match current {
            Some(existing) if existing == id => {}
            Some(existing) => {
                warn!("overwriting occupant {existing:?} at ({x}, {y}) with {id:?}");
                self.cells[idx] = None;
                self.discard_detached(existing);
            }
            None => {}
        }

        // An occupant sits in at most one cell.
        let previous = self.occupants.get(&id).and_then(|o| o.cell);
        if let Some(prev) = previous.filter(|&c| c != Cell::new(x, y)) {
            if let Some(prev_idx) = self.index(prev.x, prev.y) {
                self.cells[prev_idx] = None;
            }
        }

        let cell = Cell::new(x, y);
        let world = self.cell_to_world(cell);
        if let Some(occupant) = self.occupants.get_mut(&id) {
            occupant.cell = Some(cell);
            occupant.world = world;
            occupant.locked = true;
        }
        self.cells[idx] = Some(id);
        true
    }

    /// Empties `(x, y)` and returns what was there. The detached occupant is
    /// destroyed unless it is waiting in the pending-destroy set.
    pub fn clear(&mut self, x: i32, y: i32) -> Option<OccupantId> {
        let Some(idx) = self.index(x, y) else {
            warn!("clear outside grid at ({x}, {y}) ignored");
            return None;
        };
        let id = self.cells[idx].take()?;
        if let Some(occupant) = self.occupants.get_mut(&id) {
            occupant.cell = None;
        }
        self.discard_detached(id);
        Some(id)
    }

    fn discard_detached(&mut self, id: OccupantId) {
        if !self.pending.contains(&id) {
            self.occupants.remove(&id);
        }
    }

    /// Destroys every occupant and forgets pending handles.
    pub fn reset(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = None);
        self.occupants.clear();
        self.pending.clear();
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        y < self.height && (0..self.width).all(|x| self.is_occupied(x as i32, y as i32))
    }

    /// Full rows in ascending order.
    pub fn full_rows(&self) -> Vec<usize> {
        (0..self.height).filter(|&y| self.is_row_full(y)).collect()
    }

    pub fn filled_count_in_row(&self, y: usize) -> usize {
        (0..self.width)
            .filter(|&x| self.is_occupied(x as i32, y as i32))
            .count()
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: OccupantId) -> bool {
        self.pending.contains(&id)
    }

    /// Live occupant kinds, bottom row first.
    pub fn rows(&self) -> Vec<Vec<Option<ShapeKind>>> {
        (0..self.height as i32)
            .map(|y| {
                (0..self.width as i32)
                    .map(|x| self.occupant_at(x, y).map(|o| o.kind))
                    .collect()
            })
            .collect()
    }
}

// ============================================================================
// Two-Phase Removal & Compaction
// ============================================================================

impl Grid {
    /// Deactivates `id` and frees its cell. Returns `false` if it was already
    /// pending or does not exist, so an occupant is never destroyed twice.
    pub fn mark_for_removal(&mut self, id: OccupantId) -> bool {
        if self.pending.contains(&id) {
            return false;
        }
        let Some(occupant) = self.occupants.get_mut(&id) else {
            return false;
        };
        occupant.locked = false;
        let cell = occupant.cell.take();
        self.pending.insert(id);
        if let Some(idx) = cell.and_then(|c| self.index(c.x, c.y)) {
            if self.cells[idx] == Some(id) {
                self.cells[idx] = None;
            }
        }
        true
    }

    /// Destroys every pending occupant. Returns how many were destroyed.
    pub fn commit_removals(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        for cell in self.cells.iter_mut() {
            if cell.is_some_and(|id| pending.contains(&id)) {
                *cell = None;
            }
        }
        let mut destroyed = 0;
        for id in &pending {
            if self.occupants.remove(id).is_some() {
                destroyed += 1;
            }
        }
        destroyed
    }

    /// Moves each surviving row down by the number of `cleared` rows beneath
    /// it. Cleared rows must already be empty.
    pub fn compact(&mut self, cleared: &[usize]) {
        if cleared.is_empty() {
            return;
        }
        for y in 0..self.height {
            if cleared.contains(&y) {
                continue;
            }
            let shift = cleared.iter().filter(|&&row| row < y).count();
            if shift == 0 {
                continue;
            }
            let target = y - shift;
            for x in 0..self.width {
                let from = y * self.width + x;
                let to = target * self.width + x;
                let Some(id) = self.cells[from].take() else {
                    continue;
                };
                if let Some(stale) = self.cells[to].replace(id) {
                    warn!("compaction landed {id:?} on {stale:?} at ({x}, {target})");
                    self.discard_detached(stale);
                }
                let cell = Cell::new(x as i32, target as i32);
                let drop = shift as f32 * self.cell_size;
                if let Some(occupant) = self.occupants.get_mut(&id) {
                    occupant.cell = Some(cell);
                    occupant.world.y -= drop;
                }
            }
        }
    }
}
