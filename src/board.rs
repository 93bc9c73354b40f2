use crate::cell::Cell;
use crate::error::{GridError, GridResult};
use crate::neighborhood::{cell_index, count_neighbors};
use rayon::prelude::*;
use std::collections::HashSet;
use wireworld_common::{CellCoord, CellState, Snapshot};

/// Number of cells in each state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Population {
    pub empty: usize,
    pub wire: usize,
    pub heads: usize,
    pub tails: usize,
}

impl Population {
    pub fn active(&self) -> usize {
        self.wire + self.heads + self.tails
    }
}

/// The cells of a grid plus the active-set index over them.
///
/// `CellBoard` is single-threaded; [`crate::Grid`] wraps it in a mutex so
/// every method here runs as one critical section. After each public method
/// returns, `active` equals the set of non-empty cells and no cell is
/// awaiting commit.
#[derive(Debug, Clone)]
pub struct CellBoard {
    width: u32,
    height: u32,
    /// Row-major, `width * height` entries.
    cells: Vec<Cell>,
    active: HashSet<CellCoord>,
    generation: u64,
}

impl CellBoard {
    /// Creates an all-empty board.
    pub fn new(width: u32, height: u32) -> GridResult<Self> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell::new(CellCoord::new(x, y), CellState::Empty));
            }
        }
        Ok(Self {
            width,
            height,
            cells,
            active: HashSet::new(),
            generation: 0,
        })
    }

    /// Rebuilds a board from persisted content. The active set is recomputed,
    /// never taken from the snapshot.
    pub fn from_snapshot(snapshot: &Snapshot) -> GridResult<Self> {
        let mut board = Self::new(snapshot.width, snapshot.height)?;
        // Snapshot::decode already validates; this guards hand-built values.
        if snapshot.cells.len() != board.cells.len() {
            return Err(GridError::InvalidDimensions {
                width: snapshot.width,
                height: snapshot.height,
            });
        }
        for (cell, &state) in board.cells.iter_mut().zip(snapshot.cells.iter()) {
            cell.set_state(state);
        }
        board.rebuild_active_set();
        Ok(board)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Ticks committed since this board was created.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn index(&self, x: u32, y: u32) -> GridResult<usize> {
        if x >= self.width || y >= self.height {
            return Err(GridError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(cell_index(x, y, self.width))
    }

    pub fn cell(&self, x: u32, y: u32) -> GridResult<&Cell> {
        let idx = self.index(x, y)?;
        Ok(&self.cells[idx])
    }

    pub fn state_at(&self, x: u32, y: u32) -> GridResult<CellState> {
        self.cell(x, y).map(Cell::state)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn active_set(&self) -> &HashSet<CellCoord> {
        &self.active
    }

    fn reconcile(&mut self, coord: CellCoord, state: CellState) {
        if state.is_active() {
            self.active.insert(coord);
        } else {
            self.active.remove(&coord);
        }
    }

    // --- Edits ---

    /// Advances the cell one step through the editing cycle and returns its new state.
    pub fn toggle_cell(&mut self, x: u32, y: u32) -> GridResult<CellState> {
        let idx = self.index(x, y)?;
        let cell = &mut self.cells[idx];
        cell.cycle_state();
        let (coord, state) = (cell.coord(), cell.state());
        self.reconcile(coord, state);
        Ok(state)
    }

    pub fn paint_wire(&mut self, x: u32, y: u32) -> GridResult<()> {
        self.set_cell(x, y, CellState::Wire)
    }

    pub fn clear_cell(&mut self, x: u32, y: u32) -> GridResult<()> {
        let idx = self.index(x, y)?;
        self.cells[idx].clear();
        self.active.remove(&CellCoord::new(x, y));
        Ok(())
    }

    /// Assigns any state directly, keeping the active set in step.
    pub fn set_cell(&mut self, x: u32, y: u32, state: CellState) -> GridResult<()> {
        if state == CellState::Empty {
            return self.clear_cell(x, y);
        }
        let idx = self.index(x, y)?;
        self.cells[idx].set_state(state);
        self.active.insert(CellCoord::new(x, y));
        Ok(())
    }

    pub fn clear_all(&mut self) {
        self.cells.par_iter_mut().for_each(Cell::clear);
        self.active.clear();
    }

    /// Recomputes the active set from a full scan and returns its size.
    pub fn rebuild_active_set(&mut self) -> usize {
        self.active = self
            .cells
            .par_iter()
            .filter(|cell| cell.state().is_active())
            .map(Cell::coord)
            .collect();
        self.active.len()
    }

    // --- Transition rules ---

    /// Number of electron heads among the Moore neighbors of a wire cell.
    ///
    /// Only wire cells have a neighbor-dependent rule; asking for any other
    /// kind is a caller bug and fails with `WrongCellKind`.
    pub fn heads_nearby(&self, x: u32, y: u32) -> GridResult<u8> {
        let found = self.state_at(x, y)?;
        if found != CellState::Wire {
            return Err(GridError::WrongCellKind { x, y, found });
        }
        let width = self.width;
        Ok(count_neighbors(x, y, self.width, self.height, |nx, ny| {
            self.cells[cell_index(nx, ny, width)].state() == CellState::ElectronHead
        }))
    }

    /// The state `(x, y)` will have after the next tick, computed from the current board.
    pub fn next_state(&self, x: u32, y: u32) -> GridResult<CellState> {
        match self.state_at(x, y)? {
            CellState::ElectronHead => Ok(CellState::ElectronTail),
            CellState::ElectronTail => Ok(CellState::Wire),
            CellState::Wire => {
                let heads = self.heads_nearby(x, y)?;
                if heads == 1 || heads == 2 {
                    Ok(CellState::ElectronHead)
                } else {
                    Ok(CellState::Wire)
                }
            }
            // An empty cell in the active set means the index drifted.
            CellState::Empty => Err(GridError::WrongCellKind {
                x,
                y,
                found: CellState::Empty,
            }),
        }
    }

    /// Advances every active cell by one generation and returns how many were evaluated.
    ///
    /// Stage and commit are separate passes over the same snapshot of the
    /// active set, so every rule sees the pre-tick board. If any cell fails to
    /// stage, nothing is committed and the board is unchanged.
    pub fn tick(&mut self) -> GridResult<usize> {
        let evaluated: Vec<CellCoord> = self.active.iter().copied().collect();

        // Phase 1: compute staged values in parallel from an immutable view.
        let staged: Vec<(usize, CellState)> = evaluated
            .par_iter()
            .map(|coord| -> GridResult<(usize, CellState)> {
                let next = self.next_state(coord.x, coord.y)?;
                Ok((cell_index(coord.x, coord.y, self.width), next))
            })
            .collect::<GridResult<Vec<_>>>()?;

        for &(idx, next) in &staged {
            self.cells[idx].stage(next);
        }

        // Phase 2: commit all at once.
        for &(idx, _) in &staged {
            self.cells[idx].commit();
        }

        self.generation += 1;
        Ok(staged.len())
    }

    /// Plants a coordinate in the active set without touching its cell.
    #[cfg(test)]
    pub(crate) fn insert_active_unchecked(&mut self, coord: CellCoord) {
        self.active.insert(coord);
    }

    /// True when no cell is between stage and commit.
    pub fn is_settled(&self) -> bool {
        !self.cells.par_iter().any(Cell::is_awaiting_commit)
    }

    // --- Queries ---

    pub fn population(&self) -> Population {
        let mut population = Population::default();
        for coord in &self.active {
            match self.cells[cell_index(coord.x, coord.y, self.width)].state() {
                CellState::Wire => population.wire += 1,
                CellState::ElectronHead => population.heads += 1,
                CellState::ElectronTail => population.tails += 1,
                CellState::Empty => {}
            }
        }
        population.empty = self.cells.len() - population.active();
        population
    }

    /// Row-major copy of the board's content.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            version: wireworld_common::SNAPSHOT_VERSION,
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(Cell::state).collect(),
        }
    }
}
