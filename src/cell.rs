use wireworld_common::{CellCoord, CellState};

/// A single automaton unit.
///
/// `pending_next_state` and `awaiting_commit` are only meaningful between the
/// stage and commit phases of one tick; outside a tick the flag is always false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    coord: CellCoord,
    state: CellState,
    pub(crate) pending_next_state: CellState,
    pub(crate) awaiting_commit: bool,
}

impl Cell {
    pub fn new(coord: CellCoord, state: CellState) -> Self {
        Cell {
            coord,
            state,
            pending_next_state: CellState::Empty,
            awaiting_commit: false,
        }
    }

    #[inline(always)]
    pub fn coord(&self) -> CellCoord {
        self.coord
    }

    #[inline(always)]
    pub fn state(&self) -> CellState {
        self.state
    }

    pub fn is_awaiting_commit(&self) -> bool {
        self.awaiting_commit
    }

    /// Advances to the next state of the editing cycle.
    /// The caller reconciles the grid's active set.
    pub fn cycle_state(&mut self) {
        self.state = self.state.cycled();
    }

    pub fn set_state(&mut self, state: CellState) {
        self.state = state;
    }

    /// Resets to `Empty` and drops any staged transition.
    pub fn clear(&mut self) {
        self.state = CellState::Empty;
        self.pending_next_state = CellState::Empty;
        self.awaiting_commit = false;
    }

    pub(crate) fn stage(&mut self, next: CellState) {
        self.pending_next_state = next;
        self.awaiting_commit = true;
    }

    pub(crate) fn commit(&mut self) {
        self.state = self.pending_next_state;
        self.awaiting_commit = false;
    }
}
