use crate::board::{CellBoard, Population};
use crate::error::{GridError, GridResult};
use crate::scheduler::{RunState, Scheduler};
use log::{debug, error, info, trace};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use wireworld_common::{CellCoord, CellState, Snapshot};

/// A Wireworld grid shared between an editing caller and its own periodic stepper.
///
/// Every edit and every tick runs as one critical section on the board lock,
/// so an edit never observes a half-applied tick and a tick's snapshot of the
/// active set is never mutated while it is being evaluated. The scheduler sits
/// behind a separate lock that the ticking thread never takes.
pub struct Grid {
    width: u32,
    height: u32,
    board: Arc<Mutex<CellBoard>>,
    tick_interval_ms: Arc<AtomicU64>,
    scheduler: Mutex<Scheduler>,
}

// Every critical section leaves the board consistent, so a poisoned lock is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One tick under the board lock. Logging happens after the lock is released.
fn run_tick(board: &Mutex<CellBoard>) -> GridResult<(u64, usize)> {
    let started = Instant::now();
    let (generation, evaluated) = {
        let mut board = lock(board);
        let evaluated = board.tick()?;
        (board.generation(), evaluated)
    };
    trace!(
        "Generation {} evaluated {} cells in {:.3} ms",
        generation,
        evaluated,
        started.elapsed().as_secs_f64() * 1000.0
    );
    Ok((generation, evaluated))
}

impl Grid {
    /// Creates an all-empty, idle grid.
    pub fn new(width: u32, height: u32, tick_interval_ms: u64) -> GridResult<Self> {
        Self::with_board(CellBoard::new(width, height)?, tick_interval_ms)
    }

    /// Builds an idle grid from persisted content with a fresh scheduler.
    pub fn from_snapshot(snapshot: &Snapshot, tick_interval_ms: u64) -> GridResult<Self> {
        Self::with_board(CellBoard::from_snapshot(snapshot)?, tick_interval_ms)
    }

    fn with_board(board: CellBoard, tick_interval_ms: u64) -> GridResult<Self> {
        if tick_interval_ms == 0 {
            return Err(GridError::InvalidInterval(tick_interval_ms));
        }
        Ok(Grid {
            width: board.width(),
            height: board.height(),
            board: Arc::new(Mutex::new(board)),
            tick_interval_ms: Arc::new(AtomicU64::new(tick_interval_ms)),
            scheduler: Mutex::new(Scheduler::new()),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_state(&self, x: u32, y: u32) -> GridResult<CellState> {
        lock(&self.board).state_at(x, y)
    }

    /// Runs `f` against a consistent view of the board, e.g. to redraw every cell at once.
    pub fn read<R>(&self, f: impl FnOnce(&CellBoard) -> R) -> R {
        let board = lock(&self.board);
        f(&*board)
    }

    pub fn generation(&self) -> u64 {
        lock(&self.board).generation()
    }

    pub fn active_count(&self) -> usize {
        lock(&self.board).active_set().len()
    }

    /// Active cells in row-major order.
    pub fn active_cells(&self) -> Vec<CellCoord> {
        let mut coords: Vec<CellCoord> = lock(&self.board).active_set().iter().copied().collect();
        coords.sort_by_key(|c| (c.y, c.x));
        coords
    }

    pub fn population(&self) -> Population {
        lock(&self.board).population()
    }

    pub fn snapshot(&self) -> Snapshot {
        lock(&self.board).to_snapshot()
    }

    // --- Edits ---

    /// Advances the cell through the editing cycle and returns its new state.
    pub fn toggle_cell(&self, x: u32, y: u32) -> GridResult<CellState> {
        lock(&self.board).toggle_cell(x, y)
    }

    pub fn paint_wire(&self, x: u32, y: u32) -> GridResult<()> {
        lock(&self.board).paint_wire(x, y)
    }

    pub fn clear_cell(&self, x: u32, y: u32) -> GridResult<()> {
        lock(&self.board).clear_cell(x, y)
    }

    pub fn set_cell(&self, x: u32, y: u32, state: CellState) -> GridResult<()> {
        lock(&self.board).set_cell(x, y, state)
    }

    pub fn clear_all(&self) {
        lock(&self.board).clear_all();
        debug!("Cleared all cells.");
    }

    /// Recomputes the active set from a full scan and returns its size.
    pub fn rebuild_active_set(&self) -> usize {
        let count = lock(&self.board).rebuild_active_set();
        debug!("Rebuilt active set: {} cells.", count);
        count
    }

    // --- Simulation ---

    /// Advances the simulation by one generation.
    pub fn step(&self) -> GridResult<()> {
        run_tick(&self.board).map(|_| ())
    }

    pub fn run_state(&self) -> RunState {
        lock(&self.scheduler).run_state()
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Relaxed)
    }

    /// Starts stepping every `tick_interval_ms`, beginning immediately.
    /// Returns `false` if a run is already active.
    pub fn start(&self) -> bool {
        let board = Arc::clone(&self.board);
        let started = lock(&self.scheduler).start(Arc::clone(&self.tick_interval_ms), move || {
            if let Err(e) = run_tick(&board) {
                error!("Scheduled step failed: {}", e);
            }
        });
        if started {
            info!("Running every {} ms.", self.tick_interval_ms());
        }
        started
    }

    /// Cancels future steps. A step already in progress completes first.
    /// Returns `false` if no run was active.
    pub fn stop(&self) -> bool {
        lock(&self.scheduler).stop()
    }

    /// Changes the step period; a running series picks it up from its next firing.
    pub fn set_interval(&self, tick_interval_ms: u64) -> GridResult<()> {
        if tick_interval_ms == 0 {
            return Err(GridError::InvalidInterval(tick_interval_ms));
        }
        self.tick_interval_ms.store(tick_interval_ms, Ordering::Relaxed);
        lock(&self.scheduler).reschedule();
        debug!("Tick interval set to {} ms.", tick_interval_ms);
        Ok(())
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("tick_interval_ms", &self.tick_interval_ms())
            .field("run_state", &self.run_state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn new_grid_is_idle_and_empty() {
        let grid = Grid::new(13, 14, 500).unwrap();
        assert_eq!((grid.width(), grid.height()), (13, 14));
        assert_eq!(grid.run_state(), RunState::Idle);
        assert_eq!(grid.tick_interval_ms(), 500);
        assert_eq!(grid.active_count(), 0);
        assert_eq!(grid.population().empty, 13 * 14);
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert_eq!(Grid::new(3, 3, 0).unwrap_err(), GridError::InvalidInterval(0));
        let grid = Grid::new(3, 3, 100).unwrap();
        assert_eq!(grid.set_interval(0).unwrap_err(), GridError::InvalidInterval(0));
        assert_eq!(grid.tick_interval_ms(), 100);
    }

    #[test]
    fn edits_are_visible_through_accessors() {
        let grid = Grid::new(4, 4, 100).unwrap();
        assert_eq!(grid.toggle_cell(1, 2).unwrap(), CellState::Wire);
        grid.paint_wire(0, 0).unwrap();
        grid.set_cell(3, 3, CellState::ElectronHead).unwrap();
        assert_eq!(
            grid.active_cells(),
            vec![CellCoord::new(0, 0), CellCoord::new(1, 2), CellCoord::new(3, 3)]
        );
        grid.clear_cell(1, 2).unwrap();
        assert_eq!(grid.cell_state(1, 2).unwrap(), CellState::Empty);
        assert_eq!(grid.active_count(), 2);
        assert!(matches!(grid.toggle_cell(4, 0), Err(GridError::OutOfBounds { .. })));
    }

    #[test]
    fn step_advances_generation() {
        let grid = Grid::new(3, 1, 100).unwrap();
        grid.set_cell(0, 0, CellState::ElectronHead).unwrap();
        grid.paint_wire(1, 0).unwrap();
        grid.step().unwrap();
        assert_eq!(grid.generation(), 1);
        assert_eq!(grid.cell_state(0, 0).unwrap(), CellState::ElectronTail);
        assert_eq!(grid.cell_state(1, 0).unwrap(), CellState::ElectronHead);
        assert!(grid.read(CellBoard::is_settled));
    }

    #[test]
    fn running_grid_accepts_concurrent_edits() {
        let grid = Arc::new(Grid::new(20, 20, 1).unwrap());
        for x in 0..20 {
            grid.paint_wire(x, 10).unwrap();
        }
        grid.set_cell(0, 10, CellState::ElectronHead).unwrap();
        assert!(grid.start());

        let editor = {
            let grid = Arc::clone(&grid);
            thread::spawn(move || {
                for i in 0..200u32 {
                    let (x, y) = (i % 20, i % 7);
                    grid.toggle_cell(x, y).unwrap();
                    assert!(grid.read(CellBoard::is_settled));
                }
            })
        };
        editor.join().unwrap();
        thread::sleep(Duration::from_millis(10));
        assert!(grid.stop());

        let (incremental, settled) = grid.read(|b| (b.active_set().clone(), b.is_settled()));
        assert!(settled);
        assert_eq!(grid.rebuild_active_set(), incremental.len());
        assert_eq!(grid.read(|b| b.active_set().clone()), incremental);
        assert!(grid.generation() >= 1);
    }

    #[test]
    fn failing_scheduled_steps_do_not_stop_the_run() {
        let grid = Grid::new(3, 1, 1).unwrap();
        grid.paint_wire(0, 0).unwrap();
        lock(&grid.board).insert_active_unchecked(CellCoord::new(2, 0));

        assert!(grid.start());
        thread::sleep(Duration::from_millis(30));
        assert_eq!(grid.run_state(), RunState::Running);
        assert_eq!(grid.generation(), 0);

        grid.rebuild_active_set();
        let started = Instant::now();
        while grid.generation() == 0 && started.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(grid.stop());
        assert!(grid.generation() >= 1);
        assert_eq!(grid.cell_state(0, 0).unwrap(), CellState::Wire);
    }

    #[test]
    fn dropping_a_running_grid_stops_it() {
        let grid = Grid::new(2, 2, 1).unwrap();
        assert!(grid.start());
        drop(grid);
    }
}
