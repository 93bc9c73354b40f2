use crate::error::{GridResult, PersistError};
use crate::grid::Grid;
use crate::persistence::SnapshotStore;
use log::{info, warn};
use std::path::{Path, PathBuf};
use wireworld_common::WireworldConfig;

/// One editing session: exactly one grid plus the store it is saved to and loaded from.
#[derive(Debug)]
pub struct Session {
    grid: Grid,
    store: SnapshotStore,
}

impl Session {
    /// Creates a fresh grid from configuration and places the configured seed cells.
    pub fn new(config: &WireworldConfig) -> GridResult<Self> {
        let grid = Grid::new(
            config.grid.width,
            config.grid.height,
            config.timing.tick_interval_ms,
        )?;
        for seed in &config.seed {
            if let Err(e) = grid.set_cell(seed.x, seed.y, seed.state) {
                warn!("Skipping seed cell: {}", e);
            }
        }
        info!(
            "Session grid {}x{} with {} seeded cells, stepping every {} ms.",
            grid.width(),
            grid.height(),
            grid.active_count(),
            grid.tick_interval_ms()
        );
        Ok(Session {
            grid,
            store: SnapshotStore::from_config(&config.storage),
        })
    }

    pub fn with_grid(grid: Grid, store: SnapshotStore) -> Self {
        Session { grid, store }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<PathBuf, PersistError> {
        self.store.save(&self.grid, path)
    }

    /// Replaces the grid with the content of a snapshot file.
    ///
    /// The new grid is fully built before anything changes. On success the old
    /// grid's run is stopped and the replacement starts idle, keeping the
    /// session's step interval. On failure the current grid is left as it was.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let replacement = self.store.load(path, self.grid.tick_interval_ms())?;
        self.grid.stop();
        self.grid = replacement;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wireworld_common::{CellState, SeedCell};

    #[test]
    fn seeds_are_placed_and_out_of_range_ones_skipped() {
        let mut config = WireworldConfig::default();
        config.grid.width = 4;
        config.grid.height = 4;
        config.seed = vec![
            SeedCell { x: 1, y: 1, state: CellState::ElectronHead },
            SeedCell { x: 2, y: 1, state: CellState::Wire },
            SeedCell { x: 9, y: 9, state: CellState::Wire },
        ];
        let session = Session::new(&config).unwrap();
        assert_eq!(session.grid().active_count(), 2);
        assert_eq!(session.grid().cell_state(1, 1).unwrap(), CellState::ElectronHead);
    }

    #[test]
    fn failed_load_keeps_current_grid() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.wire");
        std::fs::write(&bogus, b"definitely not a grid").unwrap();

        let mut session = Session::new(&WireworldConfig::default()).unwrap();
        session.grid().paint_wire(3, 3).unwrap();
        let err = session.load(&bogus).unwrap_err();
        assert!(matches!(err, PersistError::Decode { .. }));
        assert_eq!(session.grid().cell_state(3, 3).unwrap(), CellState::Wire);
        assert_eq!(session.grid().width(), 40);
    }
}
