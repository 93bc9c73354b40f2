use crate::error::PersistError;
use crate::grid::Grid;
use log::{debug, info, warn};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use wireworld_common::{Snapshot, SnapshotFormat, StorageConfig};

/// Saves and loads grid snapshots as files.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    extension: String,
    format: SnapshotFormat,
}

impl SnapshotStore {
    /// `extension` must start with a dot, e.g. `".wire"`.
    pub fn new(extension: impl Into<String>, format: SnapshotFormat) -> Self {
        SnapshotStore {
            extension: extension.into(),
            format,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.extension.clone(), config.format)
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn format(&self) -> SnapshotFormat {
        self.format
    }

    /// Appends the store's extension unless the file name already ends with it.
    pub fn resolve_save_path(&self, path: &Path) -> PathBuf {
        let has_extension = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.ends_with(&self.extension));
        if has_extension {
            return path.to_path_buf();
        }
        let mut raw: OsString = path.as_os_str().to_owned();
        raw.push(&self.extension);
        PathBuf::from(raw)
    }

    /// Writes the grid's current content and returns the path actually written.
    ///
    /// The snapshot is copied under the grid lock, then encoded to a sibling
    /// temporary file that is renamed into place, so a failed save never
    /// truncates an existing file.
    pub fn save(&self, grid: &Grid, path: impl AsRef<Path>) -> Result<PathBuf, PersistError> {
        let target = self.resolve_save_path(path.as_ref());
        let snapshot = grid.snapshot();
        self.write_snapshot(&snapshot, &target)?;
        info!(
            "Saved {}x{} grid to '{}' ({:?}).",
            snapshot.width,
            snapshot.height,
            target.display(),
            self.format
        );
        Ok(target)
    }

    /// Reads a snapshot file into a brand-new idle grid.
    ///
    /// Nothing is shared with any existing grid, so on failure the caller's
    /// current grid is untouched.
    pub fn load(&self, path: impl AsRef<Path>, tick_interval_ms: u64) -> Result<Grid, PersistError> {
        let path = path.as_ref();
        let snapshot = self.read_snapshot(path)?;
        let grid = Grid::from_snapshot(&snapshot, tick_interval_ms)?;
        info!(
            "Loaded {}x{} grid with {} active cells from '{}'.",
            grid.width(),
            grid.height(),
            grid.active_count(),
            path.display()
        );
        Ok(grid)
    }

    pub fn read_snapshot(&self, path: &Path) -> Result<Snapshot, PersistError> {
        let file = File::open(path).map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Snapshot::decode(self.format, BufReader::new(file)).map_err(|source| PersistError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_snapshot(&self, snapshot: &Snapshot, target: &Path) -> Result<(), PersistError> {
        let mut tmp_name: OsString = target.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| PersistError::Io { path, source }
        };

        let file = File::create(&tmp).map_err(io_err(&tmp))?;
        let mut writer = BufWriter::new(file);
        let written = snapshot
            .encode(self.format, &mut writer)
            .map_err(PersistError::Encode)
            .and_then(|()| writer.flush().map_err(io_err(&tmp)));
        drop(writer);

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                warn!("Could not remove '{}': {}", tmp.display(), cleanup);
            }
            return Err(e);
        }
        debug!("Renaming '{}' to '{}'.", tmp.display(), target.display());
        fs::rename(&tmp, target).map_err(io_err(target))
    }
}
