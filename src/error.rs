//! Error types for grid operations and snapshot persistence.

use std::path::PathBuf;
use thiserror::Error;
use wireworld_common::{CellState, SnapshotError};

/// Failures raised by the grid's mutation and evaluation API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Coordinate outside the grid. Indicates an integration bug in the caller.
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },

    /// The neighbor rule was applied to a cell that is not wire.
    #[error("expected a wire cell at ({x}, {y}), found {found}")]
    WrongCellKind { x: u32, y: u32, found: CellState },

    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("tick interval must be positive, got {0} ms")]
    InvalidInterval(u64),
}

/// Failures raised while saving or loading a snapshot file.
///
/// The `Display` text is suitable for showing to the user as-is.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("could not access '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not a valid simulation file: {}", .path.display(), .source)]
    Decode {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },

    #[error("could not write simulation: {0}")]
    Encode(#[source] SnapshotError),

    #[error("simulation file describes an unusable grid: {0}")]
    Grid(#[from] GridError),
}

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;
