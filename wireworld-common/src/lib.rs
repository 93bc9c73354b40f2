pub mod cell_state;
pub mod config;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use cell_state::{CellCoord, CellState};
pub use config::{GridConfig, RunConfig, SeedCell, StorageConfig, TimingConfig, WireworldConfig};
pub use snapshot::{Snapshot, SnapshotError, SnapshotFormat, SNAPSHOT_VERSION};
