//! Wireworld simulation engine.
//!
//! A fixed-size [`Grid`] of four-state cells that can be edited and stepped
//! from one thread while its own scheduler steps it periodically from another.
//! Snapshots of grid content are saved and loaded through [`SnapshotStore`].

pub mod board;
pub mod cell;
pub mod error;
pub mod grid;
pub mod neighborhood;
pub mod persistence;
pub mod scheduler;
pub mod session;

pub use board::{CellBoard, Population};
pub use cell::Cell;
pub use error::{GridError, GridResult, PersistError};
pub use grid::Grid;
pub use persistence::SnapshotStore;
pub use scheduler::RunState;
pub use session::Session;
pub use wireworld_common::{CellCoord, CellState, Snapshot, SnapshotFormat};
