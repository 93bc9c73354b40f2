use crate::cell_state::{CellCoord, CellState};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

/// Current on-disk snapshot layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A persisted copy of grid content.
///
/// Only structural data is stored: dimensions and one state per cell. Cells are
/// laid out row-major, so the state of `(x, y)` lives at `y * width + x`.
/// Scheduler state, locks and the active set are never part of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub cells: Vec<CellState>,
}

/// Errors produced while encoding, decoding or validating a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode snapshot: {0}")]
    Encode(String),

    #[error("malformed snapshot: {0}")]
    Decode(String),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("snapshot holds {found} cells but declares a {width}x{height} grid")]
    DimensionMismatch { width: u32, height: u32, found: usize },

    #[error("snapshot declares an empty {width}x{height} grid")]
    EmptyGrid { width: u32, height: u32 },
}

/// Serialization format used for snapshot files.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Bincode,
    Json,
    MessagePack,
}

impl Snapshot {
    /// Builds a snapshot from row-major cell states.
    pub fn new(width: u32, height: u32, cells: Vec<CellState>) -> Result<Self, SnapshotError> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            width,
            height,
            cells,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Checks the structural invariants a decoded snapshot must satisfy.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        if self.width == 0 || self.height == 0 {
            return Err(SnapshotError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        let expected = self.width as usize * self.height as usize;
        if self.cells.len() != expected {
            return Err(SnapshotError::DimensionMismatch {
                width: self.width,
                height: self.height,
                found: self.cells.len(),
            });
        }
        Ok(())
    }

    /// State stored for `(x, y)`, or `None` outside the grid.
    pub fn state_at(&self, x: u32, y: u32) -> Option<CellState> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Iterates every non-empty cell with its coordinate.
    pub fn active_cells(&self) -> impl Iterator<Item = (CellCoord, CellState)> + '_ {
        let width = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, state)| state.is_active())
            .map(move |(idx, &state)| {
                let coord = CellCoord::new((idx % width) as u32, (idx / width) as u32);
                (coord, state)
            })
    }

    /// Writes the snapshot in the given format.
    pub fn encode<W: Write>(&self, format: SnapshotFormat, mut writer: W) -> Result<(), SnapshotError> {
        match format {
            SnapshotFormat::Bincode => bincode::serialize_into(writer, self)
                .map_err(|e| SnapshotError::Encode(e.to_string())),
            SnapshotFormat::Json => serde_json::to_writer(writer, self)
                .map_err(|e| SnapshotError::Encode(e.to_string())),
            SnapshotFormat::MessagePack => rmp_serde::encode::write(&mut writer, self)
                .map_err(|e| SnapshotError::Encode(e.to_string())),
        }
    }

    /// Reads and validates a snapshot in the given format.
    pub fn decode<R: Read>(format: SnapshotFormat, reader: R) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = match format {
            SnapshotFormat::Bincode => bincode::deserialize_from(reader)
                .map_err(|e| SnapshotError::Decode(e.to_string()))?,
            SnapshotFormat::Json => serde_json::from_reader(reader)
                .map_err(|e| SnapshotError::Decode(e.to_string()))?,
            SnapshotFormat::MessagePack => rmp_serde::decode::from_read(reader)
                .map_err(|e| SnapshotError::Decode(e.to_string()))?,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        let mut cells = vec![CellState::Empty; 12];
        cells[1] = CellState::Wire;
        cells[5] = CellState::ElectronHead;
        cells[11] = CellState::ElectronTail;
        Snapshot::new(4, 3, cells).unwrap()
    }

    #[test]
    fn cells_are_row_major() {
        let snap = sample();
        assert_eq!(snap.state_at(1, 0), Some(CellState::Wire));
        assert_eq!(snap.state_at(1, 1), Some(CellState::ElectronHead));
        assert_eq!(snap.state_at(3, 2), Some(CellState::ElectronTail));
        assert_eq!(snap.state_at(4, 0), None);
    }

    #[test]
    fn active_cells_skip_empty() {
        let coords: Vec<_> = sample().active_cells().map(|(c, _)| c).collect();
        assert_eq!(
            coords,
            vec![CellCoord::new(1, 0), CellCoord::new(1, 1), CellCoord::new(3, 2)]
        );
    }

    #[test]
    fn every_format_reproduces_the_snapshot() {
        let snap = sample();
        for format in [SnapshotFormat::Bincode, SnapshotFormat::Json, SnapshotFormat::MessagePack] {
            let mut buf = Vec::new();
            snap.encode(format, &mut buf).unwrap();
            let decoded = Snapshot::decode(format, buf.as_slice()).unwrap();
            assert_eq!(decoded, snap, "format {:?}", format);
        }
    }

    #[test]
    fn json_uses_readable_state_names() {
        let mut buf = Vec::new();
        sample().encode(SnapshotFormat::Json, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\"head\""));
        assert!(text.contains("\"tail\""));
        assert!(text.contains("\"wire\""));
    }

    #[test]
    fn decode_rejects_truncated_cell_array() {
        let json = r#"{"version":1,"width":2,"height":2,"cells":["empty","wire"]}"#;
        let err = Snapshot::decode(SnapshotFormat::Json, json.as_bytes()).unwrap_err();
        assert!(matches!(err, SnapshotError::DimensionMismatch { found: 2, .. }));
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let json = r#"{"version":7,"width":1,"height":1,"cells":["empty"]}"#;
        let err = Snapshot::decode(SnapshotFormat::Json, json.as_bytes()).unwrap_err();
        assert!(matches!(err, SnapshotError::VersionMismatch { found: 7, .. }));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = Snapshot::decode(SnapshotFormat::Bincode, &[0xffu8, 0x01][..]).unwrap_err();
        assert!(matches!(err, SnapshotError::Decode(_)));
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        let err = Snapshot::new(0, 3, Vec::new()).unwrap_err();
        assert!(matches!(err, SnapshotError::EmptyGrid { .. }));
    }
}
