use serde::{Deserialize, Serialize};
use std::fmt;

/// The four Wireworld cell states.
///
/// Variant order is the manual editing cycle: `Empty -> Wire -> Head -> Tail -> Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    #[default]
    Empty,
    Wire,
    #[serde(rename = "head")]
    ElectronHead,
    #[serde(rename = "tail")]
    ElectronTail,
}

impl CellState {
    /// All states in cycle order.
    pub const ALL: [CellState; 4] = [
        CellState::Empty,
        CellState::Wire,
        CellState::ElectronHead,
        CellState::ElectronTail,
    ];

    /// The state that follows `self` in the editing cycle.
    pub fn cycled(self) -> Self {
        match self {
            CellState::Empty => CellState::Wire,
            CellState::Wire => CellState::ElectronHead,
            CellState::ElectronHead => CellState::ElectronTail,
            CellState::ElectronTail => CellState::Empty,
        }
    }

    /// Whether a cell in this state belongs in the active set.
    #[inline(always)]
    pub fn is_active(self) -> bool {
        self != CellState::Empty
    }

    /// Position of this state in [`CellState::ALL`].
    pub fn index(self) -> usize {
        match self {
            CellState::Empty => 0,
            CellState::Wire => 1,
            CellState::ElectronHead => 2,
            CellState::ElectronTail => 3,
        }
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellState::Empty => "empty",
            CellState::Wire => "wire",
            CellState::ElectronHead => "electron head",
            CellState::ElectronTail => "electron tail",
        };
        f.write_str(name)
    }
}

/// Position of a cell within a grid. Identity of the cell for the grid's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: u32,
    pub y: u32,
}

impl CellCoord {
    pub fn new(x: u32, y: u32) -> Self {
        CellCoord { x, y }
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycling_four_times_is_identity() {
        for state in CellState::ALL {
            let mut s = state;
            for _ in 0..4 {
                s = s.cycled();
            }
            assert_eq!(s, state);
        }
    }

    #[test]
    fn cycle_follows_editing_order() {
        assert_eq!(CellState::Empty.cycled(), CellState::Wire);
        assert_eq!(CellState::Wire.cycled(), CellState::ElectronHead);
        assert_eq!(CellState::ElectronHead.cycled(), CellState::ElectronTail);
        assert_eq!(CellState::ElectronTail.cycled(), CellState::Empty);
    }

    #[test]
    fn index_matches_all_order() {
        for (i, state) in CellState::ALL.iter().enumerate() {
            assert_eq!(state.index(), i);
        }
    }

    #[test]
    fn only_empty_is_inactive() {
        assert!(!CellState::Empty.is_active());
        assert!(CellState::Wire.is_active());
        assert!(CellState::ElectronHead.is_active());
        assert!(CellState::ElectronTail.is_active());
    }
}
