use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::GridError;

use super::cell::{Cell, CellId, CellKind, CellValue};

/// Adjacency rule used when extending a path.
///
/// Board revisions disagree on which cells count as neighbours, so the rule
/// is chosen by configuration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Up, down, left and right.
    Rectilinear,
    /// Hexagonal board with odd rows shifted right by half a cell.
    ///
    /// Every cell touches two cells in its own row and two in each of the
    /// rows above and below.
    #[default]
    HexOffset,
    /// Any cell may follow any other; only alternation and uniqueness apply.
    Unrestricted,
}

const RECTILINEAR_OFFSETS: [(i8, i8); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
const HEX_EVEN_ROW_OFFSETS: [(i8, i8); 6] = [(0, -1), (0, 1), (-1, -1), (-1, 0), (1, -1), (1, 0)];
const HEX_ODD_ROW_OFFSETS: [(i8, i8); 6] = [(0, -1), (0, 1), (-1, 0), (-1, 1), (1, 0), (1, 1)];

impl Topology {
    fn offsets(self, row: u8) -> &'static [(i8, i8)] {
        match self {
            Topology::Rectilinear => &RECTILINEAR_OFFSETS,
            Topology::HexOffset if row % 2 == 0 => &HEX_EVEN_ROW_OFFSETS,
            Topology::HexOffset => &HEX_ODD_ROW_OFFSETS,
            Topology::Unrestricted => &[],
        }
    }

    /// Returns whether `next` may directly follow `prev` in a path.
    ///
    /// # Examples
    ///
    /// ```
    /// use numhex_engine::{CellId, Topology};
    ///
    /// let a = CellId::new(0, 1);
    /// assert!(Topology::Rectilinear.is_adjacent(a, CellId::new(1, 1)));
    /// assert!(!Topology::Rectilinear.is_adjacent(a, CellId::new(1, 2)));
    /// // Row 0 is even, so its lower neighbours are columns 0 and 1.
    /// assert!(Topology::HexOffset.is_adjacent(a, CellId::new(1, 0)));
    /// assert!(!Topology::HexOffset.is_adjacent(a, CellId::new(1, 2)));
    /// ```
    #[must_use]
    pub fn is_adjacent(self, prev: CellId, next: CellId) -> bool {
        if prev == next {
            return false;
        }
        if self == Topology::Unrestricted {
            return true;
        }
        self.offsets(prev.row())
            .iter()
            .any(|&(d_row, d_col)| prev.offset(d_row, d_col) == Some(next))
    }
}

/// Immutable board of alternating number and operator cells.
///
/// Cells are stored row-major. A grid is replaced wholesale when a new one is
/// generated, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridRepr", into = "GridRepr")]
pub struct Grid {
    rows: u8,
    cols: u8,
    cells: Vec<Cell>,
}

#[derive(Serialize, Deserialize)]
struct GridRepr {
    rows: u8,
    cols: u8,
    cells: Vec<Cell>,
}

impl TryFrom<GridRepr> for Grid {
    type Error = GridError;

    fn try_from(repr: GridRepr) -> Result<Self, Self::Error> {
        Grid::from_cells(repr.rows, repr.cols, repr.cells)
    }
}

impl From<Grid> for GridRepr {
    fn from(grid: Grid) -> Self {
        Self {
            rows: grid.rows,
            cols: grid.cols,
            cells: grid.cells,
        }
    }
}

impl Grid {
    /// Builds a grid from row-major cells, checking layout and value ranges.
    pub fn from_cells(rows: u8, cols: u8, cells: Vec<Cell>) -> Result<Self, GridError> {
        let expected = usize::from(rows) * usize::from(cols);
        if cells.len() != expected {
            return Err(GridError::CellCount {
                expected,
                actual: cells.len(),
            });
        }
        let positions = (0..rows).flat_map(|row| (0..cols).map(move |col| CellId::new(row, col)));
        for (cell, expected) in cells.iter().zip(positions) {
            if cell.id() != expected {
                return Err(GridError::Misplaced {
                    expected,
                    found: cell.id(),
                });
            }
            if cell.kind() != CellKind::at(expected.row(), expected.col()) {
                return Err(GridError::WrongKind { id: expected });
            }
            if let CellValue::Number(value) = cell.value()
                && value > 9
            {
                return Err(GridError::DigitRange { id: expected, value });
            }
        }
        Ok(Self { rows, cols, cells })
    }

    /// Builds a grid by asking `value_at` for the content of every position.
    ///
    /// Used by the generator, which always honours the parity rule.
    pub(crate) fn from_fn(rows: u8, cols: u8, mut value_at: impl FnMut(CellId) -> CellValue) -> Self {
        let cells = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| CellId::new(row, col)))
            .map(|id| {
                let value = value_at(id);
                debug_assert_eq!(value.kind(), CellKind::at(id.row(), id.col()));
                Cell::new(id, value)
            })
            .collect();
        Self { rows, cols, cells }
    }

    #[must_use]
    pub fn rows(&self) -> u8 {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> u8 {
        self.cols
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[must_use]
    pub fn get(&self, id: CellId) -> Option<&Cell> {
        if id.row() >= self.rows || id.col() >= self.cols {
            return None;
        }
        let index = usize::from(id.row()) * usize::from(self.cols) + usize::from(id.col());
        self.cells.get(index)
    }

    #[must_use]
    pub fn contains(&self, id: CellId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the on-board neighbours of `id` under `topology`.
    ///
    /// [`Topology::Unrestricted`] has no spatial neighbourhood and yields nothing.
    #[must_use]
    pub fn neighbors(&self, id: CellId, topology: Topology) -> ArrayVec<CellId, 6> {
        topology
            .offsets(id.row())
            .iter()
            .filter_map(|&(d_row, d_col)| id.offset(d_row, d_col))
            .filter(|&next| self.contains(next))
            .collect()
    }

    /// Iterates over the rows, each as a slice of cells.
    pub fn row_slices(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks(usize::from(self.cols).max(1))
    }
}
