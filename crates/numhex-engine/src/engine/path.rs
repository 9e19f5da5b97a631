use crate::{CellId, CellValue, ExtendRejection, Grid, LevelTargets, Operator, Topology};

/// Shortest path that can hold an operator between two numbers.
pub const MIN_PATH_LEN: usize = 3;

/// Cells selected during a drag, in selection order.
///
/// A path always starts on a number cell, never repeats a cell, and
/// alternates between number and operator cells.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectedPath {
    ids: Vec<CellId>,
}

impl SelectedPath {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new path at `id`, discarding any previous selection.
    pub fn try_start(&mut self, grid: &Grid, id: CellId) -> Result<(), ExtendRejection> {
        let cell = grid.get(id).ok_or(ExtendRejection::UnknownCell)?;
        if !cell.kind().is_number() {
            return Err(ExtendRejection::NotNumber);
        }
        self.ids.clear();
        self.ids.push(id);
        Ok(())
    }

    /// Appends `id` if it may follow the last selected cell.
    pub fn try_extend(
        &mut self,
        grid: &Grid,
        topology: Topology,
        id: CellId,
    ) -> Result<(), ExtendRejection> {
        let &last = self.ids.last().ok_or(ExtendRejection::NotStarted)?;
        let last_cell = grid.get(last).ok_or(ExtendRejection::UnknownCell)?;
        let cell = grid.get(id).ok_or(ExtendRejection::UnknownCell)?;
        if self.ids.contains(&id) {
            return Err(ExtendRejection::AlreadySelected);
        }
        if cell.kind() == last_cell.kind() {
            return Err(ExtendRejection::SameKind);
        }
        if !topology.is_adjacent(last, id) {
            return Err(ExtendRejection::NotAdjacent);
        }
        self.ids.push(id);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Empties the path and returns what was selected.
    pub fn take(&mut self) -> Vec<CellId> {
        std::mem::take(&mut self.ids)
    }

    #[must_use]
    pub fn ids(&self) -> &[CellId] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: CellId) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn last(&self) -> Option<CellId> {
        self.ids.last().copied()
    }
}

/// Folds the cells of a path left to right into an integer.
///
/// Operators take effect immediately with no precedence: `5 + 3 × 2` is 16.
/// Numbers apply the pending operator (initially `+`) to a running total
/// starting at zero, and operator cells replace the pending operator.
/// Division floors and a zero divisor leaves the total unchanged.
///
/// Returns `None` for paths shorter than [`MIN_PATH_LEN`] or referencing
/// cells that are not on the grid.
///
/// # Examples
///
/// ```
/// use numhex_engine::{Cell, CellId, CellValue, Grid, Operator, evaluate};
///
/// let values = [
///     CellValue::Number(5),
///     CellValue::Operator(Operator::Add),
///     CellValue::Number(3),
///     CellValue::Operator(Operator::Mul),
///     CellValue::Number(2),
/// ];
/// let cells = values
///     .iter()
///     .zip(0..)
///     .map(|(&value, col)| Cell::new(CellId::new(0, col), value))
///     .collect();
/// let grid = Grid::from_cells(1, 5, cells).unwrap();
/// let path: Vec<_> = (0..5).map(|col| CellId::new(0, col)).collect();
///
/// assert_eq!(evaluate(&grid, &path), Some(16));
/// assert_eq!(evaluate(&grid, &path[..2]), None);
/// ```
#[must_use]
pub fn evaluate(grid: &Grid, ids: &[CellId]) -> Option<i64> {
    if ids.len() < MIN_PATH_LEN {
        return None;
    }
    let mut total = 0;
    let mut pending = Operator::Add;
    for &id in ids {
        match grid.get(id)?.value() {
            CellValue::Operator(op) => pending = op,
            CellValue::Number(n) => total = pending.apply(total, i64::from(n)),
        }
    }
    Some(total)
}

/// Result of checking an evaluated path against the level targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Evaluation {
    /// The value equals the incomplete target at `target_index`.
    Matched { target_index: usize, value: i64 },
    /// The value matches no incomplete target.
    Missed { value: i64 },
    /// The path could not be evaluated.
    Invalid,
}

impl Evaluation {
    #[must_use]
    pub fn value(self) -> Option<i64> {
        match self {
            Evaluation::Matched { value, .. } | Evaluation::Missed { value } => Some(value),
            Evaluation::Invalid => None,
        }
    }
}

/// Matches an evaluated value against the incomplete targets.
#[must_use]
pub fn judge(value: Option<i64>, targets: &LevelTargets) -> Evaluation {
    let Some(value) = value else {
        return Evaluation::Invalid;
    };
    match targets.find_incomplete(value) {
        Some(target_index) => Evaluation::Matched {
            target_index,
            value,
        },
        None => Evaluation::Missed { value },
    }
}
