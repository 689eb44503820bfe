//! Grid model: an immutable, row-major snapshot of classified cells.

use serde::{Deserialize, Serialize};

/// Rows in the monitored grid.
pub const GRID_ROWS: usize = 8;
/// Columns in the monitored grid.
pub const GRID_COLS: usize = 8;

/// Density status of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellStatus {
    Normal,
    High,
    Critical,
}

impl std::fmt::Display for CellStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One unit of the monitored surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Occupancy count reported by the sampler.
    pub count: u32,
    /// Status derived from `count`.
    pub status: CellStatus,
}

/// A classified grid snapshot.
///
/// Each sampling tick produces a new `Grid`; snapshots are never mutated
/// after classification, so readers can hold one across ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    /// Row-major scan order.
    cells: Vec<Cell>,
}

impl Grid {
    /// Build from row-major cells. Only the classifier constructs grids.
    pub(crate) fn from_cells(rows: usize, cols: usize, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), rows * cols);
        Self { rows, cols, cells }
    }

    /// An all-zero grid of the standard size.
    pub fn empty() -> Self {
        let cell = Cell {
            count: 0,
            status: CellStatus::Normal,
        };
        Self::from_cells(GRID_ROWS, GRID_COLS, vec![cell; GRID_ROWS * GRID_COLS])
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell at `(row, col)`, if in bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col)
    }

    /// Iterate rows as slices, top to bottom.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.cols.max(1))
    }

    /// Number of cells in exactly `status`.
    pub fn count_with(&self, status: CellStatus) -> usize {
        self.cells.iter().filter(|c| c.status == status).count()
    }

    /// Largest single-cell count (0 for an empty grid).
    pub fn max_count(&self) -> u32 {
        self.cells.iter().map(|c| c.count).max().unwrap_or(0)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(count: u32, status: CellStatus) -> Cell {
        Cell { count, status }
    }

    #[test]
    fn test_empty_grid_shape() {
        let grid = Grid::empty();
        assert_eq!(grid.rows(), GRID_ROWS);
        assert_eq!(grid.cols(), GRID_COLS);
        assert_eq!(grid.cells().len(), 64);
        assert_eq!(grid.max_count(), 0);
        assert_eq!(grid.count_with(CellStatus::Normal), 64);
    }

    #[test]
    fn test_get_is_row_major() {
        let cells = vec![
            cell(1, CellStatus::Normal),
            cell(2, CellStatus::Normal),
            cell(6, CellStatus::High),
            cell(9, CellStatus::Critical),
        ];
        let grid = Grid::from_cells(2, 2, cells);
        assert_eq!(grid.get(0, 1).map(|c| c.count), Some(2));
        assert_eq!(grid.get(1, 0).map(|c| c.count), Some(6));
        assert_eq!(grid.get(1, 1).map(|c| c.status), Some(CellStatus::Critical));
        assert!(grid.get(2, 0).is_none());
        assert!(grid.get(0, 2).is_none());
    }

    #[test]
    fn test_aggregates() {
        let cells = vec![
            cell(1, CellStatus::Normal),
            cell(6, CellStatus::High),
            cell(9, CellStatus::Critical),
            cell(8, CellStatus::Critical),
        ];
        let grid = Grid::from_cells(2, 2, cells);
        assert_eq!(grid.max_count(), 9);
        assert_eq!(grid.count_with(CellStatus::Critical), 2);
        assert_eq!(grid.count_with(CellStatus::High), 1);
        assert_eq!(grid.iter_rows().count(), 2);
    }

    #[test]
    fn test_cell_status_serializes_uppercase() {
        let json = serde_json::to_string(&CellStatus::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
    }
}
