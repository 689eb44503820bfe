//! Density Classifier: maps raw counts to cell statuses and one venue status.
//!
//! Pure and deterministic: the same raw matrix always yields the same grid
//! and status. No state is carried between calls.
//!
//! # Precedence
//!
//! ```text
//! critical cells >= 2  → CriticalRisk
//! critical cells == 1  → CriticalDensityCell
//! high cells >= 3      → HighDensityWarning
//! high cells >= 1      → HighDensityCell
//! otherwise            → Normal
//! ```
//!
//! "High cells" counts cells in HIGH only; CRITICAL cells are not counted twice.

use serde::{Deserialize, Serialize};

use super::grid::{Cell, CellStatus, Grid, GRID_COLS, GRID_ROWS};
use crate::error::MonitorError;

/// Venue-wide risk classification for one snapshot.
///
/// Variants are declared in precedence order, so `Ord` follows severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueStatus {
    Normal,
    HighDensityCell,
    HighDensityWarning,
    CriticalDensityCell,
    CriticalRisk,
}

impl VenueStatus {
    /// All statuses, lowest severity first.
    pub const ALL: [VenueStatus; 5] = [
        Self::Normal,
        Self::HighDensityCell,
        Self::HighDensityWarning,
        Self::CriticalDensityCell,
        Self::CriticalRisk,
    ];

    /// Member of the CRITICAL family.
    pub fn is_critical(self) -> bool {
        matches!(self, Self::CriticalDensityCell | Self::CriticalRisk)
    }

    /// Member of the HIGH family.
    pub fn is_high(self) -> bool {
        matches!(self, Self::HighDensityCell | Self::HighDensityWarning)
    }

    /// Operator-facing label, also sent on the wire to the alert endpoint.
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::HighDensityCell => "High Density Cell Detected",
            Self::HighDensityWarning => "High Density Warning",
            Self::CriticalDensityCell => "Critical Density Cell Detected",
            Self::CriticalRisk => "CRITICAL RISK",
        }
    }
}

impl std::fmt::Display for VenueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensityThresholds {
    /// Cell count at or above which a cell is HIGH.
    pub high: u32,
    /// Cell count at or above which a cell is CRITICAL.
    pub critical: u32,
    /// CRITICAL cells needed for `CriticalRisk`.
    pub critical_cells_for_risk: usize,
    /// HIGH cells needed for `HighDensityWarning`.
    pub high_cells_for_warning: usize,
}

impl Default for DensityThresholds {
    fn default() -> Self {
        Self {
            high: 5,
            critical: 8,
            critical_cells_for_risk: 2,
            high_cells_for_warning: 3,
        }
    }
}

/// Output of one classification pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub grid: Grid,
    pub status: VenueStatus,
    /// Cells in HIGH (excluding CRITICAL).
    pub high_cells: usize,
    /// Cells in CRITICAL.
    pub critical_cells: usize,
}

/// The density classifier.
#[derive(Debug, Clone, Default)]
pub struct DensityClassifier {
    thresholds: DensityThresholds,
}

impl DensityClassifier {
    /// Classifier with the standard thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: DensityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &DensityThresholds {
        &self.thresholds
    }

    /// Status of a single cell.
    pub fn cell_status(&self, count: u32) -> CellStatus {
        if count >= self.thresholds.critical {
            CellStatus::Critical
        } else if count >= self.thresholds.high {
            CellStatus::High
        } else {
            CellStatus::Normal
        }
    }

    /// Aggregate venue status from per-status cell counts.
    pub fn aggregate(&self, critical_cells: usize, high_cells: usize) -> VenueStatus {
        if critical_cells >= self.thresholds.critical_cells_for_risk {
            VenueStatus::CriticalRisk
        } else if critical_cells >= 1 {
            VenueStatus::CriticalDensityCell
        } else if high_cells >= self.thresholds.high_cells_for_warning {
            VenueStatus::HighDensityWarning
        } else if high_cells >= 1 {
            VenueStatus::HighDensityCell
        } else {
            VenueStatus::Normal
        }
    }

    /// Classify a raw row-major count matrix.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::InvalidGrid` unless the matrix is exactly
    /// `GRID_ROWS` × `GRID_COLS`.
    pub fn classify(&self, raw: &[Vec<u32>]) -> Result<Classification, MonitorError> {
        if raw.len() != GRID_ROWS {
            return Err(invalid_grid(format!("{} rows", raw.len())));
        }
        if let Some((r, row)) = raw.iter().enumerate().find(|(_, row)| row.len() != GRID_COLS) {
            return Err(invalid_grid(format!("row {} has {} columns", r, row.len())));
        }

        let mut high_cells = 0;
        let mut critical_cells = 0;
        let cells: Vec<Cell> = raw
            .iter()
            .flatten()
            .map(|&count| {
                let status = self.cell_status(count);
                match status {
                    CellStatus::Critical => critical_cells += 1,
                    CellStatus::High => high_cells += 1,
                    CellStatus::Normal => {}
                }
                Cell { count, status }
            })
            .collect();

        Ok(Classification {
            grid: Grid::from_cells(GRID_ROWS, GRID_COLS, cells),
            status: self.aggregate(critical_cells, high_cells),
            high_cells,
            critical_cells,
        })
    }
}

fn invalid_grid(detail: String) -> MonitorError {
    MonitorError::InvalidGrid {
        expected_rows: GRID_ROWS,
        expected_cols: GRID_COLS,
        detail,
    }
}

/// Build a standard-size raw matrix filled with `fill`, then apply `(row, col, count)` overrides.
///
/// Out-of-range overrides are ignored.
pub fn raw_with(fill: u32, overrides: &[(usize, usize, u32)]) -> Vec<Vec<u32>> {
    let mut raw = vec![vec![fill; GRID_COLS]; GRID_ROWS];
    for &(r, c, count) in overrides {
        if let Some(cell) = raw.get_mut(r).and_then(|row| row.get_mut(c)) {
            *cell = count;
        }
    }
    raw
}
