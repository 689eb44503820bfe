//! Density model: the cell grid and the classifier that derives venue status.

pub mod classifier;
pub mod grid;

pub use classifier::{raw_with, Classification, DensityClassifier, DensityThresholds, VenueStatus};
pub use grid::{Cell, CellStatus, Grid, GRID_COLS, GRID_ROWS};
