//! Grid samplers: pluggable sources of raw per-cell counts.
//!
//! Downstream components only see [`GridSampler`], so a detection pipeline,
//! the random hotspot model, or a scripted test fixture are interchangeable.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::density::{GRID_COLS, GRID_ROWS};

/// Produces one raw count matrix per sampling tick.
pub trait GridSampler: Send {
    /// Source name for logging (e.g. `"hotspot"`).
    fn name(&self) -> &str;

    /// Row-major counts for the next tick.
    fn sample(&mut self) -> Vec<Vec<u32>>;
}

/// Random hotspot model.
///
/// Each tick picks a hotspot centre. Every cell gets a base count of 0–3;
/// cells within distance 2 of the centre get an extra 3–8.
pub struct HotspotSampler {
    rng: StdRng,
    rows: usize,
    cols: usize,
}

impl HotspotSampler {
    /// Seeded from the OS.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Deterministic sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            rows: GRID_ROWS,
            cols: GRID_COLS,
        }
    }
}

impl Default for HotspotSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl GridSampler for HotspotSampler {
    fn name(&self) -> &str {
        "hotspot"
    }

    fn sample(&mut self) -> Vec<Vec<u32>> {
        let (rows, cols) = (self.rows, self.cols);
        let rng = &mut self.rng;
        let center_row = rng.random_range(0..rows) as f64;
        let center_col = rng.random_range(0..cols) as f64;

        let mut frame = Vec::with_capacity(rows);
        for r in 0..rows {
            let mut row = Vec::with_capacity(cols);
            for c in 0..cols {
                let dist =
                    ((r as f64 - center_row).powi(2) + (c as f64 - center_col).powi(2)).sqrt();
                let mut count: u32 = rng.random_range(0..=3);
                if dist < 2.0 {
                    count += rng.random_range(3..=8);
                }
                row.push(count);
            }
            frame.push(row);
        }
        frame
    }
}

/// Replays a fixed sequence of frames, then repeats the last one.
///
/// An empty script yields all-zero frames.
pub struct ScriptedSampler {
    frames: VecDeque<Vec<Vec<u32>>>,
    last: Vec<Vec<u32>>,
}

impl ScriptedSampler {
    pub fn new(frames: impl IntoIterator<Item = Vec<Vec<u32>>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            last: vec![vec![0; GRID_COLS]; GRID_ROWS],
        }
    }
}

impl GridSampler for ScriptedSampler {
    fn name(&self) -> &str {
        "scripted"
    }

    fn sample(&mut self) -> Vec<Vec<u32>> {
        if let Some(frame) = self.frames.pop_front() {
            self.last = frame;
        }
        self.last.clone()
    }
}

/// Venue-wide person count, updated by a bounded random walk each tick.
pub struct CrowdCounter {
    rng: StdRng,
    total: u32,
    floor: u32,
}

impl CrowdCounter {
    /// Minimum total the walk is clamped to.
    pub const DEFAULT_FLOOR: u32 = 120;
    /// Largest step per tick, either direction.
    pub const MAX_STEP: i64 = 5;

    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            total: Self::DEFAULT_FLOOR,
            floor: Self::DEFAULT_FLOOR,
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Advance one tick and return the new total.
    pub fn step(&mut self) -> u32 {
        let change = self.rng.random_range(-Self::MAX_STEP..=Self::MAX_STEP);
        let next = (i64::from(self.total) + change).max(i64::from(self.floor));
        self.total = u32::try_from(next).unwrap_or(u32::MAX);
        self.total
    }
}

impl Default for CrowdCounter {
    fn default() -> Self {
        Self::new()
    }
}
