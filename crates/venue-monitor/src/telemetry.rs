//! Tracing setup and operator-facing text rendering.
//!
//! Two outputs:
//! - `tracing` events on stderr, filtered by `RUST_LOG` (default `info`)
//! - a plain-text report of a [`MonitorSnapshot`] for the CLI

use std::fmt::Write as _;

use escalation_core::{CellStatus, Classification, Grid, PlanCategory};

use crate::monitor::MonitorSnapshot;

/// Install the global `fmt` subscriber. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// One character per cell: `.` normal, `+` high, `#` critical, followed by the count.
pub fn render_grid(grid: &Grid) -> String {
    let mut out = String::new();
    for row in grid.iter_rows() {
        let line: Vec<String> = row
            .iter()
            .map(|cell| {
                let mark = match cell.status {
                    CellStatus::Normal => '.',
                    CellStatus::High => '+',
                    CellStatus::Critical => '#',
                };
                format!("{}{:>2}", mark, cell.count)
            })
            .collect();
        let _ = writeln!(out, "{}", line.join(" "));
    }
    out
}

pub fn render_classification(classification: &Classification) -> String {
    let mut out = render_grid(&classification.grid);
    let _ = writeln!(
        out,
        "high cells: {}  critical cells: {}",
        classification.high_cells, classification.critical_cells
    );
    let _ = writeln!(out, "status: {}", classification.status);
    out
}

pub fn render_snapshot(snapshot: &MonitorSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Venue status: {} ({}) ==", snapshot.status_label, snapshot.phase);
    let _ = writeln!(
        out,
        "persons: {}  peak cell: {}  high: {}  critical: {}",
        snapshot.total_persons,
        snapshot.max_cell_density,
        snapshot.high_cells,
        snapshot.critical_cells
    );
    match snapshot.critical_elapsed {
        Some(elapsed) => {
            let _ = writeln!(out, "critical for: {:.1}s", elapsed.as_secs_f64());
        }
        None => {
            let _ = writeln!(out, "critical for: -");
        }
    }
    if snapshot.dispatch_ready() {
        let _ = writeln!(out, "dispatch: ready");
    } else {
        let _ = writeln!(out, "dispatch: cooldown {}s", snapshot.cooldown_remaining_secs);
    }

    out.push('\n');
    out.push_str(&render_grid(&snapshot.grid));

    if !snapshot.plan_lines.is_empty() {
        let _ = writeln!(out, "\n-- Response plan --");
        for line in &snapshot.plan_lines {
            let tag = match line.category {
                PlanCategory::Police => "POLICE",
                PlanCategory::Medical => "MEDICAL",
                PlanCategory::Announcement => "ANNOUNCE",
                PlanCategory::General => "-",
            };
            let _ = writeln!(out, "[{:>8}] {}", tag, line.text);
        }
    } else if snapshot.plan_in_flight {
        let _ = writeln!(out, "\n-- Response plan: generating --");
    }

    if let Some(record) = &snapshot.last_notification {
        let _ = writeln!(out, "\n-- Last notification --");
        let _ = writeln!(
            out,
            "{} | {} | {} | {} | delivered: {}",
            record.timestamp.format("%H:%M:%S"),
            record.status,
            record.timeframe,
            record.location,
            record.delivered
        );
        let _ = writeln!(out, "{}", record.message);
    }

    let _ = writeln!(out, "\n-- Event log --");
    for entry in &snapshot.log {
        let _ = writeln!(out, "{}", entry);
    }
    out
}
