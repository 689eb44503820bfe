//! Response plan handling.
//!
//! The plan text is opaque. The monitor only displays it and tags each line
//! by keyword; anything unrecognised is `General`, and empty text yields no lines.

use serde::{Deserialize, Serialize};

/// Density signal sent when the operator injects a simulated surge.
pub const SURGE_SIGNAL: u32 = 450;

/// Returned in place of a generated plan when no planner credentials are configured.
pub const SIMULATION_PLAN: &str = "Simulation Mode: API Key missing. Deploy police to Sector A immediately. Prepare triage at City Hospital.";

/// Substituted when the planner request fails.
pub const PLANNER_ERROR_PLAN: &str =
    "Error connecting to AI Command Center. Default Protocol: 1. Disperse Crowd. 2. Notify EMS.";

/// Substituted when the planner returns no text.
pub const EMPTY_PLAN: &str = "No response generated.";

/// `PlannerFailure` detail for a reply that carried no plan text.
pub const EMPTY_RESPONSE: &str = "empty response";

/// Keyword category of a plan line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanCategory {
    Police,
    Medical,
    Announcement,
    General,
}

impl PlanCategory {
    /// Tag a line; first match wins in the order police, medical, announcement.
    pub fn of(line: &str) -> Self {
        let lower = line.to_lowercase();
        if lower.contains("police") {
            Self::Police
        } else if lower.contains("medical") || lower.contains("hospital") {
            Self::Medical
        } else if lower.contains("announcement") {
            Self::Announcement
        } else {
            Self::General
        }
    }
}

/// One displayable line of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLine {
    pub category: PlanCategory,
    pub text: String,
}

/// Split plan text into tagged lines, stripping `**` emphasis and blank lines.
pub fn categorize(plan: &str) -> Vec<PlanLine> {
    plan.lines()
        .map(|line| line.replace("**", "").trim().to_string())
        .filter(|line| !line.is_empty())
        .map(|text| PlanLine {
            category: PlanCategory::of(&text),
            text,
        })
        .collect()
}
