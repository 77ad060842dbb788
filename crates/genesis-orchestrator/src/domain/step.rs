//! Named orchestration steps.
//!
//! ```text
//! AssetInit ─→ Provision(c1..cn) ─→ Issue(c1..cn) ─→ Finalize ─→ ScheduleRelease ─→ Report
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::allocation::AllocationTable;

/// One resumable unit of work.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "step", content = "category", rename_all = "snake_case")]
pub enum Step {
    AssetInit,
    Provision(String),
    Issue(String),
    Finalize,
    ScheduleRelease,
    Report,
}

impl Step {
    /// Metric label; per-category steps share one label.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::AssetInit => "asset_init",
            Step::Provision(_) => "provision",
            Step::Issue(_) => "issue",
            Step::Finalize => "finalize",
            Step::ScheduleRelease => "schedule_release",
            Step::Report => "report",
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Step::Provision(c) | Step::Issue(c) => Some(c),
            _ => None,
        }
    }

    /// Whether the step submits a ledger transaction.
    pub fn touches_ledger(&self) -> bool {
        matches!(
            self,
            Step::AssetInit | Step::Provision(_) | Step::Issue(_) | Step::Finalize
        )
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::AssetInit => f.write_str("asset-init"),
            Step::Provision(c) => write!(f, "provision[{c}]"),
            Step::Issue(c) => write!(f, "issue[{c}]"),
            Step::Finalize => f.write_str("finalize"),
            Step::ScheduleRelease => f.write_str("schedule-release"),
            Step::Report => f.write_str("report"),
        }
    }
}

/// Every step in execution order.
pub fn plan(table: &AllocationTable) -> Vec<Step> {
    let mut steps = Vec::with_capacity(table.len() * 2 + 4);
    steps.push(Step::AssetInit);
    steps.extend(table.names().map(|n| Step::Provision(n.to_string())));
    steps.extend(table.names().map(|n| Step::Issue(n.to_string())));
    steps.push(Step::Finalize);
    steps.push(Step::ScheduleRelease);
    steps.push(Step::Report);
    steps
}
