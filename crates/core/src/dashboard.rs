//! Dashboard statistics for hosts and staff.
//!
//! The caller fetches raw statuses and counts; everything here is pure
//! arithmetic over those inputs.

use serde::Serialize;

use crate::event_workflow::{EventStatus, NEEDS_ATTENTION};

/// Window over which staff approval rate is measured.
pub const APPROVAL_RATE_WINDOW_DAYS: i64 = 30;

/// Counters on a host's own dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostStats {
    pub total: i64,
    /// Events that passed review: approved, scheduled, published or completed.
    pub approved: i64,
    /// Waiting on staff: submitted, in_review or resubmitted.
    pub pending: i64,
    pub draft: i64,
    pub changes_requested: i64,
}

impl HostStats {
    pub fn from_statuses(statuses: &[EventStatus]) -> Self {
        let mut stats = HostStats {
            total: statuses.len() as i64,
            ..Default::default()
        };
        for status in statuses {
            match status {
                EventStatus::Approved
                | EventStatus::Scheduled
                | EventStatus::Published
                | EventStatus::Completed => stats.approved += 1,
                EventStatus::Draft => stats.draft += 1,
                EventStatus::ChangesRequested => stats.changes_requested += 1,
                s if NEEDS_ATTENTION.contains(s) => stats.pending += 1,
                _ => {}
            }
        }
        stats
    }
}

/// Counters on the staff dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffStats {
    pub total_events: i64,
    pub pending_review: i64,
    pub active_venues: i64,
    /// `approved / (approved + declined)` over the window; `None` without decisions.
    pub approval_rate_30d: Option<f64>,
}

/// Share of review decisions that were approvals.
pub fn approval_rate(approved: i64, declined: i64) -> Option<f64> {
    let decided = approved + declined;
    if decided <= 0 {
        return None;
    }
    Some(approved as f64 / decided as f64)
}
