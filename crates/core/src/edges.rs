//! Generic status edge tables.
//!
//! Both the event and the venue workflows are described as a flat list of
//! `(from, to, authority)` edges. [`decide`] evaluates one requested change
//! against such a table and reports the precise reason for a rejection.

use std::fmt::Display;

use serde::Serialize;

use crate::error::CoreError;

/// Who may traverse an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    /// The owning event host.
    Host,
    /// Any user holding the staff role.
    Staff,
    /// Internal time-based jobs.
    System,
}

/// One allowed status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge<S> {
    pub from: S,
    pub to: S,
    pub authority: Authority,
}

impl<S> Edge<S> {
    pub const fn new(from: S, to: S, authority: Authority) -> Self {
        Self {
            from,
            to,
            authority,
        }
    }
}

/// Outcome of a legal, authorized request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Apply the change and record history.
    Apply,
    /// The entity is already in the requested status; nothing to write.
    Unchanged,
}

/// Evaluate a requested change against `edges`.
///
/// Rules, in order:
/// - `current == target`: `Unchanged` if the actor may reach `target` by some
///   edge, `Forbidden` if edges into `target` exist but none permit the actor,
///   `InvalidTransition` if no edge leads into `target` at all.
/// - an edge `(current, target)` exists: `Apply` if one of its authorities
///   permits the actor, else `Forbidden`.
/// - no such edge: `Forbidden` when the actor could not reach `target` from
///   any status, otherwise `InvalidTransition`.
pub fn decide<S, F>(
    entity: &'static str,
    edges: &[Edge<S>],
    current: S,
    target: S,
    permits: F,
) -> Result<Decision, CoreError>
where
    S: Copy + Eq + Display,
    F: Fn(Authority) -> bool,
{
    let mut into_target = edges.iter().filter(|e| e.to == target).peekable();
    let target_reachable = into_target.peek().is_some();
    let actor_may_reach_target = edges
        .iter()
        .filter(|e| e.to == target)
        .any(|e| permits(e.authority));

    let invalid = || CoreError::InvalidTransition {
        entity,
        from: current.to_string(),
        to: target.to_string(),
    };
    let forbidden = |required: Vec<Authority>| {
        CoreError::Forbidden(format!(
            "Actor lacks a role permitted to move {entity} from '{current}' to '{target}' \
             (requires one of: {required:?})"
        ))
    };

    if current == target {
        return if actor_may_reach_target {
            Ok(Decision::Unchanged)
        } else if target_reachable {
            Err(forbidden(into_target.map(|e| e.authority).collect()))
        } else {
            Err(invalid())
        };
    }

    let direct: Vec<Authority> = edges
        .iter()
        .filter(|e| e.from == current && e.to == target)
        .map(|e| e.authority)
        .collect();

    if !direct.is_empty() {
        return if direct.iter().any(|a| permits(*a)) {
            Ok(Decision::Apply)
        } else {
            Err(forbidden(direct))
        };
    }

    if target_reachable && !actor_may_reach_target {
        Err(forbidden(into_target.map(|e| e.authority).collect()))
    } else {
        Err(invalid())
    }
}

/// Targets reachable from `current` by edges the actor may traverse.
pub fn reachable_targets<S, F>(edges: &[Edge<S>], current: S, permits: F) -> Vec<S>
where
    S: Copy + Eq,
    F: Fn(Authority) -> bool,
{
    let mut out: Vec<S> = Vec::new();
    for edge in edges.iter().filter(|e| e.from == current) {
        if permits(edge.authority) && !out.contains(&edge.to) {
            out.push(edge.to);
        }
    }
    out
}
