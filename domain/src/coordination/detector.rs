//! Conflict detection over active department decisions.

use super::candidate::AgentDecision;
use super::conflict::{Conflict, ConflictCheckResult, ConflictQuery, ConflictSeverity, ConflictType};
use crate::core::string::join_or;
use crate::request::Department;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Finds resource, location, priority and budget collisions.
///
/// Per pair of departments at the same location:
/// - overlapping resources → resource conflict, high
/// - either side needs exclusive site access → location conflict, medium
/// - both sides are emergencies → priority conflict, medium
///
/// Per location: combined cost above the ceiling → budget conflict, high.
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    budget_ceiling: f64,
}

impl ConflictDetector {
    pub fn new(budget_ceiling: f64) -> Self {
        Self { budget_ceiling }
    }

    /// Check a department's intended action against decisions already in
    /// force. Decisions from the querying department, at other locations, or
    /// no longer active are ignored.
    pub fn check(
        &self,
        query: &ConflictQuery,
        active: &[AgentDecision],
        now: DateTime<Utc>,
    ) -> ConflictCheckResult {
        let matched: Vec<&AgentDecision> = active
            .iter()
            .filter(|d| {
                d.location == query.location
                    && d.department != query.agent
                    && d.status.is_active()
            })
            .collect();

        let mut conflicts = Vec::new();
        for other in &matched {
            conflicts.extend(pair_conflicts(
                Party {
                    department: query.agent,
                    decision: None,
                    resources: &query.resources,
                    exclusive_site: query.exclusive_site,
                    emergency: query.priority.is_emergency(),
                },
                Party::from(*other),
                &query.location,
                now,
            ));
        }

        if !matched.is_empty() {
            let total = query.estimated_cost + matched.iter().map(|d| d.estimated_cost).sum::<f64>();
            if total > self.budget_ceiling {
                conflicts.push(self.budget_conflict(
                    &query.location,
                    std::iter::once(query.agent).chain(matched.iter().map(|d| d.department)),
                    matched.iter().map(|d| d.decision_id),
                    total,
                    now,
                ));
            }
        }

        ConflictCheckResult::from_conflicts(conflicts)
    }

    /// Detect every conflict among a batch of decisions.
    pub fn detect_batch(&self, decisions: &[AgentDecision], now: DateTime<Utc>) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        for (i, a) in decisions.iter().enumerate() {
            for b in &decisions[i + 1..] {
                if a.location == b.location && a.department != b.department {
                    conflicts.extend(pair_conflicts(Party::from(a), Party::from(b), &a.location, now));
                }
            }
        }

        let mut by_location: BTreeMap<&str, Vec<&AgentDecision>> = BTreeMap::new();
        for decision in decisions {
            by_location
                .entry(decision.location.as_str())
                .or_default()
                .push(decision);
        }
        for (location, group) in by_location {
            let departments: BTreeSet<Department> = group.iter().map(|d| d.department).collect();
            let total: f64 = group.iter().map(|d| d.estimated_cost).sum();
            if departments.len() > 1 && total > self.budget_ceiling {
                conflicts.push(self.budget_conflict(
                    location,
                    departments,
                    group.iter().map(|d| d.decision_id),
                    total,
                    now,
                ));
            }
        }

        conflicts
    }

    fn budget_conflict(
        &self,
        location: &str,
        agents: impl IntoIterator<Item = Department>,
        decisions: impl IntoIterator<Item = Uuid>,
        total: f64,
        now: DateTime<Utc>,
    ) -> Conflict {
        Conflict::new(
            ConflictType::Budget,
            ConflictSeverity::High,
            location,
            agents,
            decisions,
            format!(
                "Combined spend {:.2} at {} exceeds budget ceiling {:.2}",
                total, location, self.budget_ceiling
            ),
            now,
        )
    }
}

struct Party<'a> {
    department: Department,
    decision: Option<Uuid>,
    resources: &'a BTreeSet<String>,
    exclusive_site: bool,
    emergency: bool,
}

impl<'a> From<&'a AgentDecision> for Party<'a> {
    fn from(d: &'a AgentDecision) -> Self {
        Self {
            department: d.department,
            decision: Some(d.decision_id),
            resources: &d.resources,
            exclusive_site: d.exclusive_site,
            emergency: d.priority.is_emergency(),
        }
    }
}

fn pair_conflicts(a: Party<'_>, b: Party<'_>, location: &str, now: DateTime<Utc>) -> Vec<Conflict> {
    let agents = [a.department, b.department];
    let decisions: Vec<Uuid> = a.decision.into_iter().chain(b.decision).collect();
    let mut conflicts = Vec::new();

    let shared: Vec<&String> = a.resources.intersection(b.resources).collect();
    if !shared.is_empty() {
        conflicts.push(Conflict::new(
            ConflictType::Resource,
            ConflictSeverity::High,
            location,
            agents,
            decisions.clone(),
            format!(
                "{} and {} both need {} at {}",
                a.department,
                b.department,
                join_or(shared, "resources"),
                location
            ),
            now,
        ));
    }

    if a.exclusive_site || b.exclusive_site {
        conflicts.push(Conflict::new(
            ConflictType::Location,
            ConflictSeverity::Medium,
            location,
            agents,
            decisions.clone(),
            format!(
                "{} and {} both plan work at {} and the site cannot be shared",
                a.department, b.department, location
            ),
            now,
        ));
    }

    if a.emergency && b.emergency {
        conflicts.push(Conflict::new(
            ConflictType::Priority,
            ConflictSeverity::Medium,
            location,
            agents,
            decisions,
            format!(
                "{} and {} both claim emergency priority at {}",
                a.department, b.department, location
            ),
            now,
        ));
    }

    conflicts
}
