//! Deterministic resolution of simple conflicts.

use super::candidate::AgentDecision;
use super::conflict::{Conflict, ConflictType};
use super::resolution::{ExecutionPlan, Resolution, ResolutionDecision, ResolutionMethod};
use crate::rules::departments::MONSOON_MONTHS;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Seasonal restriction on excavation-type work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsoonPolicy {
    /// Months (1-12) the restriction applies.
    pub months: Vec<u32>,
    /// Request kinds vetoed during those months.
    pub restricted_kinds: Vec<String>,
}

impl Default for MonsoonPolicy {
    fn default() -> Self {
        Self {
            months: MONSOON_MONTHS.to_vec(),
            restricted_kinds: [
                "road_excavation",
                "trenching",
                "resurfacing",
                "pipeline_replacement",
                "construction",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl MonsoonPolicy {
    pub fn is_monsoon(&self, at: DateTime<Utc>) -> bool {
        self.months.contains(&at.month())
    }

    pub fn vetoes(&self, decision: &AgentDecision, at: DateTime<Utc>) -> bool {
        self.is_monsoon(at)
            && self
                .restricted_kinds
                .iter()
                .any(|k| k.eq_ignore_ascii_case(&decision.kind))
    }
}

/// Resolves conflicts that need no judgement.
///
/// Eligible conflicts are resource, location or priority conflicts between
/// at most two departments whose combined cost is within the auto-approval
/// limit. Precedence: monsoon veto first, then emergencies, then whoever
/// decided first.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    auto_approval_cost_limit: f64,
    monsoon: MonsoonPolicy,
}

impl RuleEngine {
    pub fn new(auto_approval_cost_limit: f64, monsoon: MonsoonPolicy) -> Self {
        Self {
            auto_approval_cost_limit,
            monsoon,
        }
    }

    pub fn can_resolve_with_rules(&self, conflict: &Conflict, decisions: &[AgentDecision]) -> bool {
        let eligible_type = matches!(
            conflict.conflict_type,
            ConflictType::Resource | ConflictType::Location | ConflictType::Priority
        );
        let involved = involved(conflict, decisions);
        let departments: BTreeSet<_> = involved.iter().map(|d| d.department).collect();
        let total_cost: f64 = involved.iter().map(|d| d.estimated_cost).sum();

        eligible_type
            && !involved.is_empty()
            && departments.len() <= 2
            && total_cost <= self.auto_approval_cost_limit
    }

    /// A batch is rule-resolvable only if it has a single conflict type and
    /// every conflict qualifies on its own.
    pub fn can_resolve_all(&self, conflicts: &[Conflict], decisions: &[AgentDecision]) -> bool {
        let types: BTreeSet<_> = conflicts.iter().map(|c| c.conflict_type).collect();
        types.len() == 1
            && conflicts
                .iter()
                .all(|c| self.can_resolve_with_rules(c, decisions))
    }

    pub fn resolve_with_rules(
        &self,
        conflict: &Conflict,
        decisions: &[AgentDecision],
        now: DateTime<Utc>,
    ) -> Resolution {
        let mut involved = involved(conflict, decisions);
        involved.sort_by(|a, b| {
            b.priority
                .is_emergency()
                .cmp(&a.priority.is_emergency())
                .then(a.created_at.cmp(&b.created_at))
        });

        let (vetoed, eligible): (Vec<&AgentDecision>, Vec<&AgentDecision>) = involved
            .into_iter()
            .partition(|d| self.monsoon.vetoes(d, now));

        let mut plan = ExecutionPlan::default();
        let mut reasons = Vec::new();

        for d in &vetoed {
            plan.deferred.push(d.department.to_string());
            reasons.push(format!("{} '{}' vetoed during monsoon", d.department, d.kind));
        }

        let mut eligible = eligible.into_iter();
        if let Some(winner) = eligible.next() {
            plan.approved.push(winner.department.to_string());
            reasons.push(if winner.priority.is_emergency() {
                format!("{} proceeds as an emergency", winner.department)
            } else {
                format!("{} proceeds as the earliest decision", winner.department)
            });
        }
        for d in eligible {
            plan.deferred.push(d.department.to_string());
            reasons.push(format!("{} deferred", d.department));
        }

        let decision = if plan.approved.is_empty() {
            ResolutionDecision::Defer
        } else if plan.deferred.is_empty() {
            ResolutionDecision::ApproveAll
        } else {
            ResolutionDecision::ApprovePartial
        };

        Resolution::new(
            conflict.conflict_id,
            ResolutionMethod::Rule,
            decision,
            format!("{}: {}", conflict.conflict_type, reasons.join("; ")),
            now,
        )
        .with_confidence(1.0)
        .with_requires_human(false)
        .with_execution_plan(plan)
    }
}

fn involved<'a>(conflict: &Conflict, decisions: &'a [AgentDecision]) -> Vec<&'a AgentDecision> {
    decisions
        .iter()
        .filter(|d| conflict.decisions_involved.contains(&d.decision_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::conflict::ConflictSeverity;
    use crate::pipeline::DecisionStatus;
    use crate::request::{Department, Priority};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn decision(department: Department, kind: &str, minutes_ago: i64) -> AgentDecision {
        AgentDecision {
            decision_id: Uuid::new_v4(),
            department,
            kind: kind.to_string(),
            location: "ward-3".to_string(),
            resources: ["excavator".to_string()].into_iter().collect(),
            estimated_cost: 10_000.0,
            priority: Priority::Medium,
            exclusive_site: false,
            status: DecisionStatus::Approved,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    fn conflict_between(conflict_type: ConflictType, decisions: &[AgentDecision]) -> Conflict {
        Conflict::new(
            conflict_type,
            ConflictSeverity::High,
            "ward-3",
            decisions.iter().map(|d| d.department),
            decisions.iter().map(|d| d.decision_id),
            "test",
            Utc::now(),
        )
    }

    fn january() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()
    }

    fn july() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 15, 10, 0, 0).unwrap()
    }

    fn engine() -> RuleEngine {
        RuleEngine::new(100_000.0, MonsoonPolicy::default())
    }

    #[test]
    fn test_eligibility() {
        let decisions = vec![
            decision(Department::Water, "pipe_burst", 30),
            decision(Department::Engineering, "road_repair", 10),
        ];
        let resource = conflict_between(ConflictType::Resource, &decisions);
        assert!(engine().can_resolve_with_rules(&resource, &decisions));

        let budget = conflict_between(ConflictType::Budget, &decisions);
        assert!(!engine().can_resolve_with_rules(&budget, &decisions));

        let strict = RuleEngine::new(15_000.0, MonsoonPolicy::default());
        assert!(!strict.can_resolve_with_rules(&resource, &decisions));
    }

    #[test]
    fn test_three_departments_not_eligible() {
        let decisions = vec![
            decision(Department::Water, "pipe_burst", 30),
            decision(Department::Engineering, "road_repair", 10),
            decision(Department::Health, "outbreak", 5),
        ];
        let conflict = conflict_between(ConflictType::Location, &decisions);
        assert!(!engine().can_resolve_with_rules(&conflict, &decisions));
    }

    #[test]
    fn test_mixed_types_not_batch_resolvable() {
        let decisions = vec![
            decision(Department::Water, "pipe_burst", 30),
            decision(Department::Engineering, "road_repair", 10),
        ];
        let conflicts = vec![
            conflict_between(ConflictType::Resource, &decisions),
            conflict_between(ConflictType::Location, &decisions),
        ];
        assert!(!engine().can_resolve_all(&conflicts, &decisions));
        assert!(engine().can_resolve_all(&conflicts[..1], &decisions));
    }

    #[test]
    fn test_earlier_decision_wins() {
        let decisions = vec![
            decision(Department::Engineering, "road_repair", 10),
            decision(Department::Water, "pipe_burst", 30),
        ];
        let conflict = conflict_between(ConflictType::Resource, &decisions);
        let resolution = engine().resolve_with_rules(&conflict, &decisions, january());

        assert_eq!(resolution.method, ResolutionMethod::Rule);
        assert_eq!(resolution.decision, ResolutionDecision::ApprovePartial);
        assert_eq!(resolution.confidence, 1.0);
        assert!(!resolution.requires_human);
        assert_eq!(resolution.execution_plan.approved, vec!["water"]);
        assert_eq!(resolution.execution_plan.deferred, vec!["engineering"]);
    }

    #[test]
    fn test_emergency_outranks_earlier() {
        let mut late_emergency = decision(Department::Engineering, "road_repair", 1);
        late_emergency.priority = Priority::Critical;
        let decisions = vec![decision(Department::Water, "pipe_burst", 60), late_emergency];
        let conflict = conflict_between(ConflictType::Resource, &decisions);
        let resolution = engine().resolve_with_rules(&conflict, &decisions, january());
        assert_eq!(resolution.execution_plan.approved, vec!["engineering"]);
    }

    #[test]
    fn test_monsoon_veto() {
        let decisions = vec![
            decision(Department::Engineering, "road_excavation", 60),
            decision(Department::Water, "pipe_burst", 5),
        ];
        let conflict = conflict_between(ConflictType::Location, &decisions);

        let resolution = engine().resolve_with_rules(&conflict, &decisions, july());
        assert_eq!(resolution.execution_plan.approved, vec!["water"]);
        assert_eq!(resolution.execution_plan.deferred, vec!["engineering"]);
        assert!(resolution.rationale.contains("monsoon"));

        let dry = engine().resolve_with_rules(&conflict, &decisions, january());
        assert_eq!(dry.execution_plan.approved, vec!["engineering"]);
    }

    #[test]
    fn test_everything_vetoed_defers() {
        let decisions = vec![
            decision(Department::Engineering, "road_excavation", 60),
            decision(Department::Water, "trenching", 5),
        ];
        let conflict = conflict_between(ConflictType::Location, &decisions);
        let resolution = engine().resolve_with_rules(&conflict, &decisions, july());
        assert_eq!(resolution.decision, ResolutionDecision::Defer);
        assert!(resolution.execution_plan.approved.is_empty());
    }
}
