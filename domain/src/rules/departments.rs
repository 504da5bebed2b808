//! Built-in rule tables for each municipal department.
//!
//! Fact names used here are what the department data adapters report;
//! `*_required` and `policy_*` facts may also come from the request
//! payload.

use super::check::{FactRule, NamedCheck};
use super::risk::RiskLevel;
use super::rule_table::{GENERAL_INTENT, IntentProfile, PlanTemplate, RuleTable};
use crate::request::Department;
use serde_json::json;

/// Months (1-12) during which excavation-type work is suspended.
pub const MONSOON_MONTHS: [u32; 4] = [6, 7, 8, 9];

/// The built-in table for `department`.
pub fn builtin(department: Department) -> RuleTable {
    match department {
        Department::Water => water(),
        Department::Fire => fire(),
        Department::Sanitation => sanitation(),
        Department::Engineering => engineering(),
        Department::Finance => finance(),
        Department::Health => health(),
    }
}

/// Built-in tables for every department.
pub fn all() -> Vec<RuleTable> {
    Department::ALL.iter().map(|d| builtin(*d)).collect()
}

// ==================== Check Helpers ====================

fn min(name: &str, fact: &str, min: f64) -> NamedCheck {
    NamedCheck::new(
        name,
        FactRule::Min {
            fact: fact.to_string(),
            min,
        },
    )
}

fn max(name: &str, fact: &str, max: f64) -> NamedCheck {
    NamedCheck::new(
        name,
        FactRule::Max {
            fact: fact.to_string(),
            max,
        },
    )
}

fn at_least(name: &str, fact: &str, reference: &str) -> NamedCheck {
    NamedCheck::new(
        name,
        FactRule::AtLeastFact {
            fact: fact.to_string(),
            reference: reference.to_string(),
        },
    )
}

fn at_most(name: &str, fact: &str, reference: &str) -> NamedCheck {
    NamedCheck::new(
        name,
        FactRule::AtMostFact {
            fact: fact.to_string(),
            reference: reference.to_string(),
        },
    )
}

fn flag(name: &str, fact: &str) -> NamedCheck {
    NamedCheck::new(
        name,
        FactRule::Flag {
            fact: fact.to_string(),
            expected: true,
        },
    )
}

fn budget(name: &str, fact: &str) -> NamedCheck {
    NamedCheck::new(
        name,
        FactRule::BudgetCoversCost {
            fact: fact.to_string(),
        },
    )
}

fn cost_cap(name: &str, limit: f64) -> NamedCheck {
    NamedCheck::new(name, FactRule::CostAtMost { max: limit })
}

/// Generic rule-set: resource availability and budget availability.
fn general_profile() -> IntentProfile {
    IntentProfile::new(GENERAL_INTENT, "Resolve {kind} at {location}")
        .risk(RiskLevel::Medium)
        .feasibility(min("resource_availability", "resources_available", 1.0))
        .feasibility(budget("budget_availability", "budget_available"))
        .policy(NamedCheck::new("resources_declared", FactRule::ResourcesDeclared))
        .template(
            PlanTemplate::new("standard_response")
                .step("check_resource_availability", json!({"location": "{location}"}))
                .step("check_budget", json!({}))
                .with_rationale("Handle with the department's standing resources"),
        )
        .template(
            PlanTemplate::new("next_shift_response")
                .step(
                    "check_resource_availability",
                    json!({"location": "{location}", "window": "next_shift"}),
                )
                .step("check_budget", json!({}))
                .with_rationale("Defer to the next shift when current resources are committed"),
        )
}

// ==================== Departments ====================

pub fn water() -> RuleTable {
    RuleTable::new(Department::Water, general_profile())
        .with_intent(
            IntentProfile::new("pipeline_repair", "Restore safe water supply at {location}")
                .kinds(["pipe_burst", "leak_repair", "water_main_break"])
                .risk(RiskLevel::Medium)
                .feasibility(at_least("crew_availability", "crews_available", "crews_required"))
                .feasibility(flag("pipeline_repairable", "pipeline_repairable"))
                .feasibility(budget("budget_availability", "budget_available"))
                .policy(at_most("outage_window", "estimated_outage_hours", "max_outage_hours"))
                .policy(flag("excavation_permit", "excavation_permit").blocking())
                .template(
                    PlanTemplate::new("in_house_repair")
                        .step("check_crew_availability", json!({"location": "{location}"}))
                        .step("check_pipeline_condition", json!({"location": "{location}"}))
                        .step("check_budget", json!({}))
                        .exclusive()
                        .with_rationale("Municipal crew excavates and replaces the section"),
                )
                .template(
                    PlanTemplate::new("contractor_repair")
                        .step("check_contractor_availability", json!({"location": "{location}"}))
                        .step("check_pipeline_condition", json!({"location": "{location}"}))
                        .step("check_budget", json!({}))
                        .with_resources(["contractor_crew", "excavator"])
                        .with_cost_factor(1.35)
                        .exclusive()
                        .with_rationale("Empanelled contractor when municipal crews are committed"),
                ),
        )
        .with_intent(
            IntentProfile::new("supply_scheduling", "Maintain water supply to {location}")
                .kinds(["supply_schedule", "tanker_supply", "water_shortage", "low_pressure"])
                .feasibility(at_least("tanker_availability", "tankers_available", "tankers_required"))
                .feasibility(min("reservoir_level", "reservoir_level_pct", 20.0))
                .policy(at_most("supply_delay", "estimated_delay_days", "policy_max_delay"))
                .template(
                    PlanTemplate::new("tanker_dispatch")
                        .step("check_tanker_availability", json!({"location": "{location}"}))
                        .step("check_reservoir_level", json!({}))
                        .step("check_budget", json!({})),
                )
                .template(
                    PlanTemplate::new("private_tanker_dispatch")
                        .step("check_private_tanker_availability", json!({"location": "{location}"}))
                        .step("check_reservoir_level", json!({}))
                        .step("check_budget", json!({}))
                        .with_resources(["private_tanker"])
                        .with_cost_factor(1.2),
                ),
        )
}

pub fn fire() -> RuleTable {
    RuleTable::new(Department::Fire, general_profile())
        .with_intent(
            IntentProfile::new("emergency_response", "Contain the emergency at {location}")
                .kinds(["fire", "fire_emergency", "building_fire", "rescue", "hazmat"])
                .risk(RiskLevel::High)
                .feasibility(at_least("truck_availability", "trucks_available", "trucks_required"))
                .feasibility(min("hydrant_pressure", "water_pressure_psi", 40.0))
                .policy(at_most("response_time", "response_time_minutes", "max_response_minutes"))
                .template(
                    PlanTemplate::new("station_dispatch")
                        .step("check_fire_truck_availability", json!({"location": "{location}"}))
                        .step("check_hydrant_pressure", json!({"location": "{location}"}))
                        .step("check_response_time", json!({"location": "{location}"})),
                )
                .template(
                    PlanTemplate::new("mutual_aid_dispatch")
                        .step("check_mutual_aid_availability", json!({"location": "{location}"}))
                        .step("check_hydrant_pressure", json!({"location": "{location}"}))
                        .step("check_response_time", json!({"location": "{location}"}))
                        .with_resources(["mutual_aid_engine"]),
                ),
        )
        .with_intent(
            IntentProfile::new("safety_inspection", "Complete fire safety inspection at {location}")
                .kinds(["fire_inspection", "fire_drill", "noc_inspection"])
                .feasibility(min("inspector_availability", "inspectors_available", 1.0))
                .policy(flag("building_access", "building_accessible"))
                .template(
                    PlanTemplate::new("scheduled_inspection")
                        .step("check_inspector_availability", json!({"week": "current"}))
                        .step("check_building_access", json!({"location": "{location}"})),
                )
                .template(
                    PlanTemplate::new("next_week_inspection")
                        .step("check_inspector_availability", json!({"week": "next"}))
                        .step("check_building_access", json!({"location": "{location}"})),
                ),
        )
}

pub fn sanitation() -> RuleTable {
    RuleTable::new(Department::Sanitation, general_profile())
        .with_intent(
            IntentProfile::new("waste_collection", "Clear waste at {location}")
                .kinds(["garbage_collection", "waste_pickup", "missed_collection", "bulk_waste"])
                .feasibility(at_least("truck_availability", "trucks_available", "trucks_required"))
                .feasibility(max("landfill_capacity", "landfill_capacity_pct", 95.0))
                .policy(at_most("collection_delay", "estimated_delay_days", "policy_max_delay"))
                .template(
                    PlanTemplate::new("scheduled_route")
                        .step("check_truck_availability", json!({"location": "{location}"}))
                        .step("check_landfill_capacity", json!({})),
                )
                .template(
                    PlanTemplate::new("reserve_fleet")
                        .step("check_reserve_truck_availability", json!({"location": "{location}"}))
                        .step("check_landfill_capacity", json!({}))
                        .with_resources(["reserve_truck"])
                        .with_cost_factor(1.1),
                )
                .template(
                    PlanTemplate::new("contractor_pickup")
                        .step("check_contractor_trucks", json!({"location": "{location}"}))
                        .step("check_landfill_capacity", json!({}))
                        .with_resources(["contract_truck"])
                        .with_cost_factor(1.4),
                ),
        )
        .with_intent(
            IntentProfile::new("drain_cleaning", "Restore drainage at {location}")
                .kinds(["sewer_blockage", "desilting", "waterlogging"])
                .risk(RiskLevel::Medium)
                .feasibility(min("crew_availability", "crews_available", 1.0))
                .feasibility(flag("equipment_operational", "equipment_operational"))
                .feasibility(budget("budget_availability", "budget_available"))
                .policy(NamedCheck::new("resources_declared", FactRule::ResourcesDeclared))
                .template(
                    PlanTemplate::new("jetting_crew")
                        .step("check_crew_availability", json!({"location": "{location}"}))
                        .step("check_equipment_status", json!({"equipment": "jetting_machine"}))
                        .step("check_budget", json!({})),
                )
                .template(
                    PlanTemplate::new("manual_desilting")
                        .step("check_crew_availability", json!({"location": "{location}", "mode": "manual"}))
                        .step("check_equipment_status", json!({"equipment": "hand_tools"}))
                        .step("check_budget", json!({}))
                        .with_cost_factor(0.8),
                ),
        )
}

pub fn engineering() -> RuleTable {
    RuleTable::new(Department::Engineering, general_profile())
        .with_intent(
            IntentProfile::new("road_works", "Repair the road surface at {location}")
                .kinds(["road_repair", "road_excavation", "pothole_repair", "resurfacing", "trenching"])
                .risk(RiskLevel::Medium)
                .feasibility(min("crew_availability", "crews_available", 1.0))
                .feasibility(at_least("material_stock", "asphalt_tonnes_available", "asphalt_tonnes_required"))
                .feasibility(budget("budget_availability", "budget_available"))
                .policy(
                    NamedCheck::new(
                        "monsoon_restriction",
                        FactRule::NotDuringMonths {
                            months: MONSOON_MONTHS.to_vec(),
                        },
                    )
                    .blocking(),
                )
                .policy(flag("traffic_plan", "traffic_plan_approved"))
                .template(
                    PlanTemplate::new("day_shift_paving")
                        .step("check_crew_availability", json!({"location": "{location}"}))
                        .step("check_material_stock", json!({"material": "asphalt"}))
                        .step("check_budget", json!({}))
                        .exclusive(),
                )
                .template(
                    PlanTemplate::new("night_shift_paving")
                        .step("check_crew_availability", json!({"location": "{location}", "shift": "night"}))
                        .step("check_material_stock", json!({"material": "asphalt"}))
                        .step("check_budget", json!({}))
                        .with_cost_factor(1.15)
                        .exclusive(),
                ),
        )
        .with_intent(
            IntentProfile::new("structural_assessment", "Assess structural safety at {location}")
                .kinds(["bridge_inspection", "building_collapse", "wall_crack"])
                .risk(RiskLevel::High)
                .feasibility(min("engineer_availability", "engineers_available", 1.0))
                .policy(cost_cap("assessment_cost_cap", 250_000.0))
                .template(
                    PlanTemplate::new("field_assessment")
                        .step("check_engineer_availability", json!({}))
                        .step("check_site_access", json!({"location": "{location}"})),
                ),
        )
}

pub fn finance() -> RuleTable {
    RuleTable::new(Department::Finance, general_profile())
        .with_intent(
            IntentProfile::new("budget_allocation", "Release funds for {kind} at {location}")
                .kinds(["fund_release", "emergency_fund", "reallocation"])
                .risk(RiskLevel::Medium)
                .feasibility(budget("fund_balance", "fund_balance"))
                .policy(cost_cap("single_release_limit", 500_000.0).blocking())
                .policy(flag("audit_clearance", "audit_cleared").blocking())
                .template(
                    PlanTemplate::new("ledger_release")
                        .step("check_fund_balance", json!({"fund": "general"}))
                        .step("check_audit_status", json!({})),
                )
                .template(
                    PlanTemplate::new("contingency_release")
                        .step("check_fund_balance", json!({"fund": "contingency"}))
                        .step("check_audit_status", json!({})),
                ),
        )
        .with_intent(
            IntentProfile::new("procurement", "Procure {kind} for {location}")
                .kinds(["tender", "purchase_order"])
                .risk(RiskLevel::Medium)
                .feasibility(min("vendor_availability", "vendors_available", 1.0))
                .feasibility(budget("budget_availability", "budget_available"))
                .policy(min("competitive_bids", "bids_received", 3.0))
                .template(
                    PlanTemplate::new("open_tender")
                        .step("check_vendor_registry", json!({}))
                        .step("check_budget", json!({}))
                        .step("check_bids", json!({})),
                ),
        )
}

pub fn health() -> RuleTable {
    RuleTable::new(Department::Health, general_profile())
        .with_intent(
            IntentProfile::new("outbreak_response", "Contain the health risk at {location}")
                .kinds(["outbreak", "disease_outbreak", "vector_control", "contamination"])
                .risk(RiskLevel::High)
                .feasibility(min("staff_availability", "medical_staff_available", 1.0))
                .feasibility(at_least("vaccine_stock", "vaccine_stock", "doses_required"))
                .policy(flag("authority_notified", "authority_notified"))
                .template(
                    PlanTemplate::new("rapid_response_team")
                        .step("check_staff_availability", json!({"location": "{location}"}))
                        .step("check_vaccine_stock", json!({}))
                        .step("check_notification_status", json!({})),
                )
                .template(
                    PlanTemplate::new("district_support")
                        .step("check_district_staff", json!({"location": "{location}"}))
                        .step("check_vaccine_stock", json!({"source": "district"}))
                        .step("check_notification_status", json!({}))
                        .with_resources(["district_medical_team"]),
                ),
        )
        .with_intent(
            IntentProfile::new("health_camp", "Run {kind} at {location}")
                .kinds(["vaccination_drive", "clinic_support"])
                .feasibility(min("staff_availability", "medical_staff_available", 1.0))
                .feasibility(budget("budget_availability", "budget_available"))
                .policy(at_most("camp_delay", "estimated_delay_days", "policy_max_delay"))
                .template(
                    PlanTemplate::new("mobile_clinic")
                        .step("check_staff_availability", json!({"location": "{location}"}))
                        .step("check_budget", json!({})),
                ),
        )
}
