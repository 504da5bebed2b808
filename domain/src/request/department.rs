//! Municipal departments that run their own decision pipeline.

use serde::{Deserialize, Serialize};

/// A municipal department.
///
/// Each department runs the same pipeline engine with its own
/// [`RuleTable`](crate::rules::RuleTable). A department is also the unit
/// the coordination layer reasons about: its agent id is
/// `"<department>_agent"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Water,
    Fire,
    Sanitation,
    Engineering,
    Finance,
    Health,
}

impl Department {
    /// Every department, in a stable order.
    pub const ALL: [Department; 6] = [
        Department::Water,
        Department::Fire,
        Department::Sanitation,
        Department::Engineering,
        Department::Finance,
        Department::Health,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Water => "water",
            Department::Fire => "fire",
            Department::Sanitation => "sanitation",
            Department::Engineering => "engineering",
            Department::Finance => "finance",
            Department::Health => "health",
        }
    }

    /// Identifier used for this department in conflict and resolution records.
    pub fn agent_id(&self) -> String {
        format!("{}_agent", self.as_str())
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Department::Water => "Water Supply",
            Department::Fire => "Fire & Emergency Services",
            Department::Sanitation => "Sanitation",
            Department::Engineering => "Public Works Engineering",
            Department::Finance => "Finance",
            Department::Health => "Public Health",
        }
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let name = normalized.strip_suffix("_agent").unwrap_or(&normalized);
        match name {
            "water" => Ok(Department::Water),
            "fire" => Ok(Department::Fire),
            "sanitation" => Ok(Department::Sanitation),
            "engineering" | "public_works" => Ok(Department::Engineering),
            "finance" => Ok(Department::Finance),
            "health" => Ok(Department::Health),
            _ => Err(format!(
                "Unknown department: {}. Valid: water, fire, sanitation, engineering, finance, health",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_department() {
        assert_eq!("water".parse::<Department>().ok(), Some(Department::Water));
        assert_eq!("Fire_Agent".parse::<Department>().ok(), Some(Department::Fire));
        assert_eq!(
            "public_works".parse::<Department>().ok(),
            Some(Department::Engineering)
        );
        assert!("parks".parse::<Department>().is_err());
    }

    #[test]
    fn test_agent_id() {
        assert_eq!(Department::Sanitation.agent_id(), "sanitation_agent");
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Department::Health).unwrap();
        assert_eq!(json, "\"health\"");
    }
}
