//! Request priority.

use serde::{Deserialize, Serialize};

/// Urgency of a request.
///
/// Ordered from least to most urgent. `critical` is what the coordination
/// rules treat as an emergency; `"emergency"` is accepted as an alias.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    #[serde(alias = "emergency")]
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    /// Whether this priority outranks ordinary work in conflict resolution.
    pub fn is_emergency(&self) -> bool {
        matches!(self, Priority::Critical)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "normal" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" | "emergency" => Ok(Priority::Critical),
            _ => Err(format!(
                "Unknown priority: {}. Valid: low, medium, high, critical",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_emergency_alias() {
        let p: Priority = serde_json::from_str("\"emergency\"").unwrap();
        assert_eq!(p, Priority::Critical);
        assert_eq!("Emergency".parse::<Priority>().ok(), Some(Priority::Critical));
        assert!(p.is_emergency());
    }

    #[test]
    fn test_default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }
}
