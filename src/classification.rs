use serde::{Deserialize, Serialize};
use std::fmt;

pub const HIGH_PRIORITY_PCT: f64 = 15.0;
pub const MEDIUM_PRIORITY_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Favorable,
    Unfavorable,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Favorable => write!(f, "Favorable"),
            Status::Unfavorable => write!(f, "Unfavorable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

/// Status follows the sign of the raw `delta` (actual - plan), never the
/// sign of the percentage. Priority tiers are strict: exactly 15% is Medium.
pub fn classify(delta: f64, variance_pct: f64) -> (Status, Priority) {
    let status = if delta < 0.0 {
        Status::Unfavorable
    } else {
        Status::Favorable
    };

    (status, priority_for(variance_pct))
}

pub fn priority_for(variance_pct: f64) -> Priority {
    let magnitude = variance_pct.abs();
    if magnitude > HIGH_PRIORITY_PCT {
        Priority::High
    } else if magnitude > MEDIUM_PRIORITY_PCT {
        Priority::Medium
    } else {
        Priority::Low
    }
}

pub fn suggest_action(market: &str, ledger: &str, delta: f64) -> String {
    if delta < 0.0 {
        format!("Investigate {} in {}", ledger, market)
    } else {
        format!("Document success in {} — {}", ledger, market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_boundaries_are_exclusive() {
        assert_eq!(priority_for(15.0), Priority::Medium);
        assert_eq!(priority_for(15.01), Priority::High);
        assert_eq!(priority_for(10.0), Priority::Low);
        assert_eq!(priority_for(10.5), Priority::Medium);
        assert_eq!(priority_for(-20.0), Priority::High);
        assert_eq!(priority_for(0.0), Priority::Low);
    }

    #[test]
    fn test_status_follows_delta_not_percent() {
        let (status, priority) = classify(-5.0, 20.0);
        assert_eq!(status, Status::Unfavorable);
        assert_eq!(priority, Priority::High);

        let (status, _) = classify(5.0, -20.0);
        assert_eq!(status, Status::Favorable);

        let (status, _) = classify(0.0, 0.0);
        assert_eq!(status, Status::Favorable);
    }

    #[test]
    fn test_suggest_action_text() {
        assert_eq!(
            suggest_action("Europe", "SG&A - Sales", -10.0),
            "Investigate SG&A - Sales in Europe"
        );
        assert_eq!(
            suggest_action("Europe", "Revenue - Services", 10.0),
            "Document success in Revenue - Services — Europe"
        );
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(Status::Unfavorable.to_string(), "Unfavorable");
        assert_eq!(Priority::High.to_string(), "High");
    }
}
