//! Threshold rules evaluated on attribute writes
//!
//! Host and process setters call into these before committing a new value:
//!
//! ```text
//! age    (host, process): new != previous && new > timeout            → Crossed
//! value  (host):          new != previous && new > load_average_high  → Crossed
//! status (process):       new != previous && new is not "stopped"     → Crossed
//! ```
//!
//! An unchanged value is always [`Evaluation::Unchanged`], so repeating the same write
//! never fires twice.

use serde::{Deserialize, Serialize};

/// Limits the threshold rules compare against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Seconds without a report before a host or process counts as timed out
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Load average above which a host counts as overloaded
    #[serde(default = "default_load_average_high")]
    pub load_average_high: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            load_average_high: default_load_average_high(),
        }
    }
}

fn default_timeout() -> u64 {
    600
}

fn default_load_average_high() -> f64 {
    5.0
}

/// Outcome of evaluating a single attribute write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// The new value equals the stored one
    Unchanged,
    /// The value changed but stays on the safe side of the rule
    WithinLimit,
    /// The value changed and crosses the rule, an event must be emitted
    Crossed,
}

impl Evaluation {
    pub fn fires(self) -> bool {
        self == Evaluation::Crossed
    }
}

/// Timeout rule shared by hosts and processes
pub fn evaluate_age(previous: u64, new: u64, thresholds: &Thresholds) -> Evaluation {
    if new == previous {
        return Evaluation::Unchanged;
    }

    if new > thresholds.timeout {
        Evaluation::Crossed
    } else {
        Evaluation::WithinLimit
    }
}

/// Load average rule for hosts
pub fn evaluate_load(previous: f64, new: f64, thresholds: &Thresholds) -> Evaluation {
    if new == previous {
        return Evaluation::Unchanged;
    }

    if new > thresholds.load_average_high {
        Evaluation::Crossed
    } else {
        Evaluation::WithinLimit
    }
}

/// Status rule for processes.
///
/// Fires on every change to a status other than "stopped" (compared case-insensitively),
/// and never for a change to "stopped" itself. An absent status never fires.
pub fn evaluate_status(previous: Option<&str>, new: Option<&str>) -> Evaluation {
    if new == previous {
        return Evaluation::Unchanged;
    }

    match new {
        Some(status) if !status.eq_ignore_ascii_case("stopped") => Evaluation::Crossed,
        _ => Evaluation::WithinLimit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_over_timeout_crosses() {
        let thresholds = Thresholds::default();
        assert_eq!(evaluate_age(0, 601, &thresholds), Evaluation::Crossed);
    }

    #[test]
    fn test_age_at_timeout_is_within_limit() {
        let thresholds = Thresholds::default();
        assert_eq!(evaluate_age(0, 600, &thresholds), Evaluation::WithinLimit);
    }

    #[test]
    fn test_repeated_age_is_unchanged() {
        let thresholds = Thresholds::default();
        assert_eq!(evaluate_age(601, 601, &thresholds), Evaluation::Unchanged);
    }

    #[test]
    fn test_load_over_ceiling_crosses() {
        let thresholds = Thresholds {
            timeout: 600,
            load_average_high: 2.0,
        };
        assert_eq!(evaluate_load(1.0, 2.5, &thresholds), Evaluation::Crossed);
        assert_eq!(evaluate_load(2.5, 1.5, &thresholds), Evaluation::WithinLimit);
        assert_eq!(evaluate_load(2.5, 2.5, &thresholds), Evaluation::Unchanged);
    }

    #[test]
    fn test_status_change_to_stopped_does_not_fire() {
        assert_eq!(
            evaluate_status(Some("running"), Some("STOPPED")),
            Evaluation::WithinLimit
        );
    }

    #[test]
    fn test_status_change_away_from_stopped_fires() {
        assert_eq!(
            evaluate_status(Some("stopped"), Some("running")),
            Evaluation::Crossed
        );
    }

    #[test]
    fn test_absent_status_never_fires() {
        assert_eq!(evaluate_status(Some("running"), None), Evaluation::WithinLimit);
        assert_eq!(evaluate_status(None, None), Evaluation::Unchanged);
    }
}
