//! View-count milestones that trigger artist-facing notifications.
//!
//! Milestones bound notification volume: a view only produces a
//! `view_milestone` event when the new count lands exactly on a configured
//! checkpoint. Counts are incremented atomically, so every count is observed
//! by exactly one request.

use std::str::FromStr;

use crate::error::CoreError;

/// Default milestone checkpoints.
pub const DEFAULT_VIEW_MILESTONES: [i64; 5] = [10, 50, 100, 500, 1000];

/// Sorted, de-duplicated set of view-count checkpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMilestones {
    thresholds: Vec<i64>,
}

impl ViewMilestones {
    /// Build a milestone set. Non-positive values are rejected.
    pub fn new(mut thresholds: Vec<i64>) -> Result<Self, CoreError> {
        if let Some(bad) = thresholds.iter().find(|t| **t <= 0) {
            return Err(CoreError::Validation(format!(
                "View milestones must be positive, got {bad}"
            )));
        }
        thresholds.sort_unstable();
        thresholds.dedup();
        Ok(Self { thresholds })
    }

    /// Whether `view_count` is exactly one of the checkpoints.
    pub fn is_milestone(&self, view_count: i64) -> bool {
        self.thresholds.binary_search(&view_count).is_ok()
    }

    pub fn thresholds(&self) -> &[i64] {
        &self.thresholds
    }
}

impl Default for ViewMilestones {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_VIEW_MILESTONES.to_vec(),
        }
    }
}

/// Parse a comma-separated list such as `"10,50,100"`.
impl FromStr for ViewMilestones {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let thresholds = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i64>().map_err(|_| {
                    CoreError::Validation(format!("Invalid view milestone '{part}'"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(thresholds)
    }
}
