//! Reveal-condition evaluation.
//!
//! An artwork stays hidden until its reveal conditions are satisfied. Each
//! condition is one variant of the closed [`RevealCondition`] sum type and is
//! checked against a snapshot of the artwork's [`ArtworkMetrics`]. How several
//! conditions combine is decided by the configured [`RevealPolicy`].
//!
//! Everything here is a pure predicate. Persisting the transition and firing
//! notifications is the caller's job, guarded by [`RevealState`] so a revealed
//! artwork never transitions twice.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Stored `condition_type` for time-based conditions.
pub const CONDITION_TIME: &str = "time";
/// Stored `condition_type` for view-count conditions.
pub const CONDITION_VIEW_COUNT: &str = "view_count";
/// Stored `condition_type` for comment-count (interactive) conditions.
pub const CONDITION_INTERACTIVE: &str = "interactive";

/// JSON key holding the reveal timestamp of a time condition.
const KEY_REVEAL_AT: &str = "reveal_at";
/// JSON key holding the view threshold of a view-count condition.
const KEY_COUNT: &str = "count";
/// JSON key holding the comment threshold of an interactive condition.
const KEY_COMMENT_COUNT: &str = "comment_count";

/// Reveal times must fall in years Postgres `timestamptz` and RFC 3339 can
/// both represent, so the stored value always parses back.
const REVEAL_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

// ---------------------------------------------------------------------------
// RevealCondition
// ---------------------------------------------------------------------------

/// A rule specifying when a hidden artwork becomes visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealCondition {
    /// Revealed once the wall clock reaches `reveal_at`.
    Time { reveal_at: Timestamp },
    /// Revealed once the artwork has been viewed `count` times.
    ViewCount { count: i64 },
    /// Revealed once the artwork has received `comment_count` comments.
    Interactive { comment_count: i64 },
}

impl RevealCondition {
    /// Parse a condition from its stored `(condition_type, condition_value)`
    /// pair.
    ///
    /// This is the creation-time validation boundary: unknown types, missing
    /// keys, unparseable or out-of-range timestamps and non-positive
    /// thresholds are rejected
    /// with [`CoreError::Validation`]. A `condition_value` given as a JSON
    /// string (as multipart form clients send it) is decoded first.
    pub fn from_parts(condition_type: &str, condition_value: &Value) -> Result<Self, CoreError> {
        let decoded;
        let value = match condition_value {
            Value::String(raw) => {
                decoded = serde_json::from_str::<Value>(raw).map_err(|e| {
                    CoreError::Validation(format!("condition_value is not valid JSON: {e}"))
                })?;
                &decoded
            }
            other => other,
        };

        match condition_type {
            CONDITION_TIME => {
                let raw = value
                    .get(KEY_REVEAL_AT)
                    .and_then(Value::as_str)
                    .ok_or_else(|| missing_key(CONDITION_TIME, KEY_REVEAL_AT))?;
                Ok(Self::Time {
                    reveal_at: parse_timestamp(raw)?,
                })
            }
            CONDITION_VIEW_COUNT => Ok(Self::ViewCount {
                count: parse_threshold(value, CONDITION_VIEW_COUNT, KEY_COUNT)?,
            }),
            CONDITION_INTERACTIVE => Ok(Self::Interactive {
                comment_count: parse_threshold(value, CONDITION_INTERACTIVE, KEY_COMMENT_COUNT)?,
            }),
            other => Err(CoreError::Validation(format!(
                "Unknown condition_type '{other}'. Expected one of: \
                 {CONDITION_TIME}, {CONDITION_VIEW_COUNT}, {CONDITION_INTERACTIVE}"
            ))),
        }
    }

    /// The stored `condition_type` tag for this variant.
    pub fn condition_type(&self) -> &'static str {
        match self {
            Self::Time { .. } => CONDITION_TIME,
            Self::ViewCount { .. } => CONDITION_VIEW_COUNT,
            Self::Interactive { .. } => CONDITION_INTERACTIVE,
        }
    }

    /// The stored `condition_value` JSON for this variant.
    pub fn condition_value(&self) -> Value {
        match self {
            Self::Time { reveal_at } => json!({ "reveal_at": reveal_at.to_rfc3339() }),
            Self::ViewCount { count } => json!({ "count": count }),
            Self::Interactive { comment_count } => json!({ "comment_count": comment_count }),
        }
    }

    /// Shorthand for [`evaluate`] with this condition.
    pub fn is_satisfied(&self, metrics: &ArtworkMetrics) -> bool {
        evaluate(metrics, self)
    }
}

/// Request payload shape for one reveal condition.
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionInput {
    pub condition_type: String,
    pub condition_value: Value,
}

impl ConditionInput {
    /// Validate this payload into a typed [`RevealCondition`].
    pub fn parse(&self) -> Result<RevealCondition, CoreError> {
        RevealCondition::from_parts(&self.condition_type, &self.condition_value)
    }
}

fn missing_key(condition_type: &str, key: &str) -> CoreError {
    CoreError::Validation(format!(
        "{condition_type} condition requires a '{key}' value"
    ))
}

/// Accept RFC 3339 timestamps, or naive ISO-8601 timestamps interpreted as UTC.
///
/// The UTC year must lie in [`REVEAL_YEARS`]; the naive parser alone would
/// take signed or five-digit years.
fn parse_timestamp(raw: &str) -> Result<Timestamp, CoreError> {
    let parsed = match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(_) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|_| {
                CoreError::Validation(format!(
                    "{KEY_REVEAL_AT} must be an ISO-8601 timestamp, got '{raw}'"
                ))
            })?,
    };
    if !REVEAL_YEARS.contains(&parsed.year()) {
        return Err(CoreError::Validation(format!(
            "{KEY_REVEAL_AT} year must be between {} and {}, got '{raw}'",
            REVEAL_YEARS.start(),
            REVEAL_YEARS.end()
        )));
    }
    Ok(parsed)
}

/// Thresholds may arrive as JSON numbers or numeric strings; both must be > 0.
fn parse_threshold(value: &Value, condition_type: &str, key: &str) -> Result<i64, CoreError> {
    let raw = value
        .get(key)
        .ok_or_else(|| missing_key(condition_type, key))?;
    let threshold = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        CoreError::Validation(format!("{condition_type}.{key} must be an integer"))
    })?;

    if threshold <= 0 {
        return Err(CoreError::Validation(format!(
            "{condition_type}.{key} must be greater than zero, got {threshold}"
        )));
    }
    Ok(threshold)
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Snapshot of the metrics a reveal decision is made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtworkMetrics {
    pub view_count: i64,
    pub comment_count: i64,
    pub now: Timestamp,
}

/// Decide whether a single condition is satisfied by `metrics`.
pub fn evaluate(metrics: &ArtworkMetrics, condition: &RevealCondition) -> bool {
    match *condition {
        RevealCondition::Time { reveal_at } => metrics.now >= reveal_at,
        RevealCondition::ViewCount { count } => metrics.view_count >= count,
        RevealCondition::Interactive { comment_count } => metrics.comment_count >= comment_count,
    }
}

/// A condition together with whether it was previously recorded as met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedCondition {
    pub condition: RevealCondition,
    pub is_met: bool,
}

impl TrackedCondition {
    /// Met earlier, or satisfied right now.
    pub fn holds(&self, metrics: &ArtworkMetrics) -> bool {
        self.is_met || evaluate(metrics, &self.condition)
    }
}

/// How multiple conditions on one artwork combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RevealPolicy {
    /// Every condition must hold.
    All,
    /// One satisfied condition is enough.
    #[default]
    Any,
}

impl RevealPolicy {
    /// Decide whether the artwork should be revealed.
    ///
    /// An artwork without conditions is never revealed automatically.
    pub fn is_satisfied(self, metrics: &ArtworkMetrics, conditions: &[TrackedCondition]) -> bool {
        if conditions.is_empty() {
            return false;
        }
        match self {
            Self::All => conditions.iter().all(|c| c.holds(metrics)),
            Self::Any => conditions.iter().any(|c| c.holds(metrics)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for RevealPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevealPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            other => Err(CoreError::Validation(format!(
                "Unknown reveal policy '{other}'. Expected 'all' or 'any'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// RevealState
// ---------------------------------------------------------------------------

/// Per-artwork reveal state machine. `Revealed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Hidden,
    Revealed,
}

impl RevealState {
    pub fn from_flag(is_revealed: bool) -> Self {
        if is_revealed {
            Self::Revealed
        } else {
            Self::Hidden
        }
    }

    pub fn is_revealed(self) -> bool {
        self == Self::Revealed
    }

    /// Apply an evaluation result.
    ///
    /// Returns the next state and `true` only for the Hidden → Revealed
    /// transition, which is the single point where a reveal notification may
    /// fire.
    pub fn advance(self, satisfied: bool) -> (Self, bool) {
        match (self, satisfied) {
            (Self::Hidden, true) => (Self::Revealed, true),
            (state, _) => (state, false),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
