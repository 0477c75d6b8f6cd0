//! Reveal condition model.

use gallery_core::error::CoreError;
use gallery_core::reveal::{RevealCondition, TrackedCondition};
use gallery_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `reveal_conditions` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RevealConditionRow {
    pub id: DbId,
    pub artwork_id: DbId,
    pub condition_type: String,
    pub condition_value: serde_json::Value,
    pub is_met: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RevealConditionRow {
    /// Parse the stored type/value pair into the typed condition.
    pub fn to_condition(&self) -> Result<RevealCondition, CoreError> {
        RevealCondition::from_parts(&self.condition_type, &self.condition_value)
    }

    pub fn to_tracked(&self) -> Result<TrackedCondition, CoreError> {
        Ok(TrackedCondition {
            condition: self.to_condition()?,
            is_met: self.is_met,
        })
    }
}
