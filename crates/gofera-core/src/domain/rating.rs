use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

/// One user's score for another, tied to the completed ride they shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub rater_id: Uuid,
    pub ratee_id: Uuid,
    pub ride_id: Uuid,
    pub score: u8,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(rater_id: Uuid, ratee_id: Uuid, ride_id: Uuid, score: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            rater_id,
            ratee_id,
            ride_id,
            score,
            created_at: Utc::now(),
        }
    }
}

/// Accept only whole scores in `1..=5`.
pub fn validate_score(raw: f64) -> Result<u8, DomainError> {
    let invalid = || DomainError::Validation("Please provide a valid rating between 1 and 5".into());
    if !raw.is_finite() || raw.fract() != 0.0 {
        return Err(invalid());
    }
    if raw < f64::from(MIN_SCORE) || raw > f64::from(MAX_SCORE) {
        return Err(invalid());
    }
    Ok(raw as u8)
}
