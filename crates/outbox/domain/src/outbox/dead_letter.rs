//! Dead Letter Model
//!
//! A dead letter records the last delivery failure for an outbox row.
//! One row per failed record (`outbox_id` is unique); repeat failures
//! update the row and bump `retry_count`. The existence of a dead letter
//! never blocks the source row from being marked published: a
//! dead-lettered event is handled, not queued for automatic redelivery.
//! Remediation is an operator concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetter {
    /// The originating outbox row.
    pub outbox_id: Uuid,
    /// Last failure reason.
    pub error_message: String,
    /// Total delivery attempts recorded against this row.
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeadLetter {
    /// Time since the last recorded failure.
    pub fn age_since_last_failure(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.updated_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_since_last_failure() {
        let entry = DeadLetter {
            outbox_id: Uuid::new_v4(),
            error_message: "connection refused".to_string(),
            retry_count: 1,
            created_at: Utc::now() - chrono::Duration::hours(1),
            updated_at: Utc::now() - chrono::Duration::minutes(5),
        };
        assert!(entry.age_since_last_failure().num_minutes() >= 4);
    }
}
