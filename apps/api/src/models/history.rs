use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::resume::TailoredResume;

/// One persisted tailoring result: a job posting paired with the résumé
/// generated for it. Appended on success, edited only by explicit user
/// action, never auto-expired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub url: String,
    pub job_title: String,
    pub company: String,
    pub cv_data: TailoredResume,
    pub created_at: DateTime<Utc>,
}

static LAST_ID_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Time-derived entry id: current epoch milliseconds as a string.
///
/// Two completions inside the same millisecond would collide, so the value
/// is bumped past the previously issued id when needed.
pub fn next_entry_id() -> String {
    let now = Utc::now().timestamp_millis();
    let prev = LAST_ID_MILLIS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .expect("update closure always returns Some");
    now.max(prev + 1).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_ids_are_unique_and_increasing() {
        let a: i64 = next_entry_id().parse().unwrap();
        let b: i64 = next_entry_id().parse().unwrap();
        let c: i64 = next_entry_id().parse().unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn entry_serializes_with_nested_resume() {
        let entry = HistoryEntry {
            id: next_entry_id(),
            url: "https://example.com/jobs/1".to_string(),
            job_title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            cv_data: TailoredResume::default(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["job_title"], "Backend Engineer");
        assert!(json["cv_data"]["personal"].is_object());

        let back: HistoryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
