//! Persistence layer: user settings, the base résumé singleton, the
//! most-recent tailored résumé, and the append-only history log.
//!
//! Every mutation is a single statement, so each write is atomic. History
//! appends additionally go through the coordinator task only, which keeps
//! the log single-writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::models::history::HistoryEntry;
use crate::models::resume::TailoredResume;

const KEY_PROVIDER: &str = "provider";
const KEY_API_KEY: &str = "api_key";
const KEY_MODEL: &str = "model";
const KEY_TAILOR_PROMPT: &str = "tailor_prompt";
const KEY_BASE_CV: &str = "base_cv";
const KEY_CURRENT_RESUME: &str = "current_resume";

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// User-editable provider configuration. Keys that were never saved default
/// on read; there is no migration step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub tailor_prompt: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            provider: DEFAULT_PROVIDER.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            tailor_prompt: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_value(&self, key: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM settings WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ── Settings ────────────────────────────────────────────────────────

    pub async fn settings(&self) -> Result<Settings, sqlx::Error> {
        let defaults = Settings::default();
        Ok(Settings {
            provider: self
                .get_value(KEY_PROVIDER)
                .await?
                .unwrap_or(defaults.provider),
            api_key: self
                .get_value(KEY_API_KEY)
                .await?
                .unwrap_or(defaults.api_key),
            model: self.get_value(KEY_MODEL).await?.unwrap_or(defaults.model),
            tailor_prompt: self.get_value(KEY_TAILOR_PROMPT).await?,
        })
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<(), sqlx::Error> {
        self.set_value(KEY_PROVIDER, &settings.provider).await?;
        self.set_value(KEY_API_KEY, &settings.api_key).await?;
        self.set_value(KEY_MODEL, &settings.model).await?;
        match &settings.tailor_prompt {
            Some(prompt) => self.set_value(KEY_TAILOR_PROMPT, prompt).await?,
            None => self.delete_value(KEY_TAILOR_PROMPT).await?,
        }
        Ok(())
    }

    // ── Base résumé ─────────────────────────────────────────────────────

    /// The stored base résumé text. An empty or whitespace-only value counts
    /// as absent: tailoring must fail before any network call without one.
    pub async fn base_resume(&self) -> Result<Option<String>, sqlx::Error> {
        Ok(self
            .get_value(KEY_BASE_CV)
            .await?
            .filter(|text| !text.trim().is_empty()))
    }

    pub async fn save_base_resume(&self, text: &str) -> Result<(), sqlx::Error> {
        self.set_value(KEY_BASE_CV, text).await
    }

    // ── Current résumé (legacy simple path) ─────────────────────────────

    pub async fn current_resume(&self) -> Result<Option<TailoredResume>, sqlx::Error> {
        match self.get_value(KEY_CURRENT_RESUME).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| sqlx::Error::Decode(Box::new(e))),
            None => Ok(None),
        }
    }

    pub async fn save_current_resume(&self, resume: &TailoredResume) -> Result<(), sqlx::Error> {
        let json = to_json(resume)?;
        self.set_value(KEY_CURRENT_RESUME, &json).await
    }

    // ── History ─────────────────────────────────────────────────────────

    /// Appends one entry. A single INSERT: either the full entry is written
    /// or nothing is.
    pub async fn append_history(&self, entry: &HistoryEntry) -> Result<(), sqlx::Error> {
        let cv_json = to_json(&entry.cv_data)?;
        sqlx::query(
            "INSERT INTO history (id, url, job_title, company, cv_data, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&entry.id)
        .bind(&entry.url)
        .bind(&entry.job_title)
        .bind(&entry.company)
        .bind(&cv_json)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All entries, newest first. Ids are monotonic millisecond timestamps,
    /// so id order is creation order.
    pub async fn list_history(&self) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, url, job_title, company, cv_data, created_at \
             FROM history ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(entry_from_row).collect()
    }

    pub async fn get_history(&self, id: &str) -> Result<Option<HistoryEntry>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, url, job_title, company, cv_data, created_at \
             FROM history WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(entry_from_row).transpose()
    }

    /// Explicit user edit: rename the job title and/or company of an entry.
    /// Returns false when no entry has the given id.
    pub async fn rename_history(
        &self,
        id: &str,
        job_title: Option<&str>,
        company: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE history SET \
                 job_title = COALESCE(?2, job_title), \
                 company = COALESCE(?3, company) \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(job_title)
        .bind(company)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns false when no entry has the given id.
    pub async fn delete_history(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM history WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, sqlx::Error> {
    serde_json::to_string(value).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn entry_from_row(row: SqliteRow) -> Result<HistoryEntry, sqlx::Error> {
    let cv_json: String = row.try_get("cv_data")?;
    let cv_data: TailoredResume =
        serde_json::from_str(&cv_json).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    Ok(HistoryEntry {
        id: row.try_get("id")?,
        url: row.try_get("url")?,
        job_title: row.try_get("job_title")?,
        company: row.try_get("company")?,
        cv_data,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::history::next_entry_id;
    use crate::models::resume::PersonalInfo;

    fn sample_entry(job_title: &str) -> HistoryEntry {
        HistoryEntry {
            id: next_entry_id(),
            url: "https://example.com/jobs/42".to_string(),
            job_title: job_title.to_string(),
            company: "Acme".to_string(),
            cv_data: TailoredResume {
                personal: PersonalInfo {
                    name: "Jane Doe".to_string(),
                    ..Default::default()
                },
                ..Default::default()
            },
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn settings_default_when_never_saved() {
        let store = Store::new(test_pool().await);
        let settings = store.settings().await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn settings_round_trip_and_prompt_clearing() {
        let store = Store::new(test_pool().await);
        let saved = Settings {
            provider: "anthropic".to_string(),
            api_key: "sk-secret".to_string(),
            model: "claude-sonnet-4-5".to_string(),
            tailor_prompt: Some("custom {{BASE_CV}}".to_string()),
        };
        store.save_settings(&saved).await.unwrap();
        assert_eq!(store.settings().await.unwrap(), saved);

        // Saving with no prompt clears the stored one.
        store
            .save_settings(&Settings {
                tailor_prompt: None,
                ..saved.clone()
            })
            .await
            .unwrap();
        assert_eq!(store.settings().await.unwrap().tailor_prompt, None);
    }

    #[tokio::test]
    async fn base_resume_absent_until_saved_and_blank_counts_as_absent() {
        let store = Store::new(test_pool().await);
        assert!(store.base_resume().await.unwrap().is_none());

        store.save_base_resume("   ").await.unwrap();
        assert!(store.base_resume().await.unwrap().is_none());

        store.save_base_resume("Jane Doe, engineer.").await.unwrap();
        assert_eq!(
            store.base_resume().await.unwrap().as_deref(),
            Some("Jane Doe, engineer.")
        );
    }

    #[tokio::test]
    async fn current_resume_round_trips() {
        let store = Store::new(test_pool().await);
        assert!(store.current_resume().await.unwrap().is_none());

        let resume = sample_entry("x").cv_data;
        store.save_current_resume(&resume).await.unwrap();
        assert_eq!(store.current_resume().await.unwrap(), Some(resume));
    }

    #[tokio::test]
    async fn history_appends_and_lists_newest_first() {
        let store = Store::new(test_pool().await);
        let first = sample_entry("First");
        let second = sample_entry("Second");
        store.append_history(&first).await.unwrap();
        store.append_history(&second).await.unwrap();

        let listed = store.list_history().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].job_title, "Second");
        assert_eq!(listed[1].job_title, "First");
        assert_eq!(listed[1].cv_data.personal.name, "Jane Doe");
    }

    #[tokio::test]
    async fn rename_edits_only_provided_fields() {
        let store = Store::new(test_pool().await);
        let entry = sample_entry("Old Title");
        store.append_history(&entry).await.unwrap();

        let renamed = store
            .rename_history(&entry.id, Some("New Title"), None)
            .await
            .unwrap();
        assert!(renamed);

        let fetched = store.get_history(&entry.id).await.unwrap().unwrap();
        assert_eq!(fetched.job_title, "New Title");
        assert_eq!(fetched.company, "Acme");

        assert!(!store
            .rename_history("missing", Some("x"), None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn delete_removes_the_entry() {
        let store = Store::new(test_pool().await);
        let entry = sample_entry("Doomed");
        store.append_history(&entry).await.unwrap();

        assert!(store.delete_history(&entry.id).await.unwrap());
        assert!(store.get_history(&entry.id).await.unwrap().is_none());
        assert!(!store.delete_history(&entry.id).await.unwrap());
    }
}
