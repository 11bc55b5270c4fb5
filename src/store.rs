use crate::classifier::Label;
use crate::error::{ClassifyError, Result};
use chrono::{NaiveDateTime, Timelike};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// On-disk timestamp format of the `results` table.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    prediction TEXT NOT NULL,
    timestamp TEXT NOT NULL
)";

/// One persisted classification decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: i64,
    pub url: String,
    #[serde(rename = "prediction")]
    pub label: Label,
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
}

/// Append-only log of decisions, newest first on read.
///
/// A single connection guarded by a mutex serializes writers, so ids stay
/// monotonic and readers never see a half-written row.
pub struct DecisionStore {
    conn: Mutex<Connection>,
}

impl DecisionStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| ClassifyError::StoreDirectory {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        log::info!("Decision store opened at {}", path.display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(SCHEMA_SQL, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Persist a new record and return its id.
    ///
    /// Timestamps are stored with second precision; any sub-second part is dropped.
    pub fn append(&self, url: &str, label: Label, timestamp: NaiveDateTime) -> Result<i64> {
        let timestamp = truncate_to_second(timestamp);
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO results (url, prediction, timestamp) VALUES (?1, ?2, ?3)",
            params![url, label, timestamp.format(TIMESTAMP_FORMAT).to_string()],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    /// Snapshot of every record ordered by descending id.
    pub fn list_all(&self) -> Result<Vec<DecisionRecord>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT id, url, prediction, timestamp FROM results ORDER BY id DESC")?;

        let records = stmt
            .query_map([], |row| {
                let raw_timestamp: String = row.get(3)?;
                let timestamp = NaiveDateTime::parse_from_str(&raw_timestamp, TIMESTAMP_FORMAT)
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
                    })?;

                Ok(DecisionRecord {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    label: row.get(2)?,
                    timestamp,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

pub fn truncate_to_second(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp.with_nanosecond(0).unwrap_or(timestamp)
}

mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).unwrap()
    }

    #[test]
    fn test_append_and_read_back() {
        let store = DecisionStore::open_in_memory().unwrap();
        let id = store
            .append("http://test.com", Label::Phishing, ts("2024-01-01 00:00:00"))
            .unwrap();

        let records = store.list_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            DecisionRecord {
                id,
                url: "http://test.com".to_string(),
                label: Label::Phishing,
                timestamp: ts("2024-01-01 00:00:00"),
            }
        );
    }

    #[test]
    fn test_stored_columns_match_layout() {
        let store = DecisionStore::open_in_memory().unwrap();
        store
            .append("http://test.com", Label::Legitimate, ts("2024-01-01 00:00:00"))
            .unwrap();

        let conn = store.conn.lock();
        let (url, prediction, timestamp): (String, String, String) = conn
            .query_row("SELECT url, prediction, timestamp FROM results", [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .unwrap();

        assert_eq!(url, "http://test.com");
        assert_eq!(prediction, "Legitimate");
        assert_eq!(timestamp, "2024-01-01 00:00:00");
    }

    #[test]
    fn test_newest_first() {
        let store = DecisionStore::open_in_memory().unwrap();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(
                store
                    .append(&format!("http://site{i}.com"), Label::Legitimate, ts("2024-01-01 00:00:00"))
                    .unwrap(),
            );
        }

        let records = store.list_all().unwrap();
        let listed: Vec<i64> = records.iter().map(|r| r.id).collect();
        ids.reverse();
        assert_eq!(listed, ids);
        assert_eq!(records[0].url, "http://site4.com");
        assert_eq!(store.count().unwrap(), 5);
    }

    #[test]
    fn test_empty_store() {
        let store = DecisionStore::open_in_memory().unwrap();
        assert!(store.list_all().unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_reopen_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.db");

        {
            let store = DecisionStore::open(&path).unwrap();
            store
                .append("http://a.com", Label::Phishing, ts("2024-01-01 00:00:00"))
                .unwrap();
        }

        let store = DecisionStore::open(&path).unwrap();
        let id = store
            .append("http://b.com", Label::Legitimate, ts("2024-01-02 00:00:00"))
            .unwrap();

        let records = store.list_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, id);
        assert_eq!(records[1].url, "http://a.com");
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = DecisionStore::open_in_memory().unwrap();
        let first = store
            .append("http://a.com", Label::Phishing, ts("2024-01-01 00:00:00"))
            .unwrap();
        store.conn.lock().execute("DELETE FROM results", []).unwrap();

        let second = store
            .append("http://b.com", Label::Phishing, ts("2024-01-01 00:00:00"))
            .unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_corrupt_row_is_store_error() {
        let store = DecisionStore::open_in_memory().unwrap();
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO results (url, prediction, timestamp) VALUES ('http://x.com', 'Maybe', '2024-01-01 00:00:00')",
                [],
            )
            .unwrap();

        assert!(matches!(
            store.list_all(),
            Err(ClassifyError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn test_sub_second_timestamp_is_truncated() {
        let store = DecisionStore::open_in_memory().unwrap();
        let precise = NaiveDateTime::parse_from_str("2024-01-01 00:00:00.750", "%Y-%m-%d %H:%M:%S%.f")
            .unwrap();

        store.append("http://b.com", Label::Legitimate, precise).unwrap();

        let records = store.list_all().unwrap();
        assert_eq!(records[0].timestamp, ts("2024-01-01 00:00:00"));
        assert_eq!(records[0].timestamp, truncate_to_second(precise));
    }

    #[test]
    fn test_open_reports_directory_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let result = DecisionStore::open(blocker.join("results.db"));
        assert!(matches!(result, Err(ClassifyError::StoreDirectory { .. })));
    }

    #[test]
    fn test_record_json_shape() {
        let record = DecisionRecord {
            id: 7,
            url: "http://test.com".to_string(),
            label: Label::Phishing,
            timestamp: ts("2024-01-01 00:00:00"),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["prediction"], "Phishing");
        assert_eq!(json["timestamp"], "2024-01-01 00:00:00");
    }
}
