//! Local SQLite job store.
//!
//! One `jobs` table keyed by `link`. Schema setup only ever adds what is
//! missing, so databases written by older crawler versions keep their rows.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{AppError, Result};
use crate::models::{JobField, JobRecord, Source};
use crate::storage::JobSink;

/// Columns every `jobs` table must carry, with their declared types.
const COLUMNS: &[(&str, &str)] = &[
    ("company", "TEXT"),
    ("role", "TEXT"),
    ("deadline", "TEXT"),
    ("link", "TEXT"),
    ("source", "TEXT"),
    ("description", "TEXT"),
    ("company_profile", "TEXT"),
    ("email", "TEXT"),
];

/// Column name used for the source by early versions of the table.
const LEGACY_SOURCE_COLUMN: &str = "tech_park";

const SELECT_RECORD: &str = "SELECT company, role, deadline, link, source, description, \
                             company_profile, email FROM jobs";

/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct LocalStore {
    conn: Arc<Mutex<Connection>>,
}

impl LocalStore {
    /// Open (or create) the database file, creating its directory if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::storage("local store lock poisoned"))
    }

    /// Create the table if missing, add missing columns, ensure the link index.
    pub fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company TEXT,
                role TEXT,
                deadline TEXT,
                link TEXT UNIQUE,
                source TEXT,
                description TEXT,
                company_profile TEXT,
                email TEXT
            );
            "#,
        )?;

        let existing = table_columns(&conn)?;
        for (name, kind) in COLUMNS {
            if !existing.iter().any(|c| c.eq_ignore_ascii_case(name)) {
                log::info!("Adding missing column jobs.{}", name);
                conn.execute_batch(&format!("ALTER TABLE jobs ADD COLUMN {name} {kind};"))?;
            }
        }

        if existing
            .iter()
            .any(|c| c.eq_ignore_ascii_case(LEGACY_SOURCE_COLUMN))
        {
            let moved = conn.execute(
                &format!(
                    "UPDATE jobs SET source = {LEGACY_SOURCE_COLUMN} \
                     WHERE (source IS NULL OR source = '') AND {LEGACY_SOURCE_COLUMN} IS NOT NULL"
                ),
                [],
            )?;
            if moved > 0 {
                log::info!("Backfilled source for {} legacy rows", moved);
            }
        }

        // Older tables may already hold duplicate links; inserts stay
        // idempotent through their own existence guard either way.
        if let Err(e) =
            conn.execute_batch("CREATE UNIQUE INDEX IF NOT EXISTS idx_jobs_link ON jobs(link);")
        {
            log::warn!("Could not create unique index on jobs.link: {}", e);
        }

        Ok(())
    }

    /// Insert records whose link is not stored yet. Returns the number inserted.
    pub fn insert_batch(&self, records: &[JobRecord]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO jobs \
                 (company, role, deadline, link, source, description, company_profile, email) \
                 SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8 \
                 WHERE NOT EXISTS (SELECT 1 FROM jobs WHERE link = ?4)",
            )?;
            for record in records {
                inserted += stmt.execute(params![
                    record.company,
                    record.role,
                    record.deadline,
                    record.link,
                    record.source.as_str(),
                    record.description,
                    record.company_profile,
                    record.email,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Set one column for the row with `link`. Returns whether a row changed.
    pub fn update_column(&self, link: &str, field: JobField, value: &str) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            &format!("UPDATE jobs SET {} = ?1 WHERE link = ?2", field.column()),
            params![value, link],
        )?;
        Ok(changed > 0)
    }

    /// Stored records with a NULL or blank email and a usable link.
    pub fn missing_email(&self) -> Result<Vec<JobRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_RECORD} WHERE (email IS NULL OR TRIM(email) = '') \
             AND link IS NOT NULL AND TRIM(link) != '' ORDER BY id"
        ))?;
        let rows = stmt.query_map([], StoredRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            let row = row?;
            match row.into_record() {
                Some(record) => records.push(record),
                None => log::warn!("Skipping stored job with unknown source"),
            }
        }
        Ok(records)
    }

    /// Stored record for `link`, if any.
    pub fn find(&self, link: &str) -> Result<Option<JobRecord>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("{SELECT_RECORD} WHERE link = ?1"),
                [link],
                StoredRow::from_row,
            )
            .optional()?;
        Ok(row.and_then(StoredRow::into_record))
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    pub fn count_missing_email(&self) -> Result<usize> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE email IS NULL OR TRIM(email) = ''",
            [],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}

fn table_columns(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("PRAGMA table_info(jobs)")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

/// A row as stored; older rows may hold NULLs anywhere.
struct StoredRow {
    company: Option<String>,
    role: Option<String>,
    deadline: Option<String>,
    link: Option<String>,
    source: Option<String>,
    description: Option<String>,
    company_profile: Option<String>,
    email: Option<String>,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            company: row.get(0)?,
            role: row.get(1)?,
            deadline: row.get(2)?,
            link: row.get(3)?,
            source: row.get(4)?,
            description: row.get(5)?,
            company_profile: row.get(6)?,
            email: row.get(7)?,
        })
    }

    fn into_record(self) -> Option<JobRecord> {
        let source: Source = self.source?.parse().ok()?;
        Some(JobRecord {
            company: self.company.unwrap_or_default(),
            role: self.role.unwrap_or_default(),
            deadline: self.deadline.unwrap_or_default(),
            link: self.link?,
            source,
            description: self.description.unwrap_or_default(),
            company_profile: self.company_profile.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl JobSink for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn insert_or_ignore(&self, records: &[JobRecord]) -> Result<usize> {
        let store = self.clone();
        let records = records.to_vec();
        off_runtime(move || store.insert_batch(&records)).await
    }

    async fn update_field(&self, link: &str, field: JobField, value: &str) -> Result<bool> {
        let store = self.clone();
        let link = link.to_string();
        let value = value.to_string();
        off_runtime(move || store.update_column(&link, field, &value)).await
    }
}

/// Run a blocking SQLite call on tokio's blocking pool.
async fn off_runtime<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::storage(format!("local store task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobDetails, JobSummary};
    use tempfile::TempDir;

    fn record(link: &str, source: Source, email: &str) -> JobRecord {
        JobRecord::from_parts(
            JobSummary {
                company: "Acme".into(),
                role: "Engineer".into(),
                deadline: "2031-01-01".into(),
                link: link.into(),
            },
            source,
            JobDetails {
                description: "Build things".into(),
                company_profile: "Company Name: Acme".into(),
                email: email.into(),
            },
        )
    }

    fn store() -> LocalStore {
        let store = LocalStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        store
    }

    #[test]
    fn test_insert_is_idempotent_by_link() {
        let store = store();
        let batch = vec![
            record("https://x/1", Source::Infopark, ""),
            record("https://x/2", Source::Technopark, "hr@x.com"),
        ];

        assert_eq!(store.insert_batch(&batch).unwrap(), 2);
        assert_eq!(store.insert_batch(&batch).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_duplicate_links_within_one_batch() {
        let store = store();
        let batch = vec![
            record("https://x/1", Source::Infopark, "first@x.com"),
            record("https://x/1", Source::Infopark, "second@x.com"),
        ];
        assert_eq!(store.insert_batch(&batch).unwrap(), 1);
        assert_eq!(
            store.find("https://x/1").unwrap().unwrap().email,
            "first@x.com"
        );
    }

    #[test]
    fn test_missing_email_and_update() {
        let store = store();
        store
            .insert_batch(&[
                record("https://x/1", Source::Infopark, ""),
                record("https://x/2", Source::Technopark, "hr@x.com"),
                record("https://x/3", Source::UlCyberpark, "   "),
            ])
            .unwrap();

        let missing: Vec<String> = store
            .missing_email()
            .unwrap()
            .into_iter()
            .map(|r| r.link)
            .collect();
        assert_eq!(missing, vec!["https://x/1", "https://x/3"]);
        assert_eq!(store.count_missing_email().unwrap(), 2);

        assert!(store
            .update_column("https://x/1", JobField::Email, "jane@acme.com")
            .unwrap());
        assert!(!store
            .update_column("https://x/404", JobField::Email, "nobody@x.com")
            .unwrap());
        assert_eq!(store.count_missing_email().unwrap(), 1);
        assert_eq!(
            store.find("https://x/1").unwrap().unwrap().email,
            "jane@acme.com"
        );
    }

    #[tokio::test]
    async fn test_sink_calls_run_on_blocking_pool() {
        let store = store();
        let sink: &dyn JobSink = &store;

        let batch = vec![record("https://x/1", Source::Technopark, "")];
        assert_eq!(sink.insert_or_ignore(&batch).await.unwrap(), 1);
        assert_eq!(sink.insert_or_ignore(&batch).await.unwrap(), 0);
        assert!(sink
            .update_field("https://x/1", JobField::Email, "hr@x.com")
            .await
            .unwrap());
        assert_eq!(store.find("https://x/1").unwrap().unwrap().email, "hr@x.com");
    }

    #[test]
    fn test_source_round_trips() {
        let store = store();
        store
            .insert_batch(&[record("https://x/ul", Source::UlCyberpark, "")])
            .unwrap();
        assert_eq!(
            store.find("https://x/ul").unwrap().unwrap().source,
            Source::UlCyberpark
        );
    }

    #[test]
    fn test_legacy_table_gains_columns_without_losing_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("jobs.db");
        {
            let store = LocalStore::open(&path).unwrap();
            let conn = store.conn().unwrap();
            conn.execute_batch(
                r#"
                CREATE TABLE jobs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    company TEXT, role TEXT, deadline TEXT, link TEXT UNIQUE,
                    tech_park TEXT, description TEXT, company_profile TEXT
                );
                INSERT INTO jobs (company, role, deadline, link, tech_park, description, company_profile)
                VALUES ('Old Co', 'Dev', '2020-01-01', 'https://old/1', 'Infopark', 'd', 'p');
                "#,
            )
            .unwrap();
        }

        let store = LocalStore::open(&path).unwrap();
        store.init_schema().unwrap();
        store.init_schema().unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let old = store.find("https://old/1").unwrap().unwrap();
        assert_eq!(old.company, "Old Co");
        assert_eq!(old.source, Source::Infopark);
        assert_eq!(old.email, "");
        assert_eq!(store.missing_email().unwrap().len(), 1);

        let columns = table_columns(&store.conn().unwrap()).unwrap();
        assert!(columns.iter().any(|c| c == "email"));
        assert!(columns.iter().any(|c| c == "source"));
    }

    #[test]
    fn test_unknown_source_rows_are_skipped_for_reconciliation() {
        let store = store();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO jobs (link, source) VALUES ('https://x/k', 'Kinfra')",
                [],
            )
            .unwrap();
        assert!(store.missing_email().unwrap().is_empty());
        assert_eq!(store.count_missing_email().unwrap(), 1);
    }
}
