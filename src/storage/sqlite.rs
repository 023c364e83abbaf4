//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the JobStore trait.

use crate::crawler::CrawlResult;
use crate::state::JobStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{JobStore, StorageError, StorageResult};
use crate::storage::{BrokenLinkRecord, JobPage, JobRecord, ListQuery};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// Columns selected for every job row, in `job_from_row` order
const JOB_COLUMNS: &str = "id, address, status, html_version, title,
    h1_count, h2_count, h3_count, h4_count, h5_count, h6_count,
    internal_links, external_links, broken_links, has_login_form,
    error_message, created_at, updated_at";

/// Fixed-width UTC form used for leases, so stored values compare as text
fn lease_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// SQLite job store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        Ok(Self {
            conn: init_database(path)?,
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn current_status(&self, job_id: i64) -> StorageResult<JobStatus> {
        let status: Option<String> = self
            .conn
            .query_row(
                "SELECT status FROM jobs WHERE id = ?1",
                params![job_id],
                |row| row.get(0),
            )
            .optional()?;

        let status = status.ok_or(StorageError::JobNotFound(job_id))?;
        JobStatus::from_db_string(&status).ok_or_else(|| {
            StorageError::Database(format!("Unknown status '{}' on job {}", status, job_id))
        })
    }

    fn ensure_transition(&self, job_id: i64, to: JobStatus) -> StorageResult<()> {
        let from = self.current_status(job_id)?;
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(StorageError::InvalidTransition { from, to })
        }
    }

    fn load_broken_links(&self, job_id: i64) -> StorageResult<Vec<BrokenLinkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, job_id, url, status_code FROM broken_links
             WHERE job_id = ?1 ORDER BY position",
        )?;

        let links = stmt
            .query_map(params![job_id], |row| {
                Ok(BrokenLinkRecord {
                    id: row.get(0)?,
                    job_id: row.get(1)?,
                    url: row.get(2)?,
                    status_code: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<JobRecord> {
    Ok(JobRecord {
        id: row.get(0)?,
        address: row.get(1)?,
        status: JobStatus::from_db_string(&row.get::<_, String>(2)?).unwrap_or(JobStatus::Error),
        html_version: row.get(3)?,
        title: row.get(4)?,
        h1_count: row.get(5)?,
        h2_count: row.get(6)?,
        h3_count: row.get(7)?,
        h4_count: row.get(8)?,
        h5_count: row.get(9)?,
        h6_count: row.get(10)?,
        internal_links: row.get(11)?,
        external_links: row.get(12)?,
        broken_links: row.get(13)?,
        has_login_form: row.get(14)?,
        error_message: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
        broken_link_details: Vec::new(),
    })
}

fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl JobStore for SqliteStore {
    // ===== Job Lifecycle =====

    fn create_job(&mut self, address: &str) -> StorageResult<JobRecord> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO jobs (address, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![address, JobStatus::Queued.to_db_string(), now],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    let message = format!("A job for {} already exists", address);
                    StorageError::ConstraintViolation(message)
                } else {
                    StorageError::Sqlite(e)
                }
            })?;

        self.get_job(self.conn.last_insert_rowid())
    }

    fn get_job(&self, job_id: i64) -> StorageResult<JobRecord> {
        let mut job = self
            .conn
            .query_row(
                &format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS),
                params![job_id],
                job_from_row,
            )
            .optional()?
            .ok_or(StorageError::JobNotFound(job_id))?;

        job.broken_link_details = self.load_broken_links(job_id)?;
        Ok(job)
    }

    fn get_job_by_address(&self, address: &str) -> StorageResult<Option<JobRecord>> {
        let job = self
            .conn
            .query_row(
                &format!("SELECT {} FROM jobs WHERE address = ?1", JOB_COLUMNS),
                params![address],
                job_from_row,
            )
            .optional()?;

        match job {
            Some(mut job) => {
                job.broken_link_details = self.load_broken_links(job.id)?;
                Ok(Some(job))
            }
            None => Ok(None),
        }
    }

    fn list_jobs(&self, query: &ListQuery) -> StorageResult<JobPage> {
        let page = query.effective_page();
        let limit = query.effective_limit();
        let status = query.status.map(|s| s.to_db_string());

        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE (?1 IS NULL OR status = ?1)",
            params![status],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM jobs WHERE (?1 IS NULL OR status = ?1)
             ORDER BY {} {}, id {} LIMIT ?2 OFFSET ?3",
            JOB_COLUMNS,
            query.sort_by.column(),
            query.order.keyword(),
            query.order.keyword()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let jobs = stmt
            .query_map(params![status, limit, query.offset() as i64], job_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(JobPage::new(jobs, total as u64, page, limit))
    }

    fn update_status(&mut self, job_id: i64, status: JobStatus) -> StorageResult<()> {
        self.ensure_transition(job_id, status)?;

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE jobs SET status = ?1, lease_expires_at = NULL, updated_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, job_id],
        )?;
        Ok(())
    }

    fn claim_job(&mut self, job_id: i64, lease_until: DateTime<Utc>) -> StorageResult<()> {
        self.ensure_transition(job_id, JobStatus::Running)?;

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE jobs SET status = ?1, lease_expires_at = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                JobStatus::Running.to_db_string(),
                lease_timestamp(lease_until),
                now,
                job_id
            ],
        )?;
        Ok(())
    }

    fn renew_lease(&mut self, job_id: i64, lease_until: DateTime<Utc>) -> StorageResult<bool> {
        let renewed = self.conn.execute(
            "UPDATE jobs SET lease_expires_at = ?1 WHERE id = ?2 AND status = ?3",
            params![
                lease_timestamp(lease_until),
                job_id,
                JobStatus::Running.to_db_string()
            ],
        )?;
        Ok(renewed > 0)
    }

    fn record_result(&mut self, job_id: i64, result: &CrawlResult) -> StorageResult<()> {
        self.ensure_transition(job_id, JobStatus::Done)?;

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        tx.execute(
            "UPDATE jobs SET status = ?1, html_version = ?2, title = ?3,
             h1_count = ?4, h2_count = ?5, h3_count = ?6,
             h4_count = ?7, h5_count = ?8, h6_count = ?9,
             internal_links = ?10, external_links = ?11, broken_links = ?12, has_login_form = ?13,
             error_message = NULL, lease_expires_at = NULL, updated_at = ?14
             WHERE id = ?15",
            params![
                JobStatus::Done.to_db_string(),
                result.html_version,
                result.title,
                result.h1_count,
                result.h2_count,
                result.h3_count,
                result.h4_count,
                result.h5_count,
                result.h6_count,
                result.internal_links,
                result.external_links,
                result.broken_links,
                result.has_login_form,
                now,
                job_id
            ],
        )?;

        tx.execute("DELETE FROM broken_links WHERE job_id = ?1", params![job_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO broken_links (job_id, position, url, status_code)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, entry) in result.broken_link_details.iter().enumerate() {
                stmt.execute(params![job_id, position as i64, entry.url, entry.status_code])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn record_failure(&mut self, job_id: i64, message: &str) -> StorageResult<()> {
        self.ensure_transition(job_id, JobStatus::Error)?;

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE jobs SET status = ?1, error_message = ?2, lease_expires_at = NULL,
             updated_at = ?3 WHERE id = ?4",
            params![JobStatus::Error.to_db_string(), message, now, job_id],
        )?;
        Ok(())
    }

    fn reset_job(&mut self, job_id: i64) -> StorageResult<JobRecord> {
        let from = self.current_status(job_id)?;
        if from == JobStatus::Running {
            return Err(StorageError::InvalidTransition {
                from,
                to: JobStatus::Queued,
            });
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE jobs SET status = ?1, html_version = NULL, title = NULL,
             h1_count = 0, h2_count = 0, h3_count = 0, h4_count = 0, h5_count = 0, h6_count = 0,
             internal_links = 0, external_links = 0, broken_links = 0, has_login_form = 0,
             error_message = NULL, lease_expires_at = NULL, updated_at = ?2
             WHERE id = ?3",
            params![JobStatus::Queued.to_db_string(), now, job_id],
        )?;
        tx.execute("DELETE FROM broken_links WHERE job_id = ?1", params![job_id])?;
        tx.commit()?;

        self.get_job(job_id)
    }

    fn requeue_interrupted(&mut self, now: DateTime<Utc>) -> StorageResult<u64> {
        let changed = self.conn.execute(
            "UPDATE jobs SET status = ?1, lease_expires_at = NULL, updated_at = ?2
             WHERE status = ?3 AND (lease_expires_at IS NULL OR lease_expires_at < ?4)",
            params![
                JobStatus::Queued.to_db_string(),
                Utc::now().to_rfc3339(),
                JobStatus::Running.to_db_string(),
                lease_timestamp(now)
            ],
        )?;
        Ok(changed as u64)
    }

    fn delete_job(&mut self, job_id: i64) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM broken_links WHERE job_id = ?1", params![job_id])?;
        let deleted = tx.execute("DELETE FROM jobs WHERE id = ?1", params![job_id])?;
        if deleted == 0 {
            return Err(StorageError::JobNotFound(job_id));
        }
        tx.commit()?;
        Ok(())
    }

    // ===== Statistics =====

    fn count_total_jobs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_jobs_by_status(&self, status: JobStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_broken_links(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM broken_links", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Initializes or opens a database at the given path
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(Connection)` - Successfully opened/created database
/// * `Err(rusqlite::Error)` - Failed to open database
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}
