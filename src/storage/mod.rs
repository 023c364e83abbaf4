//! Storage module for persisting crawl jobs
//!
//! This module handles all database operations for the job store, including:
//! - SQLite database initialization and schema management
//! - Job records and their status lifecycle
//! - Broken-link details for finished crawls
//! - Paged, filtered, and sorted job listings

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{init_database, SqliteStore};
pub use traits::{JobStore, StorageError, StorageResult};

use crate::state::JobStatus;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default number of jobs per listing page
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest accepted listing page size
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Initializes or opens a job store database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}

/// Represents a job in the database
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub id: i64,
    pub address: String,
    pub status: JobStatus,
    pub html_version: Option<String>,
    pub title: Option<String>,
    pub h1_count: u32,
    pub h2_count: u32,
    pub h3_count: u32,
    pub h4_count: u32,
    pub h5_count: u32,
    pub h6_count: u32,
    pub internal_links: u32,
    pub external_links: u32,
    pub broken_links: u32,
    pub has_login_form: bool,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,

    /// Only loaded by `JobStore::get_job`
    pub broken_link_details: Vec<BrokenLinkRecord>,
}

impl JobRecord {
    /// Heading counts for levels 1 through 6
    pub fn heading_counts(&self) -> [u32; 6] {
        [
            self.h1_count,
            self.h2_count,
            self.h3_count,
            self.h4_count,
            self.h5_count,
            self.h6_count,
        ]
    }
}

/// Represents a stored broken link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLinkRecord {
    pub id: i64,
    pub job_id: i64,
    pub url: String,
    pub status_code: u16,
}

/// Columns a listing may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Address,
    Title,
    Status,
    HtmlVersion,
    InternalLinks,
    ExternalLinks,
    BrokenLinks,
}

impl SortField {
    pub const ALL: [SortField; 9] = [
        Self::CreatedAt,
        Self::UpdatedAt,
        Self::Address,
        Self::Title,
        Self::Status,
        Self::HtmlVersion,
        Self::InternalLinks,
        Self::ExternalLinks,
        Self::BrokenLinks,
    ];

    /// The column name; only these strings are ever interpolated into SQL
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Address => "address",
            Self::Title => "title",
            Self::Status => "status",
            Self::HtmlVersion => "html_version",
            Self::InternalLinks => "internal_links",
            Self::ExternalLinks => "external_links",
            Self::BrokenLinks => "broken_links",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.column() == wanted)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|f| f.column()).collect();
                format!("unknown sort field '{}' (expected one of: {})", s, allowed.join(", "))
            })
    }
}

/// Listing sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Reads a direction; anything but `asc` means descending
    pub fn from_query(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Parameters of a job listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub status: Option<JobStatus>,

    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortField,
    pub order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            status: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            sort_by: SortField::default(),
            order: SortOrder::default(),
        }
    }
}

impl ListQuery {
    /// Page number, at least 1
    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    /// Page size: 0 means the default, and anything above the maximum is capped
    pub fn effective_limit(&self) -> u32 {
        match self.limit {
            0 => DEFAULT_PAGE_LIMIT,
            limit => limit.min(MAX_PAGE_LIMIT),
        }
    }

    /// Number of rows skipped before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.effective_page() - 1) * u64::from(self.effective_limit())
    }
}

/// One page of a job listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobPage {
    pub data: Vec<JobRecord>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl JobPage {
    pub fn new(data: Vec<JobRecord>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };

        Self {
            data,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_whitelist() {
        assert_eq!("created_at".parse::<SortField>(), Ok(SortField::CreatedAt));
        assert_eq!(" Broken_Links ".parse::<SortField>(), Ok(SortField::BrokenLinks));
        assert!("id; DROP TABLE jobs".parse::<SortField>().is_err());
        assert!("".parse::<SortField>().is_err());
    }

    #[test]
    fn test_sort_order_fallback() {
        assert_eq!(SortOrder::from_query("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::from_query("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::from_query("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::from_query("sideways"), SortOrder::Desc);
    }

    #[test]
    fn test_query_bounds() {
        let query = ListQuery {
            page: 0,
            limit: 500,
            ..ListQuery::default()
        };
        assert_eq!(query.effective_page(), 1);
        assert_eq!(query.effective_limit(), MAX_PAGE_LIMIT);
        assert_eq!(query.offset(), 0);

        let query = ListQuery {
            page: 3,
            limit: 0,
            ..ListQuery::default()
        };
        assert_eq!(query.effective_limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(JobPage::new(Vec::new(), 0, 1, 10).total_pages, 0);
        assert_eq!(JobPage::new(Vec::new(), 10, 1, 10).total_pages, 1);
        assert_eq!(JobPage::new(Vec::new(), 11, 1, 10).total_pages, 2);
        assert_eq!(JobPage::new(Vec::new(), 25, 1, 7).total_pages, 4);
    }
}
