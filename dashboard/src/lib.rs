//! Admin dashboard data: who may see it, what it fetches, what it derives.

mod export;
mod stats;

use std::path::{Path, PathBuf};

use api::ApiClient;
use jiff::{Timestamp, civil::Date, tz::TimeZone};
use session::SessionState;
use types::{Complaint, Identity};

pub use export::{file_name as export_file_name, to_csv};
pub use stats::{
    CategoryStat, DashboardStats, RECENT_LIMIT, TOP_CATEGORY_LIMIT, recent_complaints,
    top_categories,
};

const COMPLAINTS_FETCH_FAILED: &str = "Failed to fetch complaints";
const USERS_FETCH_FAILED: &str = "Failed to fetch users count";
const EXPORT_FETCH_FAILED: &str = "Failed to fetch data for export";

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("session check still in progress")]
    SessionLoading,

    /// Not signed in as an admin; the caller should send them to admin login.
    #[error("admin login required")]
    Unauthorized,

    #[error("{0}")]
    Fetch(&'static str),

    #[error("failed to write export to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Require a settled session held by an admin.
pub fn require_admin(session: &SessionState) -> Result<&Identity, DashboardError> {
    if session.is_loading() {
        return Err(DashboardError::SessionLoading);
    }

    match session.identity() {
        Some(identity) if identity.is_admin() => Ok(identity),
        _ => Err(DashboardError::Unauthorized),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub admin: Identity,
    pub stats: DashboardStats,
    pub recent: Vec<Complaint>,
    pub top_categories: Vec<CategoryStat>,
}

impl Dashboard {
    pub fn new(admin: Identity, complaints: &[Complaint], total_users: u64) -> Self {
        Self {
            admin,
            stats: DashboardStats::from_complaints(complaints, total_users),
            recent: recent_complaints(complaints, RECENT_LIMIT),
            top_categories: top_categories(complaints, TOP_CATEGORY_LIMIT),
        }
    }

    /// Fetch everything the dashboard shows.
    ///
    /// Either both reads succeed or a single error message comes back; partial
    /// data is never returned.
    pub async fn load(client: &ApiClient, session: &SessionState) -> Result<Self, DashboardError> {
        let admin = require_admin(session)?;

        let complaints = client.list_complaints().await.map_err(|error| {
            tracing::error!(%error, "fetching complaints");
            DashboardError::Fetch(COMPLAINTS_FETCH_FAILED)
        })?;

        let total_users = client.user_count().await.map_err(|error| {
            tracing::error!(%error, "fetching user count");
            DashboardError::Fetch(USERS_FETCH_FAILED)
        })?;

        Ok(Self::new(admin.clone(), &complaints, total_users))
    }
}

/// A rendered export, ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub csv: String,
    pub rows: usize,
}

impl Export {
    pub async fn fetch(client: &ApiClient, session: &SessionState) -> Result<Self, DashboardError> {
        require_admin(session)?;

        let complaints = client.list_complaints().await.map_err(|error| {
            tracing::error!(%error, "fetching complaints for export");
            DashboardError::Fetch(EXPORT_FETCH_FAILED)
        })?;

        Ok(Self::new(&complaints, Timestamp::now()))
    }

    /// Render `complaints` as an export named after the UTC date of `at`.
    pub fn new(complaints: &[Complaint], at: Timestamp) -> Self {
        Self {
            file_name: export_file_name(utc_date(at)),
            csv: to_csv(complaints),
            rows: complaints.len(),
        }
    }

    /// Write the export into `dir` under its file name and return the full path.
    pub async fn save_in(&self, dir: &Path) -> Result<PathBuf, DashboardError> {
        let path = dir.join(&self.file_name);
        self.save_as(&path).await?;
        Ok(path)
    }

    pub async fn save_as(&self, path: &Path) -> Result<(), DashboardError> {
        tokio::fs::write(path, &self.csv)
            .await
            .map_err(|source| DashboardError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!(path = %path.display(), rows = self.rows, "exported complaints");
        Ok(())
    }
}

fn utc_date(at: Timestamp) -> Date {
    at.to_zoned(TimeZone::UTC).date()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_is_named_by_utc_date() {
        let late_evening_in_los_angeles: Timestamp = "2024-05-07T02:30:00Z".parse().unwrap();
        let export = Export::new(&[], late_evening_in_los_angeles);

        assert_eq!(export.file_name, "complaints-export-2024-05-07.csv");
        assert_eq!(export.rows, 0);
    }

    #[test]
    fn loading_session_is_not_admitted() {
        let session = SessionState::initial();
        assert!(matches!(
            require_admin(&session),
            Err(DashboardError::SessionLoading)
        ));
    }
}
