use async_trait::async_trait;
use thiserror::Error;

use crate::enrolment::{CourseContext, EnrolmentContext, SiteConfig, UserContext};
use crate::instance::InstanceRecord;

/// Errors raised while talking to the host's records
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Read and write access to the host platform's records.
///
/// Implementations return `Ok(None)` for records that do not exist and
/// reserve errors for lookups that could not be performed.
#[async_trait]
pub trait HostDirectory: Send + Sync {
    /// Backend name for health reporting
    fn backend_name(&self) -> &'static str;

    /// Fresh snapshot of the plugin's site settings
    async fn site_config(&self) -> DirectoryResult<SiteConfig>;

    async fn course(&self, course_id: i64) -> DirectoryResult<Option<CourseContext>>;

    /// User record with all custom profile fields loaded
    async fn user(&self, user_id: i64) -> DirectoryResult<Option<UserContext>>;

    async fn enrolment(&self, enrolment_id: i64) -> DirectoryResult<Option<EnrolmentContext>>;

    /// The notifier instance attached to a course, if any
    async fn instance_for_course(&self, course_id: i64) -> DirectoryResult<Option<InstanceRecord>>;

    /// Shortnames of every custom profile field defined on the site
    async fn profile_field_shortnames(&self) -> DirectoryResult<Vec<String>>;

    /// Persist a new instance and return its id. Returns `None` without
    /// writing when the course already has an instance; the check and the
    /// write are atomic.
    async fn insert_instance(&self, record: &InstanceRecord) -> DirectoryResult<Option<i64>>;

    /// Overwrite an existing instance; `false` when no row matched
    async fn update_instance(&self, record: &InstanceRecord) -> DirectoryResult<bool>;
}
