//! Course catalog lookups.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::CourseKey;

/// Read access to the course facts shift scheduling depends on.
///
/// Courses are owned by the platform; this store only mirrors their start
/// dates so that autostart can count periods from them.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Check if the storage backend is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if connection is healthy
    /// - `Ok(false)` if connection is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Record (or update) the start date of a course.
    async fn register_course(&self, course_key: &CourseKey, start: NaiveDate)
        -> RepositoryResult<()>;

    /// Start date of a course, `None` when the course is unknown.
    async fn course_start(&self, course_key: &CourseKey) -> RepositoryResult<Option<NaiveDate>>;
}
