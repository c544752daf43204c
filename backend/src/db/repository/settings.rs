//! Shift settings repository trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{CourseKey, ShiftSettings};

/// Storage for the per-course settings row.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Return the settings of a course, inserting defaults dated `today` when
    /// the course has none. The course key is unique, so concurrent callers
    /// end up with the same row.
    async fn get_or_create_settings(
        &self,
        course_key: &CourseKey,
        today: NaiveDate,
    ) -> RepositoryResult<ShiftSettings>;

    /// Insert or replace the settings row of `settings.course_key`.
    async fn save_settings(&self, settings: &ShiftSettings) -> RepositoryResult<ShiftSettings>;

    /// Delete the settings row of a course.
    ///
    /// # Returns
    /// * `Ok(true)` if a row was deleted
    async fn delete_settings(&self, course_key: &CourseKey) -> RepositoryResult<bool>;

    /// Courses whose shifts are enabled, in key order.
    async fn list_enabled_courses(&self) -> RepositoryResult<Vec<CourseKey>>;
}
