//! Shift group repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    CourseKey, CourseUserGroup, CourseUserGroupId, NewShiftGroup, ShiftGroup, ShiftGroupId,
    ShiftInsert,
};

/// Storage for shift groups and the user groups backing them.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait ShiftGroupRepository: Send + Sync {
    /// Insert a shift group together with its user group.
    ///
    /// Uniqueness is checked and the rows are written atomically:
    /// * (course, start_date) already held by a group with the same name → `Existing`
    /// * (course, start_date) held by a group with another name → `DateTaken`
    /// * name already used by another group of the course → `NameTaken`
    /// * otherwise → `Created`
    async fn insert_shift_group(&self, group: &NewShiftGroup) -> RepositoryResult<ShiftInsert>;

    /// Get a shift group by ID, `None` if it does not exist.
    async fn get_shift_group(&self, id: ShiftGroupId) -> RepositoryResult<Option<ShiftGroup>>;

    /// All shift groups of a course ordered by start date.
    async fn list_course_shifts(&self, course_key: &CourseKey) -> RepositoryResult<Vec<ShiftGroup>>;

    /// Delete a shift group, its user group and its memberships.
    ///
    /// # Returns
    /// * `Ok(true)` if the group existed
    async fn delete_shift_group(&self, id: ShiftGroupId) -> RepositoryResult<bool>;

    /// Get a user group by ID.
    async fn get_user_group(
        &self,
        id: CourseUserGroupId,
    ) -> RepositoryResult<Option<CourseUserGroup>>;

    /// All user groups of a course.
    async fn list_user_groups(&self, course_key: &CourseKey)
        -> RepositoryResult<Vec<CourseUserGroup>>;

    /// Delete a user group; the shift group built on it and that group's
    /// memberships go with it.
    ///
    /// # Returns
    /// * `Ok(true)` if the user group existed
    async fn delete_user_group(&self, id: CourseUserGroupId) -> RepositoryResult<bool>;
}
