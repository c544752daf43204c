//! Planned run repository trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{CourseKey, NewShiftGroup, PlannedRun, PlannedRunId, ShiftInsert};

/// Storage for planned runs and the launches that consume them.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Insert a plan for a course, optionally naming the group it launches.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ValidationError)` if the course already has a plan on that date
    async fn insert_plan(
        &self,
        course_key: &CourseKey,
        start_date: NaiveDate,
        name: Option<&str>,
    ) -> RepositoryResult<PlannedRun>;

    /// Get a plan by ID.
    async fn get_plan(&self, id: PlannedRunId) -> RepositoryResult<Option<PlannedRun>>;

    /// Pending plans of a course ordered by date.
    async fn list_course_plans(&self, course_key: &CourseKey) -> RepositoryResult<Vec<PlannedRun>>;

    /// Delete a plan.
    ///
    /// # Returns
    /// * `Ok(true)` if the plan existed
    async fn delete_plan(&self, id: PlannedRunId) -> RepositoryResult<bool>;

    /// Insert shift groups and delete consumed plans in one atomic step.
    ///
    /// Groups are inserted in order with the same rules as
    /// [`ShiftGroupRepository::insert_shift_group`](super::ShiftGroupRepository::insert_shift_group).
    /// When an insert ends in `DateTaken` or `NameTaken`, nothing is written
    /// and the returned outcomes stop at that conflict.
    ///
    /// # Returns
    /// * `Ok(outcomes)` - one outcome per processed group
    /// * `Err(RepositoryError::NotFound)` - a consumed plan no longer exists (nothing written)
    async fn commit_launches(
        &self,
        course_key: &CourseKey,
        groups: &[NewShiftGroup],
        consumed_plans: &[PlannedRunId],
    ) -> RepositoryResult<Vec<ShiftInsert>>;
}
