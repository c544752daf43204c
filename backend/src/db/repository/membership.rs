//! Membership repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{CourseKey, Membership, MembershipSwap, ShiftGroupId, UserId};

/// Storage for (user, course) → shift group assignments.
///
/// Implementations keep at most one membership per (user, course).
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Current membership of `user` in `course_key`.
    async fn find_membership(
        &self,
        user: &UserId,
        course_key: &CourseKey,
    ) -> RepositoryResult<Option<Membership>>;

    /// Compare-and-set a user's membership in one course.
    ///
    /// The stored membership is compared with `expected` and replaced by
    /// `target` in one atomic step (`None` meaning "no membership" on both
    /// sides). Concurrent swaps for the same (user, course) are serialized.
    ///
    /// # Returns
    /// * `Ok(MembershipSwap::Swapped(new))` - the write happened
    /// * `Ok(MembershipSwap::Conflict { actual })` - nothing was written
    /// * `Err(RepositoryError::NotFound)` - `target` does not exist in `course_key`
    async fn swap_membership(
        &self,
        user: &UserId,
        course_key: &CourseKey,
        expected: Option<ShiftGroupId>,
        target: Option<ShiftGroupId>,
    ) -> RepositoryResult<MembershipSwap>;

    /// Users currently assigned to a shift group.
    async fn list_group_members(&self, group_id: ShiftGroupId) -> RepositoryResult<Vec<UserId>>;
}
