//! Repository trait definitions for shift storage.
//!
//! Storage is split into focused traits so that each implementation stays
//! testable on its own:
//!
//! - [`error`]: Error types for repository operations
//! - [`course`]: Course catalog lookups (course start dates)
//! - [`shift`]: Shift groups and their underlying user groups
//! - [`membership`]: Per-course user memberships
//! - [`settings`]: Per-course shift settings
//! - [`plan`]: Planned runs and atomic shift launches
//!
//! Operations that must not be observed half-done (`swap_membership`,
//! `commit_launches`) are single trait methods so that every backend can run
//! them under one lock or one transaction.

pub mod course;
pub mod error;
pub mod membership;
pub mod plan;
pub mod settings;
pub mod shift;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use course::CourseRepository;
pub use membership::MembershipRepository;
pub use plan::PlanRepository;
pub use settings::SettingsRepository;
pub use shift::ShiftGroupRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements every repository
/// trait.
///
/// ```ignore
/// async fn enrol<R: FullRepository + ?Sized>(repo: &R, user: &UserId, group: &ShiftGroup) {
///     repo.swap_membership(user, &group.course_key, None, Some(group.id)).await?;
/// }
/// ```
pub trait FullRepository:
    CourseRepository + ShiftGroupRepository + MembershipRepository + SettingsRepository + PlanRepository
{
}

impl<T> FullRepository for T where
    T: CourseRepository
        + ShiftGroupRepository
        + MembershipRepository
        + SettingsRepository
        + PlanRepository
{
}
