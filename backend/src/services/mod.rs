//! Service layer for shift business rules.
//!
//! Services sit between the HTTP layer and the repository traits. They work
//! with any [`FullRepository`](crate::db::FullRepository) and take the
//! current date from a [`Clock`](crate::models::Clock).

pub mod error;
pub mod membership;
pub mod planned_runs;
pub mod scheduler;
pub mod settings;
pub mod shift_groups;

pub use error::{ShiftError, ShiftResult};
pub use membership::{get_user_membership, get_user_shift, transfer_user};
pub use planned_runs::{delete_plan, get_course_plans, get_next_plan, get_plan, launch_shift};
pub use scheduler::{update_all_shifts, SweepSummary};
pub use settings::{
    autostart_slots, create_plan, delete_settings, due_plans, get_course_settings, save_settings,
    update_shifts,
};
pub use shift_groups::{
    create_shift_group, delete_shift_group, delete_user_group, get_course_shifts,
    get_shift_group, get_shift_members,
};

use crate::db::repository::FullRepository;

/// Check that the storage backend is reachable.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> ShiftResult<bool> {
    Ok(repo.health_check().await?)
}
