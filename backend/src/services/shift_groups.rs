//! Shift group lifecycle.

use chrono::NaiveDate;
use log::{debug, info};

use super::error::{ShiftError, ShiftResult};
use crate::db::repository::FullRepository;
use crate::models::{
    Clock, CourseKey, CourseUserGroupId, NewShiftGroup, ShiftGroup, ShiftGroupId, ShiftInsert,
    UserId,
};

/// Turn a stored insert outcome into `(group, created)` or the matching
/// validation error.
pub(crate) fn resolve_insert(outcome: ShiftInsert, new: &NewShiftGroup) -> ShiftResult<(ShiftGroup, bool)> {
    match outcome {
        ShiftInsert::Created(group) => Ok((group, true)),
        ShiftInsert::Existing(group) => Ok((group, false)),
        ShiftInsert::DateTaken(existing) => Err(ShiftError::validation(format!(
            "Shift for course {} with date {} already exists (named '{}')",
            new.course_key, new.start_date, existing.name
        ))),
        ShiftInsert::NameTaken(existing) => Err(ShiftError::validation(format!(
            "Shift with name '{}' already exists for course {} with date {}",
            new.name, new.course_key, existing.start_date
        ))),
    }
}

/// Create a shift group, or return the existing one when the same name is
/// already stored for the course and date.
///
/// `start_date` defaults to today. Returns the group and whether it was
/// newly created.
pub async fn create_shift_group<R: FullRepository + ?Sized>(
    repo: &R,
    clock: &dyn Clock,
    course_key: &CourseKey,
    name: &str,
    start_date: Option<NaiveDate>,
) -> ShiftResult<(ShiftGroup, bool)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ShiftError::validation("Shift name must not be empty"));
    }

    let new = NewShiftGroup::new(
        course_key.clone(),
        name,
        start_date.unwrap_or_else(|| clock.today()),
    );
    let outcome = repo.insert_shift_group(&new).await?;
    let (group, created) = resolve_insert(outcome, &new)?;
    if created {
        info!("Created shift group {} (id={})", group, group.id);
    } else {
        debug!("Shift group {} already exists (id={})", group, group.id);
    }
    Ok((group, created))
}

/// All shift groups of a course ordered by start date.
pub async fn get_course_shifts<R: FullRepository + ?Sized>(
    repo: &R,
    course_key: &CourseKey,
) -> ShiftResult<Vec<ShiftGroup>> {
    Ok(repo.list_course_shifts(course_key).await?)
}

pub async fn get_shift_group<R: FullRepository + ?Sized>(
    repo: &R,
    id: ShiftGroupId,
) -> ShiftResult<ShiftGroup> {
    repo.get_shift_group(id)
        .await?
        .ok_or_else(|| ShiftError::not_found(format!("Shift group {} not found", id)))
}

/// Users whose membership points at the group.
pub async fn get_shift_members<R: FullRepository + ?Sized>(
    repo: &R,
    id: ShiftGroupId,
) -> ShiftResult<Vec<UserId>> {
    let group = get_shift_group(repo, id).await?;
    Ok(repo.list_group_members(group.id).await?)
}

/// Delete a shift group together with its user group and memberships.
pub async fn delete_shift_group<R: FullRepository + ?Sized>(
    repo: &R,
    id: ShiftGroupId,
) -> ShiftResult<()> {
    if !repo.delete_shift_group(id).await? {
        return Err(ShiftError::not_found(format!("Shift group {} not found", id)));
    }
    info!("Deleted shift group {}", id);
    Ok(())
}

/// Delete the user group backing a shift; the shift group goes with it.
pub async fn delete_user_group<R: FullRepository + ?Sized>(
    repo: &R,
    id: CourseUserGroupId,
) -> ShiftResult<()> {
    if !repo.delete_user_group(id).await? {
        return Err(ShiftError::not_found(format!("User group {} not found", id)));
    }
    info!("Deleted user group {}", id);
    Ok(())
}
