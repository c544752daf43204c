//! Per-course shift settings and the scheduling that follows from them.
//!
//! [`update_shifts`] is the single entry point of scheduling. With autostart
//! enabled a new shift group is due every `autostart_period_days` counted
//! from the course start (or from the day the settings were created when the
//! course start is unknown). Without autostart, due planned runs are launched
//! instead.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use log::{debug, info, warn};

use super::error::{ShiftError, ShiftResult};
use super::shift_groups::resolve_insert;
use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::{
    generated_shift_name, shift_date, Clock, CourseKey, NewShiftGroup, PlannedRun, PlannedRunId,
    ShiftInsert, ShiftSettings, UpdateReport,
};

/// Start dates of every autostart slot reached by `today`.
///
/// Slot `k` (1-based) starts `k * period_days` after `anchor`; there are
/// `floor(elapsed / period_days)` of them.
pub fn autostart_slots(anchor: NaiveDate, today: NaiveDate, period_days: u32) -> Vec<NaiveDate> {
    if period_days == 0 || today <= anchor {
        return Vec::new();
    }
    let period = i64::from(period_days);
    let count = (today - anchor).num_days() / period;
    (1..=count).map(|k| shift_date(anchor, k * period)).collect()
}

/// Plans whose date has been reached, in date order.
pub fn due_plans(plans: &[PlannedRun], today: NaiveDate) -> Vec<&PlannedRun> {
    let mut due: Vec<&PlannedRun> = plans.iter().filter(|p| p.is_due(today)).collect();
    due.sort_by_key(|p| (p.start_date, p.id));
    due
}

/// `base`, or the first of `base_2`, `base_3`, ... not in `used`.
///
/// The returned name is added to `used`.
pub fn free_group_name(base: &str, used: &mut BTreeSet<String>) -> String {
    let mut name = base.to_string();
    let mut suffix = 2;
    while used.contains(&name) {
        name = format!("{}_{}", base, suffix);
        suffix += 1;
    }
    used.insert(name.clone());
    name
}

/// Settings of a course, created with defaults on first access.
pub async fn get_course_settings<R: FullRepository + ?Sized>(
    repo: &R,
    clock: &dyn Clock,
    course_key: &CourseKey,
) -> ShiftResult<ShiftSettings> {
    Ok(repo.get_or_create_settings(course_key, clock.today()).await?)
}

pub async fn save_settings<R: FullRepository + ?Sized>(
    repo: &R,
    settings: &ShiftSettings,
) -> ShiftResult<ShiftSettings> {
    if settings.autostart_period_days < 1 {
        return Err(ShiftError::validation(format!(
            "Autostart period must be at least 1 day, got {}",
            settings.autostart_period_days
        )));
    }
    let saved = repo.save_settings(settings).await?;
    info!(
        "Saved shift settings for {}: enabled={}, autostart={}, period={}d",
        saved.course_key, saved.is_shift_enabled, saved.is_autostart, saved.autostart_period_days
    );
    Ok(saved)
}

pub async fn delete_settings<R: FullRepository + ?Sized>(
    repo: &R,
    course_key: &CourseKey,
) -> ShiftResult<bool> {
    Ok(repo.delete_settings(course_key).await?)
}

/// Schedule a shift group for `start_date`.
///
/// A blank `name` is stored as unset; the launch then generates one.
pub async fn create_plan<R: FullRepository + ?Sized>(
    repo: &R,
    course_key: &CourseKey,
    start_date: NaiveDate,
    name: Option<&str>,
) -> ShiftResult<PlannedRun> {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let plan = repo
        .insert_plan(course_key, start_date, name)
        .await
        .map_err(|e| match e {
            RepositoryError::ValidationError { .. } => ShiftError::validation(format!(
                "Planned run for course {} with date {} already exists",
                course_key, start_date
            )),
            other => other.into(),
        })?;
    info!("Planned shift for {} on {} (plan {})", course_key, start_date, plan.id);
    Ok(plan)
}

/// Create the shift groups that are due for a course.
///
/// Everything the run creates or consumes is committed at once; on error
/// nothing is written. Running it again on the same day changes nothing.
/// Names already used in the course are made unique with [`free_group_name`].
pub async fn update_shifts<R: FullRepository + ?Sized>(
    repo: &R,
    clock: &dyn Clock,
    course_key: &CourseKey,
) -> ShiftResult<UpdateReport> {
    let today = clock.today();
    let settings = repo.get_or_create_settings(course_key, today).await?;
    if !settings.is_shift_enabled {
        debug!("Shifts disabled for {}, nothing to update", course_key);
        return Ok(UpdateReport::default());
    }

    let existing = repo.list_course_shifts(course_key).await?;
    let taken: BTreeSet<NaiveDate> = existing.iter().map(|g| g.start_date).collect();
    let mut used_names: BTreeSet<String> = existing.into_iter().map(|g| g.name).collect();

    let mut groups = Vec::new();
    let mut consumed: Vec<PlannedRunId> = Vec::new();

    if settings.is_autostart {
        let anchor = repo
            .course_start(course_key)
            .await?
            .unwrap_or(settings.created_on);
        for date in autostart_slots(anchor, today, settings.autostart_period_days) {
            if !taken.contains(&date) {
                let name = free_group_name(&generated_shift_name(date), &mut used_names);
                groups.push(NewShiftGroup::new(course_key.clone(), name, date));
            }
        }
    } else {
        let plans = repo.list_course_plans(course_key).await?;
        for plan in due_plans(&plans, today) {
            // A group already on the plan date fulfils the plan.
            if !taken.contains(&plan.start_date) {
                let wanted = plan.group_name(plan.start_date);
                let name = free_group_name(&wanted, &mut used_names);
                if name != wanted {
                    warn!(
                        "Name '{}' already used in {}, launching plan {} as '{}'",
                        wanted, course_key, plan.id, name
                    );
                }
                groups.push(NewShiftGroup::new(course_key.clone(), name, plan.start_date));
            }
            consumed.push(plan.id);
        }
    }

    if groups.is_empty() && consumed.is_empty() {
        debug!("No shifts due for {}", course_key);
        return Ok(UpdateReport::default());
    }

    let outcomes = repo.commit_launches(course_key, &groups, &consumed).await?;
    let mut report = UpdateReport {
        created: Vec::with_capacity(outcomes.len()),
        consumed_plans: consumed,
    };
    for (outcome, new) in outcomes.into_iter().zip(&groups) {
        match outcome {
            ShiftInsert::Created(group) => report.created.push(group),
            ShiftInsert::Existing(_) => {}
            // Rolled back; surface the conflicting slot.
            conflict => {
                resolve_insert(conflict, new)?;
            }
        }
    }

    info!(
        "Updated shifts for {}: {} created, {} plan(s) consumed",
        course_key,
        report.created.len(),
        report.consumed_plans.len()
    );
    Ok(report)
}
