//! Planned runs: pending shift creations and their launch.

use log::info;

use super::error::{ShiftError, ShiftResult};
use super::shift_groups::resolve_insert;
use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::{
    shift_date, Clock, CourseKey, NewShiftGroup, PlannedRun, PlannedRunId,
    ShiftGroup,
};

fn plan_not_found(id: PlannedRunId) -> ShiftError {
    ShiftError::not_found(format!("Planned run {} not found", id))
}

/// Pending plans of a course ordered by date.
pub async fn get_course_plans<R: FullRepository + ?Sized>(
    repo: &R,
    course_key: &CourseKey,
) -> ShiftResult<Vec<PlannedRun>> {
    Ok(repo.list_course_plans(course_key).await?)
}

/// The earliest plan of the course whose date has been reached.
pub async fn get_next_plan<R: FullRepository + ?Sized>(
    repo: &R,
    clock: &dyn Clock,
    course_key: &CourseKey,
) -> ShiftResult<Option<PlannedRun>> {
    let today = clock.today();
    Ok(repo
        .list_course_plans(course_key)
        .await?
        .into_iter()
        .find(|plan| plan.is_due(today)))
}

pub async fn get_plan<R: FullRepository + ?Sized>(
    repo: &R,
    id: PlannedRunId,
) -> ShiftResult<PlannedRun> {
    repo.get_plan(id).await?.ok_or_else(|| plan_not_found(id))
}

/// Create the shift group of a plan and delete the plan in one commit.
///
/// The group starts `days_add` days after the plan date. A blank `name`
/// falls back to the plan's own name, then to the generated name for that
/// date. Launching a plan that
/// was already launched or deleted fails with [`ShiftError::NotFound`].
pub async fn launch_shift<R: FullRepository + ?Sized>(
    repo: &R,
    id: PlannedRunId,
    name: Option<&str>,
    days_add: i64,
) -> ShiftResult<ShiftGroup> {
    let plan = get_plan(repo, id).await?;
    let start_date = shift_date(plan.start_date, days_add);
    let name = match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => plan.group_name(start_date),
    };
    let new = NewShiftGroup::new(plan.course_key.clone(), name, start_date);

    let outcomes = repo
        .commit_launches(&plan.course_key, std::slice::from_ref(&new), &[plan.id])
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound { .. } => plan_not_found(id),
            other => other.into(),
        })?;
    let outcome = outcomes
        .into_iter()
        .next()
        .ok_or_else(|| RepositoryError::internal("commit_launches returned no outcome"))?;
    let (group, _) = resolve_insert(outcome, &new)?;

    info!("Launched planned run {} as shift group {}", plan.id, group);
    Ok(group)
}

pub async fn delete_plan<R: FullRepository + ?Sized>(repo: &R, id: PlannedRunId) -> ShiftResult<()> {
    if !repo.delete_plan(id).await? {
        return Err(plan_not_found(id));
    }
    info!("Deleted planned run {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::PlanRepository;
    use crate::models::FixedClock;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_next_plan_skips_future_plans() {
        let repo = LocalRepository::new();
        let course = CourseKey::new("org/num/run");
        let clock = FixedClock::new(date(2026, 6, 10));
        repo.insert_plan(&course, date(2026, 6, 20), None).await.unwrap();

        assert!(get_next_plan(&repo, &clock, &course).await.unwrap().is_none());

        let due = repo.insert_plan(&course, date(2026, 6, 5), None).await.unwrap();
        assert_eq!(get_next_plan(&repo, &clock, &course).await.unwrap(), Some(due));
    }

    #[tokio::test]
    async fn test_launch_uses_generated_name_for_blank() {
        let repo = LocalRepository::new();
        let course = CourseKey::new("org/num/run");
        let plan = repo.insert_plan(&course, date(2026, 6, 5), None).await.unwrap();

        let group = launch_shift(&repo, plan.id, Some(""), 2).await.unwrap();
        assert_eq!(group.start_date, date(2026, 6, 7));
        assert_eq!(group.name, "shift_2026-06-07");
    }

    #[tokio::test]
    async fn test_launch_uses_plan_name() {
        let repo = LocalRepository::new();
        let course = CourseKey::new("org/num/run");
        let plan = repo
            .insert_plan(&course, date(2026, 6, 5), Some("june_cohort"))
            .await
            .unwrap();

        let group = launch_shift(&repo, plan.id, None, 0).await.unwrap();
        assert_eq!(group.name, "june_cohort");
        assert_eq!(group.start_date, date(2026, 6, 5));
    }

    #[tokio::test]
    async fn test_delete_plan_twice() {
        let repo = LocalRepository::new();
        let course = CourseKey::new("org/num/run");
        let plan = repo.insert_plan(&course, date(2026, 6, 5), None).await.unwrap();

        delete_plan(&repo, plan.id).await.unwrap();
        let err = delete_plan(&repo, plan.id).await.unwrap_err();
        assert!(matches!(err, ShiftError::NotFound(_)));
    }
}
