//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use course_shifts::db::repositories::LocalRepository;
use course_shifts::db::repository::{
    CourseRepository, MembershipRepository, PlanRepository, RepositoryError, RepositoryResult,
    SettingsRepository, ShiftGroupRepository,
};
use course_shifts::models::{
    CourseKey, CourseUserGroup, CourseUserGroupId, FixedClock, Membership, MembershipSwap,
    NewShiftGroup, PlannedRun, PlannedRunId, ShiftGroup, ShiftGroupId, ShiftInsert, ShiftSettings,
    UserId,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub const COURSE: &str = "course-v1:org+num+run";
pub const OTHER_COURSE: &str = "course-v1:org+other+run";

pub fn course() -> CourseKey {
    CourseKey::new(COURSE)
}

pub fn other_course() -> CourseKey {
    CourseKey::new(OTHER_COURSE)
}

/// An empty repository and a clock stopped on `today`.
pub fn fixture(today: NaiveDate) -> (LocalRepository, FixedClock) {
    (LocalRepository::new(), FixedClock::new(today))
}

/// Insert a shift group directly through the repository.
pub async fn seed_group(
    repo: &LocalRepository,
    course_key: &CourseKey,
    name: &str,
    start_date: NaiveDate,
) -> ShiftGroup {
    let new = NewShiftGroup::new(course_key.clone(), name, start_date);
    repo.insert_shift_group(&new)
        .await
        .expect("insert shift group")
        .group()
        .clone()
}

/// A [`LocalRepository`] whose shift and plan queries fail for one course.
#[derive(Clone)]
pub struct BrokenCourseRepository {
    pub inner: LocalRepository,
    pub broken: CourseKey,
}

impl BrokenCourseRepository {
    pub fn new(inner: LocalRepository, broken: CourseKey) -> Self {
        Self { inner, broken }
    }

    fn check(&self, course_key: &CourseKey) -> RepositoryResult<()> {
        if course_key == &self.broken {
            return Err(RepositoryError::query(format!("storage failure for {}", course_key)));
        }
        Ok(())
    }
}

#[async_trait]
impl CourseRepository for BrokenCourseRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.inner.health_check().await
    }

    async fn register_course(&self, course_key: &CourseKey, start: NaiveDate) -> RepositoryResult<()> {
        self.inner.register_course(course_key, start).await
    }

    async fn course_start(&self, course_key: &CourseKey) -> RepositoryResult<Option<NaiveDate>> {
        self.inner.course_start(course_key).await
    }
}

#[async_trait]
impl ShiftGroupRepository for BrokenCourseRepository {
    async fn insert_shift_group(&self, group: &NewShiftGroup) -> RepositoryResult<ShiftInsert> {
        self.check(&group.course_key)?;
        self.inner.insert_shift_group(group).await
    }

    async fn get_shift_group(&self, id: ShiftGroupId) -> RepositoryResult<Option<ShiftGroup>> {
        self.inner.get_shift_group(id).await
    }

    async fn list_course_shifts(&self, course_key: &CourseKey) -> RepositoryResult<Vec<ShiftGroup>> {
        self.check(course_key)?;
        self.inner.list_course_shifts(course_key).await
    }

    async fn delete_shift_group(&self, id: ShiftGroupId) -> RepositoryResult<bool> {
        self.inner.delete_shift_group(id).await
    }

    async fn get_user_group(&self, id: CourseUserGroupId) -> RepositoryResult<Option<CourseUserGroup>> {
        self.inner.get_user_group(id).await
    }

    async fn list_user_groups(&self, course_key: &CourseKey) -> RepositoryResult<Vec<CourseUserGroup>> {
        self.inner.list_user_groups(course_key).await
    }

    async fn delete_user_group(&self, id: CourseUserGroupId) -> RepositoryResult<bool> {
        self.inner.delete_user_group(id).await
    }
}

#[async_trait]
impl MembershipRepository for BrokenCourseRepository {
    async fn find_membership(
        &self,
        user: &UserId,
        course_key: &CourseKey,
    ) -> RepositoryResult<Option<Membership>> {
        self.inner.find_membership(user, course_key).await
    }

    async fn swap_membership(
        &self,
        user: &UserId,
        course_key: &CourseKey,
        expected: Option<ShiftGroupId>,
        target: Option<ShiftGroupId>,
    ) -> RepositoryResult<MembershipSwap> {
        self.inner.swap_membership(user, course_key, expected, target).await
    }

    async fn list_group_members(&self, group_id: ShiftGroupId) -> RepositoryResult<Vec<UserId>> {
        self.inner.list_group_members(group_id).await
    }
}

#[async_trait]
impl SettingsRepository for BrokenCourseRepository {
    async fn get_or_create_settings(
        &self,
        course_key: &CourseKey,
        today: NaiveDate,
    ) -> RepositoryResult<ShiftSettings> {
        self.inner.get_or_create_settings(course_key, today).await
    }

    async fn save_settings(&self, settings: &ShiftSettings) -> RepositoryResult<ShiftSettings> {
        self.inner.save_settings(settings).await
    }

    async fn delete_settings(&self, course_key: &CourseKey) -> RepositoryResult<bool> {
        self.inner.delete_settings(course_key).await
    }

    async fn list_enabled_courses(&self) -> RepositoryResult<Vec<CourseKey>> {
        self.inner.list_enabled_courses().await
    }
}

#[async_trait]
impl PlanRepository for BrokenCourseRepository {
    async fn insert_plan(
        &self,
        course_key: &CourseKey,
        start_date: NaiveDate,
        name: Option<&str>,
    ) -> RepositoryResult<PlannedRun> {
        self.inner.insert_plan(course_key, start_date, name).await
    }

    async fn get_plan(&self, id: PlannedRunId) -> RepositoryResult<Option<PlannedRun>> {
        self.inner.get_plan(id).await
    }

    async fn list_course_plans(&self, course_key: &CourseKey) -> RepositoryResult<Vec<PlannedRun>> {
        self.check(course_key)?;
        self.inner.list_course_plans(course_key).await
    }

    async fn delete_plan(&self, id: PlannedRunId) -> RepositoryResult<bool> {
        self.inner.delete_plan(id).await
    }

    async fn commit_launches(
        &self,
        course_key: &CourseKey,
        groups: &[NewShiftGroup],
        consumed_plans: &[PlannedRunId],
    ) -> RepositoryResult<Vec<ShiftInsert>> {
        self.check(course_key)?;
        self.inner.commit_launches(course_key, groups, consumed_plans).await
    }
}

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}
