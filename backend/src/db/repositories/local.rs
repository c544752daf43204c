//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data lives behind a
//! single `RwLock`, so every trait method is atomic with respect to the others.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{
    CourseKey, CourseUserGroup, CourseUserGroupId, Membership, MembershipSwap, NewShiftGroup,
    PlannedRun, PlannedRunId, ShiftGroup, ShiftGroupId, ShiftInsert, ShiftSettings, UserId,
};

/// In-memory local repository.
///
/// Cloning the repository shares the underlying data.
///
/// # Example
/// ```
/// use course_shifts::db::repositories::LocalRepository;
/// use course_shifts::db::repository::ShiftGroupRepository;
/// use course_shifts::models::{CourseKey, NewShiftGroup};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let repo = LocalRepository::new();
///     let date = chrono::NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
///     let new = NewShiftGroup::new(CourseKey::new("a/b/c"), "autumn", date);
///     repo.insert_shift_group(&new).await.unwrap();
///     assert_eq!(repo.shift_count(), 1);
/// });
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

#[derive(Clone)]
struct LocalData {
    courses: HashMap<CourseKey, NaiveDate>,
    user_groups: BTreeMap<CourseUserGroupId, CourseUserGroup>,
    shift_groups: BTreeMap<ShiftGroupId, ShiftGroup>,
    memberships: HashMap<(UserId, CourseKey), Membership>,
    settings: BTreeMap<CourseKey, ShiftSettings>,
    plans: BTreeMap<PlannedRunId, PlannedRun>,

    // ID counters
    next_user_group_id: i64,
    next_shift_group_id: i64,
    next_plan_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            courses: HashMap::new(),
            user_groups: BTreeMap::new(),
            shift_groups: BTreeMap::new(),
            memberships: HashMap::new(),
            settings: BTreeMap::new(),
            plans: BTreeMap::new(),
            next_user_group_id: 1,
            next_shift_group_id: 1,
            next_plan_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn insert_shift_group(&mut self, new: &NewShiftGroup) -> ShiftInsert {
        let same_course = || {
            self.shift_groups
                .values()
                .filter(|g| g.course_key == new.course_key)
        };

        if let Some(existing) = same_course().find(|g| g.start_date == new.start_date) {
            return if existing.name == new.name {
                ShiftInsert::Existing(existing.clone())
            } else {
                ShiftInsert::DateTaken(existing.clone())
            };
        }
        if let Some(existing) = same_course().find(|g| g.name == new.name) {
            return ShiftInsert::NameTaken(existing.clone());
        }

        let user_group_id = CourseUserGroupId::new(self.next_user_group_id);
        self.next_user_group_id += 1;
        self.user_groups.insert(
            user_group_id,
            CourseUserGroup {
                id: user_group_id,
                course_key: new.course_key.clone(),
                name: new.name.clone(),
            },
        );

        let id = ShiftGroupId::new(self.next_shift_group_id);
        self.next_shift_group_id += 1;
        let group = ShiftGroup {
            id,
            course_key: new.course_key.clone(),
            name: new.name.clone(),
            start_date: new.start_date,
            user_group_id,
        };
        self.shift_groups.insert(id, group.clone());
        ShiftInsert::Created(group)
    }

    fn remove_shift_group(&mut self, id: ShiftGroupId) -> bool {
        match self.shift_groups.remove(&id) {
            Some(group) => {
                self.user_groups.remove(&group.user_group_id);
                self.memberships.retain(|_, m| m.shift_group_id != id);
                true
            }
            None => false,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Number of shift groups stored across all courses.
    pub fn shift_count(&self) -> usize {
        self.data.read().shift_groups.len()
    }

    /// Number of memberships stored across all courses.
    pub fn membership_count(&self) -> usize {
        self.data.read().memberships.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CourseRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn register_course(
        &self,
        course_key: &CourseKey,
        start: NaiveDate,
    ) -> RepositoryResult<()> {
        self.check_health()?;
        self.data.write().courses.insert(course_key.clone(), start);
        Ok(())
    }

    async fn course_start(&self, course_key: &CourseKey) -> RepositoryResult<Option<NaiveDate>> {
        self.check_health()?;
        Ok(self.data.read().courses.get(course_key).copied())
    }
}

#[async_trait]
impl ShiftGroupRepository for LocalRepository {
    async fn insert_shift_group(&self, group: &NewShiftGroup) -> RepositoryResult<ShiftInsert> {
        self.check_health()?;
        Ok(self.data.write().insert_shift_group(group))
    }

    async fn get_shift_group(&self, id: ShiftGroupId) -> RepositoryResult<Option<ShiftGroup>> {
        self.check_health()?;
        Ok(self.data.read().shift_groups.get(&id).cloned())
    }

    async fn list_course_shifts(&self, course_key: &CourseKey) -> RepositoryResult<Vec<ShiftGroup>> {
        self.check_health()?;
        let data = self.data.read();
        let mut groups: Vec<ShiftGroup> = data
            .shift_groups
            .values()
            .filter(|g| &g.course_key == course_key)
            .cloned()
            .collect();
        groups.sort_by_key(|g| (g.start_date, g.id));
        Ok(groups)
    }

    async fn delete_shift_group(&self, id: ShiftGroupId) -> RepositoryResult<bool> {
        self.check_health()?;
        Ok(self.data.write().remove_shift_group(id))
    }

    async fn get_user_group(
        &self,
        id: CourseUserGroupId,
    ) -> RepositoryResult<Option<CourseUserGroup>> {
        self.check_health()?;
        Ok(self.data.read().user_groups.get(&id).cloned())
    }

    async fn list_user_groups(
        &self,
        course_key: &CourseKey,
    ) -> RepositoryResult<Vec<CourseUserGroup>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .user_groups
            .values()
            .filter(|g| &g.course_key == course_key)
            .cloned()
            .collect())
    }

    async fn delete_user_group(&self, id: CourseUserGroupId) -> RepositoryResult<bool> {
        self.check_health()?;
        let mut data = self.data.write();
        if data.user_groups.remove(&id).is_none() {
            return Ok(false);
        }
        let owner = data
            .shift_groups
            .values()
            .find(|g| g.user_group_id == id)
            .map(|g| g.id);
        if let Some(shift_id) = owner {
            data.remove_shift_group(shift_id);
        }
        Ok(true)
    }
}

#[async_trait]
impl MembershipRepository for LocalRepository {
    async fn find_membership(
        &self,
        user: &UserId,
        course_key: &CourseKey,
    ) -> RepositoryResult<Option<Membership>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .memberships
            .get(&(user.clone(), course_key.clone()))
            .cloned())
    }

    async fn swap_membership(
        &self,
        user: &UserId,
        course_key: &CourseKey,
        expected: Option<ShiftGroupId>,
        target: Option<ShiftGroupId>,
    ) -> RepositoryResult<MembershipSwap> {
        self.check_health()?;
        let mut data = self.data.write();
        let key = (user.clone(), course_key.clone());

        let actual = data.memberships.get(&key).map(|m| m.shift_group_id);
        if actual != expected {
            return Ok(MembershipSwap::Conflict { actual });
        }

        match target {
            Some(group_id) => {
                let in_course = data
                    .shift_groups
                    .get(&group_id)
                    .is_some_and(|g| &g.course_key == course_key);
                if !in_course {
                    return Err(RepositoryError::not_found_with_context(
                        format!("Shift group {} not found in course {}", group_id, course_key),
                        ErrorContext::new("swap_membership")
                            .with_entity("shift_group")
                            .with_entity_id(group_id),
                    ));
                }
                let membership = Membership {
                    user: user.clone(),
                    course_key: course_key.clone(),
                    shift_group_id: group_id,
                };
                data.memberships.insert(key, membership.clone());
                Ok(MembershipSwap::Swapped(Some(membership)))
            }
            None => {
                data.memberships.remove(&key);
                Ok(MembershipSwap::Swapped(None))
            }
        }
    }

    async fn list_group_members(&self, group_id: ShiftGroupId) -> RepositoryResult<Vec<UserId>> {
        self.check_health()?;
        let mut users: Vec<UserId> = self
            .data
            .read()
            .memberships
            .values()
            .filter(|m| m.shift_group_id == group_id)
            .map(|m| m.user.clone())
            .collect();
        users.sort();
        Ok(users)
    }
}

#[async_trait]
impl SettingsRepository for LocalRepository {
    async fn get_or_create_settings(
        &self,
        course_key: &CourseKey,
        today: NaiveDate,
    ) -> RepositoryResult<ShiftSettings> {
        self.check_health()?;
        let mut data = self.data.write();
        let settings = data
            .settings
            .entry(course_key.clone())
            .or_insert_with(|| ShiftSettings::new_default(course_key.clone(), today));
        Ok(settings.clone())
    }

    async fn save_settings(&self, settings: &ShiftSettings) -> RepositoryResult<ShiftSettings> {
        self.check_health()?;
        self.data
            .write()
            .settings
            .insert(settings.course_key.clone(), settings.clone());
        Ok(settings.clone())
    }

    async fn delete_settings(&self, course_key: &CourseKey) -> RepositoryResult<bool> {
        self.check_health()?;
        Ok(self.data.write().settings.remove(course_key).is_some())
    }

    async fn list_enabled_courses(&self) -> RepositoryResult<Vec<CourseKey>> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .settings
            .values()
            .filter(|s| s.is_shift_enabled)
            .map(|s| s.course_key.clone())
            .collect())
    }
}

#[async_trait]
impl PlanRepository for LocalRepository {
    async fn insert_plan(
        &self,
        course_key: &CourseKey,
        start_date: NaiveDate,
        name: Option<&str>,
    ) -> RepositoryResult<PlannedRun> {
        self.check_health()?;
        let mut data = self.data.write();
        let duplicate = data
            .plans
            .values()
            .any(|p| &p.course_key == course_key && p.start_date == start_date);
        if duplicate {
            return Err(RepositoryError::validation_with_context(
                format!(
                    "Plan for course {} with date {} already exists",
                    course_key, start_date
                ),
                ErrorContext::new("insert_plan").with_entity("planned_run"),
            ));
        }

        let id = PlannedRunId::new(data.next_plan_id);
        data.next_plan_id += 1;
        let plan = PlannedRun {
            id,
            course_key: course_key.clone(),
            start_date,
            name: name.map(str::to_string),
        };
        data.plans.insert(id, plan.clone());
        Ok(plan)
    }

    async fn get_plan(&self, id: PlannedRunId) -> RepositoryResult<Option<PlannedRun>> {
        self.check_health()?;
        Ok(self.data.read().plans.get(&id).cloned())
    }

    async fn list_course_plans(&self, course_key: &CourseKey) -> RepositoryResult<Vec<PlannedRun>> {
        self.check_health()?;
        let mut plans: Vec<PlannedRun> = self
            .data
            .read()
            .plans
            .values()
            .filter(|p| &p.course_key == course_key)
            .cloned()
            .collect();
        plans.sort_by_key(|p| (p.start_date, p.id));
        Ok(plans)
    }

    async fn delete_plan(&self, id: PlannedRunId) -> RepositoryResult<bool> {
        self.check_health()?;
        Ok(self.data.write().plans.remove(&id).is_some())
    }

    async fn commit_launches(
        &self,
        course_key: &CourseKey,
        groups: &[NewShiftGroup],
        consumed_plans: &[PlannedRunId],
    ) -> RepositoryResult<Vec<ShiftInsert>> {
        self.check_health()?;
        let mut data = self.data.write();

        // Work on a copy and publish it only if every step succeeds.
        let mut staged = data.clone();
        for plan_id in consumed_plans {
            let owned = staged
                .plans
                .remove(plan_id)
                .is_some_and(|p| &p.course_key == course_key);
            if !owned {
                return Err(RepositoryError::not_found_with_context(
                    format!("Planned run {} not found in course {}", plan_id, course_key),
                    ErrorContext::new("commit_launches")
                        .with_entity("planned_run")
                        .with_entity_id(plan_id),
                ));
            }
        }

        let mut outcomes = Vec::with_capacity(groups.len());
        for group in groups {
            let outcome = staged.insert_shift_group(group);
            let conflict = outcome.is_conflict();
            outcomes.push(outcome);
            if conflict {
                return Ok(outcomes);
            }
        }

        *data = staged;
        Ok(outcomes)
    }
}
