use chrono::NaiveDate;
use diesel::prelude::*;

use super::schema::{
    course_shift_groups, course_shift_memberships, course_shift_planned_runs,
    course_shift_settings, course_user_groups, courses,
};
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::{
    CourseKey, CourseUserGroup, CourseUserGroupId, Membership, PlannedRun, PlannedRunId,
    ShiftGroup, ShiftGroupId, ShiftSettings, UserId,
};

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = courses)]
pub struct CourseRow {
    pub course_key: String,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = course_user_groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserGroupRow {
    pub id: i64,
    pub course_key: String,
    pub name: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = course_user_groups)]
pub struct NewUserGroupRow {
    pub course_key: String,
    pub name: String,
}

impl From<UserGroupRow> for CourseUserGroup {
    fn from(row: UserGroupRow) -> Self {
        CourseUserGroup {
            id: CourseUserGroupId::new(row.id),
            course_key: CourseKey::new(row.course_key),
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = course_shift_groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShiftGroupRow {
    pub id: i64,
    pub course_key: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub user_group_id: i64,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = course_shift_groups)]
pub struct NewShiftGroupRow {
    pub course_key: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub user_group_id: i64,
}

impl From<ShiftGroupRow> for ShiftGroup {
    fn from(row: ShiftGroupRow) -> Self {
        ShiftGroup {
            id: ShiftGroupId::new(row.id),
            course_key: CourseKey::new(row.course_key),
            name: row.name,
            start_date: row.start_date,
            user_group_id: CourseUserGroupId::new(row.user_group_id),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = course_shift_memberships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MembershipRow {
    pub user_id: String,
    pub course_key: String,
    pub shift_group_id: i64,
}

impl From<MembershipRow> for Membership {
    fn from(row: MembershipRow) -> Self {
        Membership {
            user: UserId::new(row.user_id),
            course_key: CourseKey::new(row.course_key),
            shift_group_id: ShiftGroupId::new(row.shift_group_id),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = course_shift_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SettingsRow {
    pub course_key: String,
    pub is_shift_enabled: bool,
    pub is_autostart: bool,
    pub autostart_period_days: i32,
    pub created_on: NaiveDate,
}

impl TryFrom<SettingsRow> for ShiftSettings {
    type Error = RepositoryError;

    fn try_from(row: SettingsRow) -> RepositoryResult<Self> {
        let autostart_period_days = u32::try_from(row.autostart_period_days).map_err(|_| {
            RepositoryError::internal(format!(
                "Negative autostart period {} stored for course {}",
                row.autostart_period_days, row.course_key
            ))
        })?;
        Ok(ShiftSettings {
            course_key: CourseKey::new(row.course_key),
            is_shift_enabled: row.is_shift_enabled,
            is_autostart: row.is_autostart,
            autostart_period_days,
            created_on: row.created_on,
        })
    }
}

impl TryFrom<&ShiftSettings> for SettingsRow {
    type Error = RepositoryError;

    fn try_from(settings: &ShiftSettings) -> RepositoryResult<Self> {
        let autostart_period_days = i32::try_from(settings.autostart_period_days).map_err(|_| {
            RepositoryError::validation(format!(
                "Autostart period {} is out of range",
                settings.autostart_period_days
            ))
        })?;
        Ok(SettingsRow {
            course_key: settings.course_key.as_str().to_string(),
            is_shift_enabled: settings.is_shift_enabled,
            is_autostart: settings.is_autostart,
            autostart_period_days,
            created_on: settings.created_on,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = course_shift_planned_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PlannedRunRow {
    pub id: i64,
    pub course_key: String,
    pub start_date: NaiveDate,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = course_shift_planned_runs)]
pub struct NewPlannedRunRow {
    pub course_key: String,
    pub start_date: NaiveDate,
    pub name: Option<String>,
}

impl From<PlannedRunRow> for PlannedRun {
    fn from(row: PlannedRunRow) -> Self {
        PlannedRun {
            id: PlannedRunId::new(row.id),
            course_key: CourseKey::new(row.course_key),
            start_date: row.start_date,
            name: row.name,
        }
    }
}
