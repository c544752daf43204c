//! Shift domain records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::course::{CourseKey, CourseUserGroupId, UserId};
use crate::define_id_type;

define_id_type!(i64, ShiftGroupId);
define_id_type!(i64, PlannedRunId);

/// Default number of days between two autostarted shifts.
pub const DEFAULT_AUTOSTART_PERIOD_DAYS: u32 = 28;

/// Prefix of generated shift names.
pub const GENERATED_SHIFT_PREFIX: &str = "shift";

/// Name given to shifts created by the scheduler for `date`.
///
/// Names are derived from the date alone so that re-running the scheduler
/// finds the group it created earlier instead of conflicting with it.
pub fn generated_shift_name(date: NaiveDate) -> String {
    format!("{}_{}", GENERATED_SHIFT_PREFIX, date.format("%Y-%m-%d"))
}

/// A dated cohort of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftGroup {
    pub id: ShiftGroupId,
    pub course_key: CourseKey,
    pub name: String,
    pub start_date: NaiveDate,
    pub user_group_id: CourseUserGroupId,
}

impl std::fmt::Display for ShiftGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.course_key, self.start_date)
    }
}

/// Values needed to insert a shift group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShiftGroup {
    pub course_key: CourseKey,
    pub name: String,
    pub start_date: NaiveDate,
}

impl NewShiftGroup {
    pub fn new(course_key: CourseKey, name: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            course_key,
            name: name.into(),
            start_date,
        }
    }
}

/// Result of inserting a shift group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShiftInsert {
    /// A new group (and its user group) was stored.
    Created(ShiftGroup),
    /// The same (course, date, name) already existed.
    Existing(ShiftGroup),
    /// Another group holds the course's date slot.
    DateTaken(ShiftGroup),
    /// Another group of the course already uses the name.
    NameTaken(ShiftGroup),
}

impl ShiftInsert {
    /// The stored group this outcome refers to.
    pub fn group(&self) -> &ShiftGroup {
        match self {
            Self::Created(g) | Self::Existing(g) | Self::DateTaken(g) | Self::NameTaken(g) => g,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DateTaken(_) | Self::NameTaken(_))
    }
}

/// A user's shift assignment in one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user: UserId,
    pub course_key: CourseKey,
    pub shift_group_id: ShiftGroupId,
}

/// Outcome of an atomic membership swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipSwap {
    /// The expected membership matched and the new one is in place.
    Swapped(Option<Membership>),
    /// The stored membership was not the expected one; nothing changed.
    Conflict { actual: Option<ShiftGroupId> },
}

/// A scheduled trigger for creating a shift group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedRun {
    pub id: PlannedRunId,
    pub course_key: CourseKey,
    pub start_date: NaiveDate,
    /// Name of the group the plan launches; generated from the date when unset.
    #[serde(default)]
    pub name: Option<String>,
}

impl PlannedRun {
    /// Whether the plan's date has been reached on `today`.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.start_date <= today
    }

    /// Name of the group launched on `date`.
    pub fn group_name(&self, date: NaiveDate) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| generated_shift_name(date))
    }
}

/// Per-course shift configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSettings {
    pub course_key: CourseKey,
    pub is_shift_enabled: bool,
    pub is_autostart: bool,
    pub autostart_period_days: u32,
    /// Day the settings row was first created; autostart anchor for courses
    /// whose start date is unknown.
    pub created_on: NaiveDate,
}

impl ShiftSettings {
    /// Default settings for a course that has never been configured.
    pub fn new_default(course_key: CourseKey, created_on: NaiveDate) -> Self {
        Self {
            course_key,
            is_shift_enabled: false,
            is_autostart: true,
            autostart_period_days: DEFAULT_AUTOSTART_PERIOD_DAYS,
            created_on,
        }
    }
}

/// What a single `update_shifts` run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub created: Vec<ShiftGroup>,
    pub consumed_plans: Vec<PlannedRunId>,
}

impl UpdateReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.consumed_plans.is_empty()
    }
}
