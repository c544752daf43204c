//! Data Transfer Objects for the HTTP API.
//!
//! Domain records (`ShiftGroup`, `PlannedRun`, `ShiftSettings`, ...) already
//! derive Serialize and are returned as-is; the types here wrap them or
//! describe request bodies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{
    CourseKey, Membership, PlannedRun, ShiftGroup, ShiftGroupId, ShiftSettings, UserId,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Request body for creating a shift group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShiftRequest {
    pub name: String,
    /// Defaults to today
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShiftResponse {
    pub shift: ShiftGroup,
    /// `false` when the same shift already existed
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftListResponse {
    pub shifts: Vec<ShiftGroup>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftMembersResponse {
    pub shift_group_id: ShiftGroupId,
    pub members: Vec<UserId>,
    pub total: usize,
}

/// Partial settings update; omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub is_shift_enabled: Option<bool>,
    #[serde(default)]
    pub is_autostart: Option<bool>,
    #[serde(default)]
    pub autostart_period_days: Option<u32>,
}

impl UpdateSettingsRequest {
    pub fn apply(&self, settings: &mut ShiftSettings) {
        if let Some(enabled) = self.is_shift_enabled {
            settings.is_shift_enabled = enabled;
        }
        if let Some(autostart) = self.is_autostart {
            settings.is_autostart = autostart;
        }
        if let Some(period) = self.autostart_period_days {
            settings.autostart_period_days = period;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlanRequest {
    pub start_date: NaiveDate,
    /// Name of the launched group; generated from the date when omitted
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanListResponse {
    pub plans: Vec<PlannedRun>,
    /// Earliest plan that is already due
    pub next: Option<PlannedRun>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchPlanRequest {
    /// Defaults to the plan's name, then to the generated name for the start date
    #[serde(default)]
    pub name: Option<String>,
    /// Days added to the plan date
    #[serde(default)]
    pub days_add: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipResponse {
    pub user: UserId,
    pub course_key: CourseKey,
    pub membership: Option<Membership>,
    pub shift: Option<ShiftGroup>,
}

/// Request body for moving a user between shift groups of a course.
///
/// `null` stands for "no membership" on either side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub from_group: Option<ShiftGroupId>,
    #[serde(default)]
    pub to_group: Option<ShiftGroupId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResponse {
    pub membership: Option<Membership>,
}
