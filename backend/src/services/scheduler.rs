//! Periodic sweep over every course with shifts enabled.

use std::collections::BTreeMap;

use log::{error, info};
use serde::Serialize;

use super::error::ShiftResult;
use super::settings::update_shifts;
use crate::db::repository::FullRepository;
use crate::models::{Clock, CourseKey, UpdateReport};

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepSummary {
    /// Courses that were updated, with what changed.
    pub updated: BTreeMap<CourseKey, UpdateReport>,
    /// Courses whose update failed, with the error message.
    pub failed: BTreeMap<CourseKey, String>,
}

impl SweepSummary {
    pub fn created_count(&self) -> usize {
        self.updated.values().map(|r| r.created.len()).sum()
    }
}

/// Run [`update_shifts`] for every course with shifts enabled.
///
/// A failing course is logged and recorded; the sweep continues with the
/// next one. Only listing the courses can fail the sweep as a whole.
pub async fn update_all_shifts<R: FullRepository + ?Sized>(
    repo: &R,
    clock: &dyn Clock,
) -> ShiftResult<SweepSummary> {
    let courses = repo.list_enabled_courses().await?;
    let mut summary = SweepSummary::default();

    for course_key in courses {
        match update_shifts(repo, clock, &course_key).await {
            Ok(report) => {
                summary.updated.insert(course_key, report);
            }
            Err(e) => {
                error!("Failed to update shifts for {}: {}", course_key, e);
                summary.failed.insert(course_key, e.to_string());
            }
        }
    }

    info!(
        "Shift sweep done: {} course(s), {} group(s) created, {} failure(s)",
        summary.updated.len() + summary.failed.len(),
        summary.created_count(),
        summary.failed.len()
    );
    Ok(summary)
}
