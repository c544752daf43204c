//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    CreatePlanRequest, CreateShiftRequest, CreateShiftResponse, HealthResponse,
    LaunchPlanRequest, MembershipResponse, PlanListResponse, ShiftListResponse,
    ShiftMembersResponse, TransferRequest, TransferResponse, UpdateSettingsRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::{
    CourseKey, PlannedRun, PlannedRunId, ShiftGroup, ShiftGroupId, ShiftSettings, UpdateReport,
    UserId,
};
use crate::services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and storage is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Shift groups
// =============================================================================

/// GET /v1/courses/{course}/shifts
pub async fn list_shifts(
    State(state): State<AppState>,
    Path(course): Path<String>,
) -> HandlerResult<ShiftListResponse> {
    let shifts = services::get_course_shifts(state.repository.as_ref(), &CourseKey::new(course))
        .await?;
    let total = shifts.len();
    Ok(Json(ShiftListResponse { shifts, total }))
}

/// POST /v1/courses/{course}/shifts
///
/// Responds 201 for a new group and 200 when the same group already existed.
pub async fn create_shift(
    State(state): State<AppState>,
    Path(course): Path<String>,
    Json(request): Json<CreateShiftRequest>,
) -> Result<(StatusCode, Json<CreateShiftResponse>), AppError> {
    let (shift, created) = services::create_shift_group(
        state.repository.as_ref(),
        state.clock.as_ref(),
        &CourseKey::new(course),
        &request.name,
        request.start_date,
    )
    .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(CreateShiftResponse { shift, created })))
}

/// GET /v1/shifts/{id}
pub async fn get_shift(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<ShiftGroup> {
    let shift = services::get_shift_group(state.repository.as_ref(), ShiftGroupId::new(id)).await?;
    Ok(Json(shift))
}

/// DELETE /v1/shifts/{id}
pub async fn delete_shift(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::delete_shift_group(state.repository.as_ref(), ShiftGroupId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/shifts/{id}/members
pub async fn list_shift_members(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<ShiftMembersResponse> {
    let shift_group_id = ShiftGroupId::new(id);
    let members = services::get_shift_members(state.repository.as_ref(), shift_group_id).await?;
    let total = members.len();
    Ok(Json(ShiftMembersResponse {
        shift_group_id,
        members,
        total,
    }))
}

// =============================================================================
// Settings and scheduling
// =============================================================================

/// GET /v1/courses/{course}/settings
pub async fn get_settings(
    State(state): State<AppState>,
    Path(course): Path<String>,
) -> HandlerResult<ShiftSettings> {
    let settings = services::get_course_settings(
        state.repository.as_ref(),
        state.clock.as_ref(),
        &CourseKey::new(course),
    )
    .await?;
    Ok(Json(settings))
}

/// PUT /v1/courses/{course}/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Path(course): Path<String>,
    Json(request): Json<UpdateSettingsRequest>,
) -> HandlerResult<ShiftSettings> {
    let repo = state.repository.as_ref();
    let mut settings =
        services::get_course_settings(repo, state.clock.as_ref(), &CourseKey::new(course)).await?;
    request.apply(&mut settings);
    let saved = services::save_settings(repo, &settings).await?;
    Ok(Json(saved))
}

/// GET /v1/courses/{course}/plans
pub async fn list_plans(
    State(state): State<AppState>,
    Path(course): Path<String>,
) -> HandlerResult<PlanListResponse> {
    let course = CourseKey::new(course);
    let repo = state.repository.as_ref();
    let plans = services::get_course_plans(repo, &course).await?;
    let next = services::get_next_plan(repo, state.clock.as_ref(), &course).await?;
    Ok(Json(PlanListResponse { plans, next }))
}

/// POST /v1/courses/{course}/plans
pub async fn create_plan(
    State(state): State<AppState>,
    Path(course): Path<String>,
    Json(request): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<PlannedRun>), AppError> {
    let plan = services::create_plan(
        state.repository.as_ref(),
        &CourseKey::new(course),
        request.start_date,
        request.name.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// DELETE /v1/plans/{id}
pub async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::delete_plan(state.repository.as_ref(), PlannedRunId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/plans/{id}/launch
///
/// The body is optional; an empty body launches with the generated name.
pub async fn launch_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    request: Option<Json<LaunchPlanRequest>>,
) -> Result<(StatusCode, Json<ShiftGroup>), AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let shift = services::launch_shift(
        state.repository.as_ref(),
        PlannedRunId::new(id),
        request.name.as_deref(),
        request.days_add,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(shift)))
}

/// POST /v1/courses/{course}/update-shifts
pub async fn update_shifts(
    State(state): State<AppState>,
    Path(course): Path<String>,
) -> HandlerResult<UpdateReport> {
    let report = services::update_shifts(
        state.repository.as_ref(),
        state.clock.as_ref(),
        &CourseKey::new(course),
    )
    .await?;
    Ok(Json(report))
}

// =============================================================================
// Memberships
// =============================================================================

/// GET /v1/courses/{course}/users/{user}/membership
pub async fn get_membership(
    State(state): State<AppState>,
    Path((course, user)): Path<(String, String)>,
) -> HandlerResult<MembershipResponse> {
    let course_key = CourseKey::new(course);
    let user = UserId::new(user);
    let repo = state.repository.as_ref();

    let membership = services::get_user_membership(repo, &user, &course_key).await?;
    let shift = match &membership {
        Some(m) => Some(services::get_shift_group(repo, m.shift_group_id).await?),
        None => None,
    };

    Ok(Json(MembershipResponse {
        user,
        course_key,
        membership,
        shift,
    }))
}

/// POST /v1/courses/{course}/users/{user}/transfer
///
/// Both groups must belong to the course in the path.
pub async fn transfer_user(
    State(state): State<AppState>,
    Path((course, user)): Path<(String, String)>,
    Json(request): Json<TransferRequest>,
) -> HandlerResult<TransferResponse> {
    let course_key = CourseKey::new(course);
    let repo = state.repository.as_ref();

    for id in [request.from_group, request.to_group].into_iter().flatten() {
        let group = services::get_shift_group(repo, id).await?;
        if group.course_key != course_key {
            return Err(services::ShiftError::CourseMismatch {
                from: group.course_key.to_string(),
                to: course_key.to_string(),
            }
            .into());
        }
    }

    let membership = services::transfer_user(
        repo,
        &UserId::new(user),
        request.from_group,
        request.to_group,
    )
    .await?;
    Ok(Json(TransferResponse { membership }))
}
