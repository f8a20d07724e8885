use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::models::{ATTENDANCE_PAGE_SIZE, PageQuery, PageRequest};
use crate::service::attendance::{AttendanceService, MarkAttendance};
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde_json::json;

/// Staff marking of one student-day. Overwrites an earlier mark.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/mark",
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = crate::model::attendance::Attendance),
        (status = 400, description = "Invalid date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Students cannot mark attendance"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    payload: web::Json<MarkAttendance>,
) -> Result<HttpResponse, AppError> {
    let row = service.mark(&auth.actor(), &payload).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance marked",
        "attendance": row
    })))
}

/// Present days against school days so far this month
#[utoipa::path(
    get,
    path = "/api/v1/attendance/stats/{student_id}",
    params(
        ("student_id" = u64, Path, description = "Student user id")
    ),
    responses(
        (status = 200, description = "Monthly attendance figures", body = crate::service::attendance::AttendanceStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Students only see their own figures")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_stats(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let today = Utc::now().date_naive();
    let stats = service
        .stats(&auth.actor(), path.into_inner(), today)
        .await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[utoipa::path(
    get,
    path = "/api/v1/attendance/history/{student_id}",
    params(
        ("student_id" = u64, Path, description = "Student user id"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Attendance rows, newest date first", body = crate::models::AttendancePage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Students only see their own history")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_history(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::from_query(&query, ATTENDANCE_PAGE_SIZE);
    let history = service
        .history(&auth.actor(), path.into_inner(), page)
        .await?;
    Ok(HttpResponse::Ok().json(history))
}
