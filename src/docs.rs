use crate::api::leave_request::LeaveDecision;
use crate::model::attendance::Attendance;
use crate::model::leave_request::{LeaveAction, LeaveRequest, LeaveStatus, LeaveType};
use crate::model::role::Role;
use crate::model::user::User;
use crate::models::{AttendancePage, LeavePage, LoginReqDto, RegisterReq, UserPage};
use crate::service::analytics::{AnalyticsSummary, AttendanceCounts, LeaveCounts, UserCounts};
use crate::service::attendance::{AttendanceStats, MarkAttendance};
use crate::service::leave::LeaveApplication;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campus Leave API",
        version = "1.0.0",
        description = r#"
## Student Leave & Attendance Service

Students apply for leave, faculty and wardens approve or reject it, and an
approval back-fills the student's attendance with absences for every day of
the leave that has no record yet. The student is emailed the outcome.

### Roles
- **student**: apply for leave, view own leaves and attendance
- **faculty / warden**: decide leaves, mark attendance, view all leaves
- **admin**: mark attendance, list users, analytics

### Security
Protected endpoints take a **JWT Bearer** token from `/api/v1/auth/login`.

### Response Format
- JSON bodies; errors are `{"error": "<message>"}`
- List endpoints are paginated with `?page=`
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,

        crate::api::leave_request::apply_leave,
        crate::api::leave_request::my_leaves,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::act_on_leave,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::attendance_stats,
        crate::api::attendance::attendance_history,

        crate::api::users::list_users,
        crate::api::users::get_user,

        crate::api::analytics::summary
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            Role,
            User,
            UserPage,
            LeaveType,
            LeaveStatus,
            LeaveAction,
            LeaveApplication,
            LeaveDecision,
            LeaveRequest,
            LeavePage,
            MarkAttendance,
            Attendance,
            AttendanceStats,
            AttendancePage,
            AnalyticsSummary,
            UserCounts,
            LeaveCounts,
            AttendanceCounts
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Leave", description = "Leave application and approval APIs"),
        (name = "Attendance", description = "Attendance marking and reporting APIs"),
        (name = "Users", description = "User directory APIs"),
        (name = "Analytics", description = "Institution-wide summaries"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/auth/register",
            "/api/v1/auth/login",
            "/api/v1/leaves/apply",
            "/api/v1/leaves/{leave_id}/{action}",
            "/api/v1/attendance/history/{student_id}",
            "/api/v1/analytics/summary",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"))
        );
    }
}
