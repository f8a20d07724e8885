use std::str::FromStr;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::leave_request::LeaveAction;
use crate::models::{LEAVE_PAGE_SIZE, PageQuery, PageRequest};
use crate::service::leave::{LeaveApplication, LeaveService};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

/// Optional body of an approve/reject call.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LeaveDecision {
    #[schema(example = "get well soon")]
    pub remarks: Option<String>,
}

/// Student leave application
#[utoipa::path(
    post,
    path = "/api/v1/leaves/apply",
    request_body(
        content = LeaveApplication,
        description = "Leave application payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave application submitted", body = Object, example = json!({
            "message": "Leave application submitted",
            "id": 17
        })),
        (status = 400, description = "Invalid leave type, reason or dates"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only students apply for leave")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<LeaveApplication>,
) -> Result<HttpResponse, AppError> {
    let leave = service.submit(&auth.actor(), &payload).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave application submitted",
        "id": leave.id
    })))
}

/// Leaves filed by the caller, newest first
#[utoipa::path(
    get,
    path = "/api/v1/leaves/my",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of the caller's leaves", body = crate::models::LeavePage),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::from_query(&query, LEAVE_PAGE_SIZE);
    let leaves = service.list_own(&auth.actor(), page).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

/// Every leave request, newest first (faculty and wardens)
#[utoipa::path(
    get,
    path = "/api/v1/leaves",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of leave requests", body = crate::models::LeavePage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::from_query(&query, LEAVE_PAGE_SIZE);
    let leaves = service.list_all(&auth.actor(), page).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

#[utoipa::path(
    get,
    path = "/api/v1/leaves/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "Leave request id")
    ),
    responses(
        (status = 200, description = "Leave request", body = crate::model::leave_request::LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Another student's leave"),
        (status = 404, description = "Leave not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let leave = service.get(&auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// Approve or reject a pending leave
#[utoipa::path(
    put,
    path = "/api/v1/leaves/{leave_id}/{action}",
    params(
        ("leave_id" = u64, Path, description = "Leave request id"),
        ("action" = LeaveAction, Path, description = "approve or reject")
    ),
    request_body(
        content = LeaveDecision,
        description = "Optional remarks for the student",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave decided", body = Object, example = json!({
            "message": "Leave request approved",
            "status": "approved"
        })),
        (status = 400, description = "Unknown action"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only faculty and wardens decide leaves"),
        (status = 404, description = "Leave not found"),
        (status = 409, description = "Leave already decided"),
        (status = 500, description = "Decision stored but attendance reconciliation failed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn act_on_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<(u64, String)>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let (leave_id, action) = path.into_inner();
    let action = LeaveAction::from_str(&action)
        .map_err(|_| AppError::validation("Invalid action. Use approve or reject"))?;
    let decision = parse_decision(&body)?;
    let remarks = decision
        .remarks
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    let leave = service.act(leave_id, action, &auth.actor(), remarks).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave request {}", leave.status),
        "status": leave.status
    })))
}

/// An empty body means no remarks; anything else must be a valid decision.
fn parse_decision(body: &[u8]) -> Result<LeaveDecision, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(LeaveDecision::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::validation(format!("Bad request body: {e}")))
}
