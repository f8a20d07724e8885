use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::service::analytics::AnalyticsService;
use actix_web::{HttpResponse, web};

/// Institution-wide counts and the latest leave requests (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/analytics/summary",
    responses(
        (status = 200, description = "Summary counts", body = crate::service::analytics::AnalyticsSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Analytics"
)]
pub async fn summary(
    auth: AuthUser,
    service: web::Data<AnalyticsService>,
) -> Result<HttpResponse, AppError> {
    let summary = service.summary(&auth.actor()).await?;
    Ok(HttpResponse::Ok().json(summary))
}
