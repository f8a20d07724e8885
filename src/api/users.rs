use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Page, PageQuery, PageRequest, USER_PAGE_SIZE};
use crate::service::policy::{self, Action};
use crate::store::RecordStore;
use actix_web::{HttpResponse, web};

/// Registered users, password hashes never included (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of users", body = crate::models::UserPage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    policy::authorize(&auth.actor(), Action::ListUsers)?;

    let page = PageRequest::from_query(&query, USER_PAGE_SIZE);
    let total = store.count_users().await?;
    let items = store.list_users(page.offset(), page.limit()).await?;
    Ok(HttpResponse::Ok().json(Page::new(page, total, items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User profile", body = crate::model::user::User),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn get_user(
    _auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let user = store
        .find_user(path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(HttpResponse::Ok().json(user))
}
