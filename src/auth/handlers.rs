use crate::{
    auth::{
        auth::bearer_token,
        jwt::{generate_access_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::AppError,
    model::{
        role::Role,
        user::NewUser,
    },
    models::{LoginReqDto, RegisterReq},
    store::{RecordStore, StoreError},
};
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;
use tracing::{debug, info, instrument};

/// Only an admin may create staff accounts; nobody may create an admin.
fn check_registration_rights(
    role: Role,
    req: &HttpRequest,
    config: &Config,
) -> Result<(), AppError> {
    match role {
        Role::Student => Ok(()),
        Role::Admin => Err(AppError::forbidden(
            "Admin user cannot be registered via API",
        )),
        Role::Faculty | Role::Warden => {
            let token = bearer_token(req).ok_or_else(|| {
                AppError::forbidden("Admin token required to register faculty/warden")
            })?;
            match verify_token(token, &config.jwt_secret) {
                Ok(claims) if claims.role == Role::Admin => Ok(()),
                _ => Err(AppError::forbidden(
                    "Only admin can register faculty/warden",
                )),
            }
        }
    }
}

/// User registration handler
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User created", body = Object, example = json!({
            "message": "User created",
            "user": { "id": 42, "name": "Asha Rao", "email": "asha@college.edu" }
        })),
        (status = 400, description = "Invalid registration data"),
        (status = 403, description = "Role may not be registered by this caller"),
        (status = 409, description = "Email already in use")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip_all, fields(email = %user.email, role = %user.role))]
pub async fn register(
    req: HttpRequest,
    user: web::Json<RegisterReq>,
    store: web::Data<dyn RecordStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let user = user.into_inner();
    user.validate()?;
    check_registration_rights(user.role, &req, &config)?;

    let password_hash = hash_password(&user.password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

    let created = store
        .insert_user(NewUser {
            name: user.name.trim().to_string(),
            email: user.email.trim().to_lowercase(),
            password_hash,
            role: user.role,
            dept: user.dept.trim().to_string(),
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate => AppError::conflict("Email already in use"),
            other => other.into(),
        })?;

    info!(user_id = created.id, "User registered");

    Ok(HttpResponse::Created().json(json!({
        "message": "User created",
        "user": {
            "id": created.id,
            "name": created.name,
            "email": created.email,
        }
    })))
}

/// Exchanges credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful", body = Object, example = json!({
            "token": "eyJhbGciOiJIUzI1NiJ9...",
            "user": { "id": 42, "name": "Asha Rao", "email": "asha@college.edu", "role": "student" }
        })),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip_all, fields(email = %user.email))]
pub async fn login(
    user: web::Json<LoginReqDto>,
    store: web::Data<dyn RecordStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    if user.email.trim().is_empty() || user.password.is_empty() {
        return Err(AppError::validation("Email and password required"));
    }

    let account = match store
        .find_account_by_email(&user.email.trim().to_lowercase())
        .await?
    {
        Some(account) => account,
        None => {
            info!("Invalid credentials: user not found");
            return Err(AppError::Unauthenticated("Invalid credentials".into()));
        }
    };

    if let Err(e) = verify_password(&user.password, &account.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::Unauthenticated("Invalid credentials".into()));
    }

    debug!(user_id = account.user.id, "Password verified");

    let token = generate_access_token(
        account.user.id,
        account.user.email.clone(),
        account.user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;

    info!(user_id = account.user.id, "Login successful");

    Ok(HttpResponse::Ok().json(json!({
        "token": token,
        "user": {
            "id": account.user.id,
            "name": account.user.name,
            "email": account.user.email,
            "role": account.user.role,
        }
    })))
}

/// Creates the configured admin account unless it already exists.
pub async fn seed_admin(store: &dyn RecordStore, email: &str, password: &str) -> anyhow::Result<()> {
    let email = email.trim().to_lowercase();
    if store.find_account_by_email(&email).await?.is_some() {
        debug!(%email, "Admin account already present");
        return Ok(());
    }

    let password_hash = hash_password(password)
        .map_err(|e| anyhow::anyhow!("failed to hash admin password: {e}"))?;

    match store
        .insert_user(NewUser {
            name: "Administrator".to_string(),
            email: email.clone(),
            password_hash,
            role: Role::Admin,
            dept: "Administration".to_string(),
        })
        .await
    {
        Ok(admin) => info!(user_id = admin.id, %email, "Admin account created"),
        Err(StoreError::Duplicate) => debug!(%email, "Admin account created concurrently"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
