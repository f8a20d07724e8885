use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::service::analytics::AnalyticsService;
use crate::service::attendance::AttendanceService;
use crate::service::dispatcher::NotificationDispatcher;
use crate::service::leave::LeaveService;
use crate::service::reconciler::AttendanceReconciler;
use crate::store::{MySqlStore, RecordStore};
use crate::utils::mailer::SmtpNotifier;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Campus leave service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;
    let store: Arc<dyn RecordStore> = Arc::new(MySqlStore::new(pool));

    match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(password)) => auth::handlers::seed_admin(store.as_ref(), email, password)
            .await
            .context("Failed to seed admin account")?,
        _ => warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set, no admin account seeded"),
    }

    let notifier = SmtpNotifier::new(&config.smtp).context("Invalid SMTP settings")?;
    let dispatcher = NotificationDispatcher::start(Arc::new(notifier));

    let leave_service = Data::new(LeaveService::new(
        store.clone(),
        AttendanceReconciler::new(store.clone()),
        dispatcher,
    ));
    let attendance_service = Data::new(AttendanceService::new(store.clone()));
    let analytics_service = Data::new(AnalyticsService::new(store.clone()));
    let store_data: Data<dyn RecordStore> = Data::from(store);

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store_data.clone())
            .app_data(leave_service.clone())
            .app_data(attendance_service.clone())
            .app_data(analytics_service.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
