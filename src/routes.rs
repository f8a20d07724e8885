use crate::{
    api::{analytics, attendance, leave_request, users},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes, matched before the protected scope sharing the prefix
    cfg.service(
        web::scope(&format!("{}/auth", config.api_prefix))
            .service(
                web::resource("/login")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter)
                    .route(web::post().to(handlers::register)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .configure(api_routes),
    );
}

/// Everything behind the bearer token, relative to the API prefix.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leaves")
            // /leaves
            .service(web::resource("").route(web::get().to(leave_request::leave_list)))
            .service(web::resource("/apply").route(web::post().to(leave_request::apply_leave)))
            .service(web::resource("/my").route(web::get().to(leave_request::my_leaves)))
            // /leaves/{id}
            .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
            // /leaves/{id}/approve, /leaves/{id}/reject
            .service(
                web::resource("/{id}/{action}").route(web::put().to(leave_request::act_on_leave)),
            ),
    )
    .service(
        web::scope("/attendance")
            .service(web::resource("/mark").route(web::post().to(attendance::mark_attendance)))
            .service(
                web::resource("/stats/{student_id}")
                    .route(web::get().to(attendance::attendance_stats)),
            )
            .service(
                web::resource("/history/{student_id}")
                    .route(web::get().to(attendance::attendance_history)),
            ),
    )
    .service(
        web::scope("/users")
            .service(web::resource("").route(web::get().to(users::list_users)))
            .service(web::resource("/{id}").route(web::get().to(users::get_user))),
    )
    .service(
        web::scope("/analytics")
            .service(web::resource("/summary").route(web::get().to(analytics::summary))),
    );
}
