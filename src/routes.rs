use crate::{
    api::{attendance, employee, leave, organization, performance},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{guard, middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let Some(protected_limiter) = build_limiter(config.rate_protected_per_min) else {
        tracing::error!("Invalid protected rate limit, routes not registered");
        return;
    };
    let Some(submit_limiter) = build_limiter(config.rate_submit_per_min) else {
        tracing::error!("Invalid submit rate limit, routes not registered");
        return;
    };
    let submit_limiter = Arc::new(submit_limiter);

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/organization")
                    // /organization
                    .service(
                        web::resource("")
                            .route(web::get().to(organization::list_orgs))
                            .route(web::post().to(organization::create_org)),
                    )
                    // /organization/{id}/parent
                    .service(
                        web::resource("/{id}/parent")
                            .route(web::put().to(organization::reparent)),
                    ),
            )
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/{id}
                    .service(web::resource("/{id}").route(web::get().to(employee::get_employee))),
            )
            .service(
                web::scope("/leave")
                    // POST /leave, submissions get their own limiter
                    .service(
                        web::resource("")
                            .guard(guard::Post())
                            .wrap(submit_limiter.clone())
                            .route(web::post().to(leave::submit_leave)),
                    )
                    // GET /leave
                    .service(web::resource("").route(web::get().to(leave::leave_list)))
                    // static segments before /{id}
                    .service(web::resource("/mine").route(web::get().to(leave::my_leaves)))
                    .service(web::resource("/tasks").route(web::get().to(leave::approval_tasks)))
                    .service(web::resource("/policy").route(web::put().to(leave::set_policy)))
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave::get_leave)))
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(leave::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(leave::reject_leave)),
                    )
                    .service(
                        web::resource("/{id}/complete")
                            .route(web::put().to(leave::complete_leave)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::put().to(attendance::check_out))
                            .route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/records")
                            .route(web::get().to(attendance::monthly_records))
                            .route(web::put().to(attendance::record_status)),
                    )
                    .service(
                        web::resource("/shifts")
                            .route(web::get().to(attendance::list_shifts))
                            .route(web::post().to(attendance::create_shift)),
                    )
                    .service(
                        web::resource("/shifts/active")
                            .route(web::get().to(attendance::current_shift)),
                    )
                    .service(
                        web::resource("/shifts/{id}/activate")
                            .route(web::put().to(attendance::activate_shift)),
                    ),
            )
            .service(
                web::scope("/performance")
                    .service(
                        web::resource("/cycles").route(web::post().to(performance::create_cycle)),
                    )
                    .service(
                        web::resource("/cycles/{id}").route(web::get().to(performance::get_cycle)),
                    )
                    .service(
                        web::resource("/cycles/{id}/evaluations")
                            .route(web::get().to(performance::cycle_evaluations)),
                    )
                    .service(
                        web::resource("/cycles/{id}/refresh")
                            .route(web::post().to(performance::refresh_cycle)),
                    )
                    .service(
                        web::resource("/evaluations")
                            .route(web::post().to(performance::create_evaluation)),
                    )
                    .service(
                        web::resource("/evaluations/{id}")
                            .route(web::get().to(performance::get_evaluation)),
                    )
                    .service(
                        web::resource("/evaluations/{id}/refresh")
                            .route(web::post().to(performance::refresh_evaluation)),
                    )
                    .service(
                        web::resource("/evaluations/{id}/final-score")
                            .route(web::put().to(performance::set_final_score)),
                    ),
            ),
    );
}
