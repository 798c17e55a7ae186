use crate::{
    api::{attendance, presensi},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Helper to build per-scope limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let governor_config = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish();

    match governor_config {
        Some(cfg) => Governor::new(&cfg),
        // zero period or burst, excluded by the clamps above
        None => Governor::new(&GovernorConfig::default()),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                    .service(
                        web::resource("/break/start").route(web::post().to(attendance::break_start)),
                    )
                    .service(web::resource("/break/end").route(web::put().to(attendance::break_end)))
                    .service(
                        web::resource("/check-out").route(web::put().to(attendance::check_out)),
                    )
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(
                        web::resource("/location")
                            .route(web::post().to(attendance::validate_location)),
                    ),
            )
            .service(
                web::scope("/presensi")
                    // /presensi/manual
                    .service(
                        web::resource("/manual")
                            .route(web::post().to(presensi::create_manual_presensi)),
                    )
                    // /presensi/recap/{employee_id}
                    .service(
                        web::resource("/recap/{employee_id}")
                            .route(web::get().to(presensi::monthly_recap)),
                    )
                    // /presensi/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(presensi::update_presensi))
                            .route(web::delete().to(presensi::delete_presensi)),
                    )
                    // /presensi/{id}/recalculate
                    .service(
                        web::resource("/{id}/recalculate")
                            .route(web::post().to(presensi::recalculate_presensi)),
                    ),
            ),
    );
}
