use crate::{
    api::{employee, health, payroll},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        // only None for a zero period or burst, which the clamps above rule out
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Public
    cfg.service(web::resource("/health").route(web::get().to(health::health)));

    // Protected: every handler takes an AuthUser
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(build_limiter(config.rate_protected_per_min))
            .service(
                web::scope("/payrolls")
                    // /payrolls
                    .service(
                        web::resource("")
                            .route(web::get().to(payroll::list_payrolls))
                            .route(web::post().to(payroll::submit_payroll)),
                    )
                    // /payrolls/monthly
                    .service(
                        web::resource("/monthly").route(web::get().to(payroll::monthly_payrolls)),
                    )
                    // /payrolls/period?week_start&week_end
                    .service(
                        web::resource("/period")
                            .route(web::get().to(payroll::get_payroll_period))
                            .route(web::delete().to(payroll::delete_payroll_period)),
                    )
                    // /payrolls/{id} or /payrolls/{week_start}_{week_end}
                    .service(
                        web::resource("/{key}").route(web::delete().to(payroll::delete_payroll)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::get().to(employee::list_employees))
                            .route(web::post().to(employee::create_employee)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            ),
    );
}
