use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{BonusDropStatus, DrawStatus, OpsMode, RewardKind, TicketStatus};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::draw::get_today,
        handlers::draw::enter_today,
        handlers::reward::get_recent,
        handlers::ops::get_mode,
        handlers::cron::run_cycle,
        handlers::admin::login,
        handlers::admin::set_ops_mode,
        handlers::admin::force_close,
        handlers::admin::cancel_bonuses,
        handlers::admin::rollback_bonus,
        handlers::admin::list_bonus_drops,
        handlers::admin::schedule_bonus_drop,
        handlers::admin::resolve_today,
        handlers::admin::mark_reward_paid,
    ),
    components(
        schemas(
            DrawStatus,
            TicketStatus,
            BonusDropStatus,
            RewardKind,
            OpsMode,
            DrawSummaryResponse,
            EnterDrawRequest,
            TicketResponse,
            RewardResponse,
            RecentRewardsQuery,
            MarkRewardPaidRequest,
            OpsModeResponse,
            SetOpsModeRequest,
            ScheduleBonusDropRequest,
            BonusDropResponse,
            AdminLoginRequest,
            AdminLoginResponse,
            PanicActionResponse,
            ManualResolveResponse,
            BonusCycleSummary,
            DrawCycleSummary,
            CycleSummary,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "draw", description = "Daily draw API"),
        (name = "reward", description = "Reward records API"),
        (name = "ops", description = "Automation mode API"),
        (name = "cron", description = "Orchestration trigger"),
        (name = "admin", description = "Administrative and emergency actions"),
    ),
    info(
        title = "Daily Draw Backend API",
        version = "1.0.0",
        description = "Daily draw lifecycle and fair selection REST API"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
