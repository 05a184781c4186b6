use actix_web::{HttpResponse, Result, web};
use chrono::Utc;

use crate::models::*;
use crate::services::OrchestrationService;

/// 外部定时触发（Authorization: Bearer <CRON_SECRET>，由中间件校验）
#[utoipa::path(
    post,
    path = "/cron/cycle",
    tag = "cron",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "本轮汇总", body = CycleSummary),
        (status = 401, description = "密钥无效"),
        (status = 503, description = "未配置 CRON_SECRET")
    )
)]
pub async fn run_cycle(orchestration: web::Data<OrchestrationService>) -> Result<HttpResponse> {
    let summary = orchestration.run_cycle(Utc::now()).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
}

pub fn cron_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/cron").route("/cycle", web::post().to(run_cycle)));
}
