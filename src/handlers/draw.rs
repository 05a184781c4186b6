use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Utc;

use crate::models::*;
use crate::services::DrawService;

#[utoipa::path(
    get,
    path = "/draws/today",
    tag = "draw",
    responses(
        (status = 200, description = "今日开奖概要", body = DrawSummaryResponse),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn get_today(draw_service: web::Data<DrawService>) -> Result<HttpResponse> {
    match draw_service.today_summary(Utc::now()).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(summary))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/draws/today/entries",
    tag = "draw",
    request_body = EnterDrawRequest,
    responses(
        (status = 200, description = "参与成功", body = TicketResponse),
        (status = 400, description = "钱包地址无效或已截止")
    )
)]
pub async fn enter_today(
    draw_service: web::Data<DrawService>,
    request: web::Json<EnterDrawRequest>,
) -> Result<HttpResponse> {
    match draw_service.enter_draw(Utc::now(), &request.wallet).await {
        Ok(ticket) => Ok(HttpResponse::Ok().json(ApiResponse::success(TicketResponse::from(ticket)))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn draw_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/draws")
            .route("/today", web::get().to(get_today))
            .route("/today/entries", web::post().to(enter_today)),
    );
}
