use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::models::*;
use crate::services::OpsService;

#[utoipa::path(
    get,
    path = "/ops/mode",
    tag = "ops",
    responses(
        (status = 200, description = "当前自动化模式", body = OpsModeResponse)
    )
)]
pub async fn get_mode(ops_service: web::Data<OpsService>) -> Result<HttpResponse> {
    match ops_service.status().await {
        Ok(status) => Ok(HttpResponse::Ok().json(ApiResponse::success(status))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn ops_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/ops").route("/mode", web::get().to(get_mode)));
}
