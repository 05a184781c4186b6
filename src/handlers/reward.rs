use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::models::*;
use crate::services::RewardService;

#[utoipa::path(
    get,
    path = "/rewards/recent",
    tag = "reward",
    params(
        ("limit" = Option<u64>, Query, description = "返回条数 (默认 20，最大 100)")
    ),
    responses(
        (status = 200, description = "最近中奖记录", body = [RewardResponse])
    )
)]
pub async fn get_recent(
    reward_service: web::Data<RewardService>,
    query: web::Query<RecentRewardsQuery>,
) -> Result<HttpResponse> {
    match reward_service.recent(query.limit).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn reward_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/rewards").route("/recent", web::get().to(get_recent)));
}
