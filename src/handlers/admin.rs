use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Utc;

use crate::models::*;
use crate::services::{AdminService, AuthService};

#[utoipa::path(
    post,
    path = "/admin/auth/login",
    tag = "admin",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "登录成功", body = AdminLoginResponse),
        (status = 401, description = "密码错误")
    )
)]
pub async fn login(
    auth_service: web::Data<AuthService>,
    request: web::Json<AdminLoginRequest>,
) -> Result<HttpResponse> {
    match auth_service.admin_login(&request.password) {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/ops/mode",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = SetOpsModeRequest,
    responses(
        (status = 200, description = "更新成功", body = OpsModeResponse),
        (status = 423, description = "管理操作已冻结")
    )
)]
pub async fn set_ops_mode(
    admin_service: web::Data<AdminService>,
    request: web::Json<SetOpsModeRequest>,
) -> Result<HttpResponse> {
    match admin_service.set_ops_mode(request.mode).await {
        Ok(status) => Ok(HttpResponse::Ok().json(ApiResponse::success(status))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/panic/force-close",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "已关闭今日开奖", body = PanicActionResponse),
        (status = 409, description = "今天还没有开奖"),
        (status = 423, description = "管理操作已冻结")
    )
)]
pub async fn force_close(admin_service: web::Data<AdminService>) -> Result<HttpResponse> {
    match admin_service.force_close_today(Utc::now()).await {
        Ok(res) => Ok(HttpResponse::Ok().json(ApiResponse::success(res))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/panic/cancel-bonuses",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "已取消待触发加奖", body = PanicActionResponse),
        (status = 409, description = "今天还没有开奖或没有可取消的加奖"),
        (status = 423, description = "管理操作已冻结")
    )
)]
pub async fn cancel_bonuses(admin_service: web::Data<AdminService>) -> Result<HttpResponse> {
    match admin_service.cancel_pending_bonuses(Utc::now()).await {
        Ok(res) => Ok(HttpResponse::Ok().json(ApiResponse::success(res))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/panic/rollback-bonus",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "已删除最近一条加奖", body = PanicActionResponse),
        (status = 409, description = "今天还没有开奖或没有可回滚的加奖"),
        (status = 423, description = "管理操作已冻结")
    )
)]
pub async fn rollback_bonus(admin_service: web::Data<AdminService>) -> Result<HttpResponse> {
    match admin_service.rollback_last_bonus(Utc::now()).await {
        Ok(res) => Ok(HttpResponse::Ok().json(ApiResponse::success(res))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/bonus-drops",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "今日加奖列表", body = [BonusDropResponse])
    )
)]
pub async fn list_bonus_drops(admin_service: web::Data<AdminService>) -> Result<HttpResponse> {
    match admin_service.list_bonus_drops(Utc::now()).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/bonus-drops",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = ScheduleBonusDropRequest,
    responses(
        (status = 200, description = "已创建", body = BonusDropResponse),
        (status = 400, description = "请求参数错误"),
        (status = 423, description = "管理操作已冻结")
    )
)]
pub async fn schedule_bonus_drop(
    admin_service: web::Data<AdminService>,
    request: web::Json<ScheduleBonusDropRequest>,
) -> Result<HttpResponse> {
    match admin_service
        .schedule_bonus_drop(Utc::now(), &request.into_inner())
        .await
    {
        Ok(created) => Ok(HttpResponse::Ok().json(ApiResponse::success(created))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/draws/today/resolve",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "开奖结果", body = ManualResolveResponse),
        (status = 409, description = "今天还没有开奖"),
        (status = 423, description = "管理操作已冻结")
    )
)]
pub async fn resolve_today(admin_service: web::Data<AdminService>) -> Result<HttpResponse> {
    match admin_service.resolve_today(Utc::now()).await {
        Ok(res) => Ok(HttpResponse::Ok().json(ApiResponse::success(res))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/rewards/{id}/paid",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "中奖记录 ID")
    ),
    request_body = MarkRewardPaidRequest,
    responses(
        (status = 200, description = "已标记发放", body = RewardResponse),
        (status = 404, description = "记录不存在")
    )
)]
pub async fn mark_reward_paid(
    admin_service: web::Data<AdminService>,
    path: web::Path<i64>,
    request: web::Json<MarkRewardPaidRequest>,
) -> Result<HttpResponse> {
    match admin_service
        .mark_reward_paid(path.into_inner(), &request.settlement_ref)
        .await
    {
        Ok(reward) => Ok(HttpResponse::Ok().json(ApiResponse::success(reward))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/auth/login", web::post().to(login))
            .route("/ops/mode", web::put().to(set_ops_mode))
            .route("/panic/force-close", web::post().to(force_close))
            .route("/panic/cancel-bonuses", web::post().to(cancel_bonuses))
            .route("/panic/rollback-bonus", web::post().to(rollback_bonus))
            .route("/bonus-drops", web::get().to(list_bonus_drops))
            .route("/bonus-drops", web::post().to(schedule_bonus_drop))
            .route("/draws/today/resolve", web::post().to(resolve_today))
            .route("/rewards/{id}/paid", web::post().to(mark_reward_paid)),
    );
}
