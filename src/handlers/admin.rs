use crate::entities::UserRole;
use crate::handlers::{authorize, respond};
use crate::models::*;
use crate::services::{ProfileService, RevenueService, SessionService};
use actix_web::{HttpRequest, HttpResponse, Result, web};

const ADMIN: &[UserRole] = &[UserRole::Admin];

#[utoipa::path(
    get,
    path = "/admin/profiles",
    tag = "admin",
    params(ProfileQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "用户列表"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn list_profiles(
    session_service: web::Data<SessionService>,
    profile_service: web::Data<ProfileService>,
    req: HttpRequest,
    query: web::Query<ProfileQuery>,
) -> Result<HttpResponse> {
    let result = async {
        authorize(&req, &session_service, ADMIN).await?;
        profile_service.list_profiles(&query).await
    }
    .await;
    respond(result)
}

/// 平台营收：总额、10% 佣金、教练分成及各店铺排名
#[utoipa::path(
    get,
    path = "/admin/revenue",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "营收报表", body = RevenueReport),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn revenue_report(
    session_service: web::Data<SessionService>,
    revenue_service: web::Data<RevenueService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result = async {
        authorize(&req, &session_service, ADMIN).await?;
        revenue_service.platform_report().await
    }
    .await;
    respond(result)
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/profiles", web::get().to(list_profiles))
            .route("/revenue", web::get().to(revenue_report)),
    );
}
