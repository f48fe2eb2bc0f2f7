use crate::entities::UserRole;
use crate::handlers::{authorize, respond, respond_created};
use crate::models::*;
use crate::services::{PurchaseService, SessionService};
use actix_web::{HttpRequest, HttpResponse, Result, web};

const STUDENT: &[UserRole] = &[UserRole::Student];

#[utoipa::path(
    post,
    path = "/purchases",
    tag = "purchases",
    request_body = CheckoutRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "购买成功", body = PurchaseResponse),
        (status = 400, description = "套餐不可购买"),
        (status = 404, description = "套餐不存在")
    )
)]
pub async fn checkout(
    session_service: web::Data<SessionService>,
    purchase_service: web::Data<PurchaseService>,
    req: HttpRequest,
    request: web::Json<CheckoutRequest>,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, STUDENT).await?;
        purchase_service
            .checkout(session.user_id, request.into_inner())
            .await
    }
    .await;
    respond_created(result)
}

#[utoipa::path(
    get,
    path = "/purchases",
    tag = "purchases",
    params(PaginationParams),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "我的购买记录"))
)]
pub async fn list_my_purchases(
    session_service: web::Data<SessionService>,
    purchase_service: web::Data<PurchaseService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, STUDENT).await?;
        purchase_service
            .list_student_purchases(session.user_id, &query)
            .await
    }
    .await;
    respond(result)
}

/// 是否持有有效的私教套餐，用于解锁私教功能
#[utoipa::path(
    get,
    path = "/purchases/coaching-access",
    tag = "purchases",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "私教权限", body = CoachingAccessResponse))
)]
pub async fn coaching_access(
    session_service: web::Data<SessionService>,
    purchase_service: web::Data<PurchaseService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, STUDENT).await?;
        purchase_service.coaching_access(session.user_id).await
    }
    .await;
    respond(result)
}

pub fn purchases_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/purchases")
            .route("", web::post().to(checkout))
            .route("", web::get().to(list_my_purchases))
            .route("/coaching-access", web::get().to(coaching_access)),
    );
}
