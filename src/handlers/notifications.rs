use crate::handlers::respond;
use crate::middlewares::current_identity;
use crate::models::*;
use crate::services::NotificationService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    params(NotificationQuery),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "通知列表"))
)]
pub async fn list_notifications(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
    query: web::Query<NotificationQuery>,
) -> Result<HttpResponse> {
    let identity = match current_identity(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };
    respond(notification_service.list(identity.user_id, &query).await)
}

#[utoipa::path(
    put,
    path = "/notifications/{id}/read",
    tag = "notifications",
    params(("id" = i64, Path, description = "通知ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "已读"),
        (status = 404, description = "通知不存在")
    )
)]
pub async fn mark_read(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let identity = match current_identity(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };
    respond(
        notification_service
            .mark_read(identity.user_id, path.into_inner())
            .await,
    )
}

#[utoipa::path(
    put,
    path = "/notifications/read-all",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "全部已读", body = AffectedRows))
)]
pub async fn mark_all_read(
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let identity = match current_identity(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };
    respond(notification_service.mark_all_read(identity.user_id).await)
}

pub fn notifications_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(list_notifications))
            .route("/read-all", web::put().to(mark_all_read))
            .route("/{id}/read", web::put().to(mark_read)),
    );
}
