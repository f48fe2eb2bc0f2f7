use crate::handlers::{respond, respond_created};
use crate::middlewares::current_identity;
use crate::models::*;
use crate::services::MessageService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/messages",
    tag = "messages",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "会话列表", body = [ConversationSummary]))
)]
pub async fn list_conversations(
    message_service: web::Data<MessageService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let identity = match current_identity(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };
    respond(message_service.list_conversations(identity.user_id).await)
}

#[utoipa::path(
    post,
    path = "/messages",
    tag = "messages",
    request_body = SendMessageRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "发送成功", body = MessageResponse),
        (status = 404, description = "收件人不存在")
    )
)]
pub async fn send_message(
    message_service: web::Data<MessageService>,
    req: HttpRequest,
    request: web::Json<SendMessageRequest>,
) -> Result<HttpResponse> {
    let identity = match current_identity(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };
    respond_created(
        message_service
            .send(identity.user_id, request.into_inner())
            .await,
    )
}

#[utoipa::path(
    get,
    path = "/messages/{user_id}",
    tag = "messages",
    params(("user_id" = i64, Path, description = "对方用户ID"), PaginationParams),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "会话消息（按时间正序）"))
)]
pub async fn get_conversation(
    message_service: web::Data<MessageService>,
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let identity = match current_identity(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };
    respond(
        message_service
            .get_conversation(identity.user_id, path.into_inner(), &query)
            .await,
    )
}

#[utoipa::path(
    put,
    path = "/messages/{user_id}/read",
    tag = "messages",
    params(("user_id" = i64, Path, description = "对方用户ID")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "已标记为已读", body = AffectedRows))
)]
pub async fn mark_conversation_read(
    message_service: web::Data<MessageService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let identity = match current_identity(&req) {
        Ok(identity) => identity,
        Err(e) => return Ok(e.error_response()),
    };
    respond(
        message_service
            .mark_conversation_read(identity.user_id, path.into_inner())
            .await,
    )
}

pub fn messages_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/messages")
            .route("", web::get().to(list_conversations))
            .route("", web::post().to(send_message))
            .route("/{user_id}", web::get().to(get_conversation))
            .route("/{user_id}/read", web::put().to(mark_conversation_read)),
    );
}
