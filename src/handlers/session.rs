use crate::handlers::respond;
use crate::middlewares::{current_identity, optional_identity};
use crate::models::*;
use crate::services::{AccessGate, GateDecision, SessionService};
use actix_web::{HttpRequest, HttpResponse, Result, web};

#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "当前会话", body = SessionInfo),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_session(
    session_service: web::Data<SessionService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result = match current_identity(&req) {
        Ok(identity) => Ok(session_service.resolve(&identity).await),
        Err(e) => Err(e),
    };
    respond(result)
}

/// 前端路由守卫：返回放行或重定向目标
#[utoipa::path(
    post,
    path = "/session/gate",
    tag = "session",
    request_body = GateRequest,
    responses((status = 200, description = "路由判定结果", body = GateResponse))
)]
pub async fn gate(
    session_service: web::Data<SessionService>,
    req: HttpRequest,
    request: web::Json<GateRequest>,
) -> Result<HttpResponse> {
    let mut access_gate = AccessGate::for_path(&request.path);

    let role = match optional_identity(&req) {
        Some(identity) => Some(session_service.resolve(&identity).await.role),
        None => None,
    };

    let response = match access_gate.resolve(role) {
        GateDecision::Proceed => GateResponse::Proceed { role },
        GateDecision::Redirect(to) => GateResponse::Redirect { to },
    };
    respond(Ok(response))
}

pub fn session_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/session")
            .route("", web::get().to(get_session))
            .route("/gate", web::post().to(gate)),
    );
}
