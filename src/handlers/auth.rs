use crate::handlers::respond;
use crate::models::*;
use crate::services::AuthService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "注册成功", body = RegisterResponse),
        (status = 400, description = "请求参数错误"),
        (status = 409, description = "邮箱已注册")
    )
)]
pub async fn register(
    auth_service: web::Data<AuthService>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    match auth_service.register(request.into_inner()).await {
        Ok(response) => {
            let message = if response.email_confirmation_required {
                "Check your inbox to confirm your email"
            } else {
                "Account created"
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(response, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "登录成功", body = AuthResponse),
        (status = 401, description = "邮箱或密码错误 / 邮箱未确认"),
        (status = 429, description = "尝试次数过多")
    )
)]
pub async fn login(
    auth_service: web::Data<AuthService>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    respond(auth_service.login(request.into_inner()).await)
}

#[utoipa::path(
    post,
    path = "/auth/confirm",
    tag = "auth",
    request_body = ConfirmEmailRequest,
    responses(
        (status = 200, description = "邮箱已确认", body = AuthResponse),
        (status = 401, description = "确认令牌无效")
    )
)]
pub async fn confirm_email(
    auth_service: web::Data<AuthService>,
    request: web::Json<ConfirmEmailRequest>,
) -> Result<HttpResponse> {
    respond(auth_service.confirm_email(&request.token).await)
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "刷新成功", body = AuthResponse),
        (status = 401, description = "刷新令牌无效")
    )
)]
pub async fn refresh(
    auth_service: web::Data<AuthService>,
    request: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse> {
    respond(auth_service.refresh_token(&request.refresh_token).await)
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/confirm", web::post().to(confirm_email))
            .route("/refresh", web::post().to(refresh)),
    );
}
