pub mod admin;
pub mod auth;
pub mod classes;
pub mod coach;
pub mod health;
pub mod media;
pub mod messages;
pub mod notifications;
pub mod profile;
pub mod purchases;
pub mod session;
pub mod stores;

pub use admin::admin_config;
pub use auth::auth_config;
pub use classes::classes_config;
pub use coach::coach_config;
pub use health::health_config;
pub use media::media_config;
pub use messages::messages_config;
pub use notifications::notifications_config;
pub use profile::profile_config;
pub use purchases::purchases_config;
pub use session::session_config;
pub use stores::stores_config;

use crate::entities::UserRole;
use crate::error::AppResult;
use crate::middlewares::current_identity;
use crate::models::{ApiResponse, SessionInfo};
use crate::services::SessionService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result};
use serde::Serialize;

/// 统一响应包装：成功返回 `{"success": true, "data": ...}`
pub(crate) fn respond<T: Serialize>(result: AppResult<T>) -> Result<HttpResponse> {
    match result {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(data))),
        Err(e) => Ok(e.error_response()),
    }
}

pub(crate) fn respond_created<T: Serialize>(result: AppResult<T>) -> Result<HttpResponse> {
    match result {
        Ok(data) => Ok(HttpResponse::Created().json(ApiResponse::success(data))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 解析当前会话并校验角色
pub(crate) async fn authorize(
    req: &HttpRequest,
    session_service: &SessionService,
    allowed: &[UserRole],
) -> AppResult<SessionInfo> {
    let identity = current_identity(req)?;
    session_service.require_role(&identity, allowed).await
}
