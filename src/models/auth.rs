use crate::entities::UserRole;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "coach@example.com")]
    pub email: String,
    #[schema(example = "Password123")]
    pub password: String,
    #[schema(example = "Dana Levi")]
    pub full_name: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "coach@example.com")]
    pub email: String,
    #[schema(example = "Password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfirmEmailRequest {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// 会话信息：当前用户及其面板路径
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct SessionInfo {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
    #[schema(example = "/coach/dashboard")]
    pub dashboard: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub session: SessionInfo,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub email: String,
    pub email_confirmation_required: bool,
    /// 无需邮箱确认时直接返回会话
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GateRequest {
    #[schema(example = "/coach/packages")]
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateResponse {
    /// `role` 为空表示匿名访问公开页面
    Proceed { role: Option<UserRole> },
    Redirect { to: String },
}
