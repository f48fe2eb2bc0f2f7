use crate::entities::{UserRole, profile_entity as profiles};
use crate::error::{AppError, AppResult};
use crate::models::SessionInfo;
use crate::services::access_gate::dashboard_for;
use crate::utils::AuthIdentity;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::fmt::Display;
use std::time::Duration;

/// 角色优先级：资料表 > 认证元数据 > student。
/// 资料查询失败或超时按无资料处理
pub fn resolve_role<E: Display>(
    profile_lookup: Result<Option<UserRole>, E>,
    metadata_role: Option<&str>,
) -> UserRole {
    match profile_lookup {
        Ok(Some(role)) => return role,
        Ok(None) => {}
        Err(e) => log::warn!("Profile lookup failed, falling back to auth metadata: {e}"),
    }

    metadata_role
        .and_then(|r| r.parse::<UserRole>().ok())
        .unwrap_or(UserRole::Student)
}

#[derive(Clone)]
pub struct SessionService {
    pool: DatabaseConnection,
    lookup_timeout: Duration,
}

impl SessionService {
    pub fn new(pool: DatabaseConnection, lookup_timeout_ms: u64) -> Self {
        Self {
            pool,
            lookup_timeout: Duration::from_millis(lookup_timeout_ms),
        }
    }

    async fn lookup_profile_role(&self, user_id: i64) -> Result<Option<UserRole>, String> {
        let lookup = profiles::Entity::find_by_id(user_id).one(&self.pool);
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(profile)) => Ok(profile.map(|p| p.role)),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "timed out after {}ms",
                self.lookup_timeout.as_millis()
            )),
        }
    }

    pub async fn resolve(&self, identity: &AuthIdentity) -> SessionInfo {
        let lookup = self.lookup_profile_role(identity.user_id).await;
        let role = resolve_role(lookup, identity.metadata_role.as_deref());
        SessionInfo {
            user_id: identity.user_id,
            email: identity.email.clone(),
            role,
            dashboard: dashboard_for(role).to_string(),
        }
    }

    /// 角色不在允许列表中时返回 PermissionDenied
    pub async fn require_role(
        &self,
        identity: &AuthIdentity,
        allowed: &[UserRole],
    ) -> AppResult<SessionInfo> {
        let session = self.resolve(identity).await;
        if allowed.contains(&session.role) {
            Ok(session)
        } else {
            log::warn!(
                "User {} with role {} denied (requires one of {:?})",
                session.user_id,
                session.role,
                allowed
            );
            Err(AppError::PermissionDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_role_wins() {
        let role = resolve_role::<String>(Ok(Some(UserRole::Coach)), Some("admin"));
        assert_eq!(role, UserRole::Coach);
    }

    #[test]
    fn test_metadata_fallback_when_profile_missing() {
        let role = resolve_role::<String>(Ok(None), Some("coach"));
        assert_eq!(role, UserRole::Coach);
        let role = resolve_role::<String>(Ok(None), Some(" Admin "));
        assert_eq!(role, UserRole::Admin);
    }

    #[test]
    fn test_lookup_error_is_swallowed() {
        let role = resolve_role(Err("connection reset"), Some("coach"));
        assert_eq!(role, UserRole::Coach);
    }

    #[test]
    fn test_defaults_to_student() {
        assert_eq!(resolve_role::<String>(Ok(None), None), UserRole::Student);
        assert_eq!(resolve_role(Err("timed out"), None), UserRole::Student);
        assert_eq!(
            resolve_role::<String>(Ok(None), Some("superuser")),
            UserRole::Student
        );
    }
}
