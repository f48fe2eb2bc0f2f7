use crate::config::AuthConfig;
use crate::entities::{UserRole, auth_user_entity as auth_users, profile_entity as profiles};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::SessionService;
use crate::utils::*;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// 登录失败类型及展示给用户的提示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    InvalidCredentials,
    EmailNotConfirmed,
    RateLimited,
    Unknown,
}

impl AuthFailure {
    /// 根据上游状态码或错误信息判断失败类型
    pub fn classify(status: Option<u16>, message: &str) -> Self {
        let msg = message.to_ascii_lowercase();
        if status == Some(429) || msg.contains("rate limit") || msg.contains("too many") {
            AuthFailure::RateLimited
        } else if msg.contains("not confirmed") || msg.contains("email_not_confirmed") {
            AuthFailure::EmailNotConfirmed
        } else if matches!(status, Some(400) | Some(401))
            || msg.contains("invalid login credentials")
            || msg.contains("invalid credentials")
        {
            AuthFailure::InvalidCredentials
        } else {
            AuthFailure::Unknown
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            AuthFailure::InvalidCredentials => "Invalid email or password",
            AuthFailure::EmailNotConfirmed => "Please confirm your email address before signing in",
            AuthFailure::RateLimited => "Too many sign-in attempts, please try again later",
            AuthFailure::Unknown => "Sign-in failed, please try again",
        }
    }
}

impl From<AuthFailure> for AppError {
    fn from(f: AuthFailure) -> Self {
        match f {
            AuthFailure::InvalidCredentials => AppError::AuthError(f.user_message().to_string()),
            AuthFailure::EmailNotConfirmed => AppError::EmailNotConfirmed,
            AuthFailure::RateLimited => AppError::RateLimited(f.user_message().to_string()),
            AuthFailure::Unknown => AppError::ExternalApiError(f.user_message().to_string()),
        }
    }
}

/// 按邮箱记录滑动窗口内的登录失败次数
#[derive(Debug, Default)]
pub struct LoginThrottle {
    failures: HashMap<String, Vec<DateTime<Utc>>>,
}

impl LoginThrottle {
    fn prune(&mut self, email: &str, window: Duration, now: DateTime<Utc>) -> usize {
        match self.failures.get_mut(email) {
            Some(attempts) => {
                attempts.retain(|t| now.signed_duration_since(*t) < window);
                let n = attempts.len();
                if n == 0 {
                    self.failures.remove(email);
                }
                n
            }
            None => 0,
        }
    }

    pub fn is_blocked(
        &mut self,
        email: &str,
        max_attempts: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        self.prune(email, window, now) >= max_attempts as usize
    }

    /// 记录失败前顺带清理窗口外的邮箱，防止表无限增长
    pub fn record_failure(&mut self, email: &str, window: Duration, now: DateTime<Utc>) {
        self.failures.retain(|_, attempts| {
            attempts
                .last()
                .is_some_and(|t| now.signed_duration_since(*t) < window)
        });
        self.failures.entry(email.to_string()).or_default().push(now);
    }

    pub fn clear(&mut self, email: &str) {
        self.failures.remove(email);
    }
}

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
    session_service: SessionService,
    config: AuthConfig,
    throttle: Arc<RwLock<LoginThrottle>>,
}

impl AuthService {
    pub fn new(
        pool: DatabaseConnection,
        jwt_service: JwtService,
        session_service: SessionService,
        config: AuthConfig,
    ) -> Self {
        Self {
            pool,
            jwt_service,
            session_service,
            config,
            throttle: Arc::new(RwLock::new(LoginThrottle::default())),
        }
    }

    fn identity_of(user: &auth_users::Model) -> AuthIdentity {
        AuthIdentity {
            user_id: user.id,
            email: user.email.clone(),
            metadata_role: user.metadata_role.clone(),
        }
    }

    async fn issue_tokens(&self, identity: &AuthIdentity) -> AppResult<AuthResponse> {
        let access_token = self.jwt_service.generate_access_token(identity)?;
        let refresh_token = self.jwt_service.generate_refresh_token(identity)?;
        let session = self.session_service.resolve(identity).await;
        Ok(AuthResponse {
            session,
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<RegisterResponse> {
        let email = normalize_email(&request.email);
        validate_email(&email)?;
        validate_password(&request.password)?;

        let full_name = request.full_name.trim().to_string();
        if full_name.chars().count() < 2 || full_name.chars().count() > 50 {
            return Err(AppError::ValidationError(
                "Full name must be between 2 and 50 characters".to_string(),
            ));
        }
        if request.role == UserRole::Admin {
            return Err(AppError::ValidationError(
                "Admin accounts cannot be self-registered".to_string(),
            ));
        }

        let existing = auth_users::Entity::find()
            .filter(auth_users::Column::Email.eq(email.clone()))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let password_hash = hash_password(&request.password)?;
        let needs_confirmation = self.config.require_email_confirmation;
        let (confirmation_token, email_confirmed_at) = if needs_confirmation {
            (Some(generate_confirmation_token()), None)
        } else {
            (None, Some(Utc::now()))
        };

        let user = auth_users::ActiveModel {
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            metadata_role: Set(Some(request.role.to_string())),
            confirmation_token: Set(confirmation_token.clone()),
            email_confirmed_at: Set(email_confirmed_at),
            ..Default::default()
        }
        .insert(&self.pool)
        .await
        .map_err(|e| AppError::unique_or_db(e, "Email is already registered"))?;

        // 资料写入失败时仍可通过元数据角色登录
        let profile = profiles::ActiveModel {
            id: Set(user.id),
            full_name: Set(full_name),
            email: Set(email.clone()),
            role: Set(request.role),
            ..Default::default()
        };
        if let Err(e) = profile.insert(&self.pool).await {
            log::warn!("Profile creation failed for user {}: {e}", user.id);
        }

        log::info!("Registered {} as {}", user.id, request.role);

        if let Some(token) = &confirmation_token {
            // 邮件投递由外部通道完成
            log::debug!("Email confirmation token for {email}: {token}");
            return Ok(RegisterResponse {
                user_id: user.id,
                email,
                email_confirmation_required: true,
                auth: None,
            });
        }

        let auth = self.issue_tokens(&Self::identity_of(&user)).await?;
        Ok(RegisterResponse {
            user_id: user.id,
            email,
            email_confirmation_required: false,
            auth: Some(auth),
        })
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);
        let window = Duration::seconds(self.config.login_window_secs);
        let now = Utc::now();

        {
            let mut throttle = self.throttle.write().await;
            if throttle.is_blocked(&email, self.config.login_max_attempts, window, now) {
                return Err(AuthFailure::RateLimited.into());
            }
        }

        let user = auth_users::Entity::find()
            .filter(auth_users::Column::Email.eq(email.clone()))
            .one(&self.pool)
            .await?;

        let user = match user {
            Some(u) if verify_password(&request.password, &u.password_hash)? => u,
            _ => {
                self.throttle
                    .write()
                    .await
                    .record_failure(&email, window, now);
                return Err(AuthFailure::InvalidCredentials.into());
            }
        };

        if self.config.require_email_confirmation && user.email_confirmed_at.is_none() {
            return Err(AuthFailure::EmailNotConfirmed.into());
        }

        self.throttle.write().await.clear(&email);
        self.issue_tokens(&Self::identity_of(&user)).await
    }

    /// 邮箱确认回调
    pub async fn confirm_email(&self, token: &str) -> AppResult<AuthResponse> {
        if token.trim().is_empty() {
            return Err(AppError::ValidationError("Missing confirmation token".to_string()));
        }

        let user = auth_users::Entity::find()
            .filter(auth_users::Column::ConfirmationToken.eq(token.trim()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid or used confirmation token".to_string()))?;

        let mut model = user.into_active_model();
        model.confirmation_token = Set(None);
        model.email_confirmed_at = Set(Some(Utc::now()));
        model.updated_at = Set(Some(Utc::now()));
        let user = model.update(&self.pool).await?;

        log::info!("Email confirmed for user {}", user.id);
        self.issue_tokens(&Self::identity_of(&user)).await
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let identity = self.jwt_service.verify_refresh_token(refresh_token)?;

        let user = auth_users::Entity::find_by_id(identity.user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;

        self.issue_tokens(&Self::identity_of(&user)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_status_and_message() {
        assert_eq!(AuthFailure::classify(Some(429), ""), AuthFailure::RateLimited);
        assert_eq!(
            AuthFailure::classify(None, "Email rate limit exceeded"),
            AuthFailure::RateLimited
        );
        assert_eq!(
            AuthFailure::classify(Some(400), "Email not confirmed"),
            AuthFailure::EmailNotConfirmed
        );
        assert_eq!(
            AuthFailure::classify(Some(400), "Invalid login credentials"),
            AuthFailure::InvalidCredentials
        );
        assert_eq!(AuthFailure::classify(Some(503), "upstream down"), AuthFailure::Unknown);
    }

    #[test]
    fn test_failure_maps_to_app_error() {
        assert!(matches!(
            AppError::from(AuthFailure::RateLimited),
            AppError::RateLimited(_)
        ));
        assert!(matches!(
            AppError::from(AuthFailure::EmailNotConfirmed),
            AppError::EmailNotConfirmed
        ));
        match AppError::from(AuthFailure::InvalidCredentials) {
            AppError::AuthError(msg) => assert_eq!(msg, "Invalid email or password"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_throttle_blocks_after_max_failures() {
        let mut throttle = LoginThrottle::default();
        let window = Duration::seconds(300);
        let now = Utc::now();
        for _ in 0..3 {
            assert!(!throttle.is_blocked("a@b.co", 3, window, now));
            throttle.record_failure("a@b.co", window, now);
        }
        assert!(throttle.is_blocked("a@b.co", 3, window, now));
        assert!(!throttle.is_blocked("other@b.co", 3, window, now));
    }

    #[test]
    fn test_throttle_window_slides_and_clears() {
        let mut throttle = LoginThrottle::default();
        let window = Duration::seconds(60);
        let start = Utc::now();
        throttle.record_failure("a@b.co", window, start);
        throttle.record_failure("a@b.co", window, start);
        assert!(throttle.is_blocked("a@b.co", 2, window, start));
        assert!(!throttle.is_blocked("a@b.co", 2, window, start + Duration::seconds(61)));

        throttle.record_failure("a@b.co", window, start);
        throttle.clear("a@b.co");
        assert!(!throttle.is_blocked("a@b.co", 1, window, start));
    }

    #[test]
    fn test_throttle_evicts_stale_emails() {
        let mut throttle = LoginThrottle::default();
        let window = Duration::seconds(60);
        let start = Utc::now();
        for i in 0..50 {
            throttle.record_failure(&format!("user{i}@b.co"), window, start);
        }
        throttle.record_failure("late@b.co", window, start + Duration::seconds(30));
        assert_eq!(throttle.failures.len(), 51);

        throttle.record_failure("new@b.co", window, start + Duration::seconds(61));
        assert_eq!(throttle.failures.len(), 2);
        assert!(throttle.failures.contains_key("late@b.co"));
        assert!(throttle.failures.contains_key("new@b.co"));
    }
}
