use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub email: String,
    /// 注册时写入的角色元数据，可能缺失
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String, // "access" or "refresh"
}

/// 访问令牌中携带的身份信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub user_id: i64,
    pub email: String,
    pub metadata_role: Option<String>,
}

impl TryFrom<Claims> for AuthIdentity {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;
        Ok(Self {
            user_id,
            email: claims.email,
            metadata_role: claims.role,
        })
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: i64,
    refresh_token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_expires_in: i64, refresh_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: access_expires_in,
            refresh_token_expires_in: refresh_expires_in,
        }
    }

    fn generate(&self, identity: &AuthIdentity, token_type: &str, ttl: i64) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(ttl);

        let claims = Claims {
            sub: identity.user_id.to_string(),
            email: identity.email.clone(),
            role: identity.metadata_role.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn generate_access_token(&self, identity: &AuthIdentity) -> AppResult<String> {
        self.generate(identity, ACCESS, self.access_token_expires_in)
    }

    pub fn generate_refresh_token(&self, identity: &AuthIdentity) -> AppResult<String> {
        self.generate(identity, REFRESH, self.refresh_token_expires_in)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<AuthIdentity> {
        let claims = self.verify_token(token)?;

        if claims.token_type != ACCESS {
            return Err(AppError::AuthError("Invalid access token type".to_string()));
        }

        AuthIdentity::try_from(claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> AppResult<AuthIdentity> {
        let claims = self.verify_token(token)?;

        if claims.token_type != REFRESH {
            return Err(AppError::AuthError("Invalid refresh token type".to_string()));
        }

        AuthIdentity::try_from(claims)
    }

    pub fn get_access_token_expires_in(&self) -> i64 {
        self.access_token_expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Option<&str>) -> AuthIdentity {
        AuthIdentity {
            user_id: 42,
            email: "coach@example.com".to_string(),
            metadata_role: role.map(str::to_string),
        }
    }

    #[test]
    fn test_access_token_carries_metadata_role() {
        let jwt = JwtService::new("test-secret", 3600, 7200);
        let token = jwt.generate_access_token(&identity(Some("coach"))).unwrap();
        let verified = jwt.verify_access_token(&token).unwrap();
        assert_eq!(verified, identity(Some("coach")));
    }

    #[test]
    fn test_missing_role_stays_missing() {
        let jwt = JwtService::new("test-secret", 3600, 7200);
        let token = jwt.generate_access_token(&identity(None)).unwrap();
        assert_eq!(jwt.verify_access_token(&token).unwrap().metadata_role, None);
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let jwt = JwtService::new("test-secret", 3600, 7200);
        let refresh = jwt.generate_refresh_token(&identity(None)).unwrap();
        let access = jwt.generate_access_token(&identity(None)).unwrap();
        assert!(jwt.verify_access_token(&refresh).is_err());
        assert!(jwt.verify_refresh_token(&access).is_err());
        assert!(jwt.verify_refresh_token(&refresh).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtService::new("secret-a", 3600, 7200);
        let verifier = JwtService::new("secret-b", 3600, 7200);
        let token = issuer.generate_access_token(&identity(None)).unwrap();
        assert!(verifier.verify_access_token(&token).is_err());
    }
}
