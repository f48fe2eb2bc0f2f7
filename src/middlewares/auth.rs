use crate::error::{AppError, AppResult};
use crate::utils::{AuthIdentity, JwtService};
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

// 公开路径配置
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec![
                "/health",
                "/swagger-ui",
                "/api-docs/openapi.json",
                "/api/v1/session/gate",
                "/api/v1/stores",
                "/api/v1/classes/upcoming",
            ],
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/api/v1/auth/", "/api/v1/stores/"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        self.exact_paths.contains(&path)
            || self
                .prefix_paths
                .iter()
                .any(|&prefix| path.starts_with(prefix))
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        let verified = bearer_token(&req).map(|t| self.jwt_service.verify_access_token(t));

        // 公开路径：令牌有效时附带身份，无效时忽略
        if self.public_paths.is_public_path(req.path()) {
            if let Some(Ok(identity)) = verified {
                req.extensions_mut().insert(identity);
            }
            return Box::pin(self.service.call(req));
        }

        match verified {
            Some(Ok(identity)) => {
                req.extensions_mut().insert(identity);
                Box::pin(self.service.call(req))
            }
            Some(Err(_)) => {
                let error = AppError::AuthError("Invalid access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
            None => {
                let error = AppError::AuthError("Missing access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

/// 获取 [`AuthMiddleware`] 附加的身份（可能为空）
pub fn optional_identity(req: &HttpRequest) -> Option<AuthIdentity> {
    req.extensions().get::<AuthIdentity>().cloned()
}

pub fn current_identity(req: &HttpRequest) -> AppResult<AuthIdentity> {
    optional_identity(req).ok_or_else(|| AppError::AuthError("Not authenticated".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, http::StatusCode, test as actix_test, web};

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match optional_identity(&req) {
            Some(identity) => HttpResponse::Ok().body(identity.user_id.to_string()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    fn jwt() -> JwtService {
        JwtService::new("middleware-test-secret", 3600, 7200)
    }

    fn token_for(user_id: i64) -> String {
        jwt()
            .generate_access_token(&AuthIdentity {
                user_id,
                email: "coach@example.com".to_string(),
                metadata_role: Some("coach".to_string()),
            })
            .unwrap()
    }

    #[test]
    fn test_public_path_matching() {
        let paths = PublicPaths::new();
        assert!(paths.is_public_path("/api/v1/auth/login"));
        assert!(paths.is_public_path("/api/v1/stores/3"));
        assert!(paths.is_public_path("/health"));
        assert!(!paths.is_public_path("/api/v1/profile"));
        assert!(!paths.is_public_path("/api/v1/coach/store"));
    }

    #[actix_web::test]
    async fn test_protected_route_requires_token() {
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt()))
                .route("/api/v1/profile", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/api/v1/profile").to_request();
        let err = actix_test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/profile")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        assert!(actix_test::try_call_service(&app, req).await.is_err());
    }

    #[actix_web::test]
    async fn test_valid_token_attaches_identity() {
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt()))
                .route("/api/v1/profile", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/profile")
            .insert_header(("Authorization", format!("Bearer {}", token_for(42))))
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, "42");
    }

    #[actix_web::test]
    async fn test_public_route_identity_is_optional() {
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt()))
                .route("/api/v1/session/gate", web::post().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/session/gate")
            .to_request();
        assert_eq!(actix_test::call_and_read_body(&app, req).await, "anonymous");

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/session/gate")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        assert_eq!(actix_test::call_and_read_body(&app, req).await, "anonymous");

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/session/gate")
            .insert_header(("Authorization", format!("Bearer {}", token_for(7))))
            .to_request();
        assert_eq!(actix_test::call_and_read_body(&app, req).await, "7");
    }
}
