use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{ClassStatus, PackageType, PurchaseStatus, UserRole};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::confirm_email,
        handlers::auth::refresh,
        handlers::session::get_session,
        handlers::session::gate,
        handlers::profile::get_profile,
        handlers::profile::update_profile,
        handlers::admin::list_profiles,
        handlers::admin::revenue_report,
        handlers::coach::get_my_store,
        handlers::coach::create_store,
        handlers::coach::update_store,
        handlers::coach::list_packages,
        handlers::coach::create_package,
        handlers::coach::update_package,
        handlers::coach::deactivate_package,
        handlers::coach::list_sales,
        handlers::coach::list_students,
        handlers::coach::revenue_summary,
        handlers::coach::list_classes,
        handlers::coach::create_class,
        handlers::coach::update_class_status,
        handlers::stores::list_stores,
        handlers::stores::get_store,
        handlers::stores::list_reviews,
        handlers::stores::create_review,
        handlers::purchases::checkout,
        handlers::purchases::list_my_purchases,
        handlers::purchases::coaching_access,
        handlers::classes::list_upcoming,
        handlers::classes::list_mine,
        handlers::classes::enroll,
        handlers::classes::cancel_enrollment,
        handlers::messages::list_conversations,
        handlers::messages::send_message,
        handlers::messages::get_conversation,
        handlers::messages::mark_conversation_read,
        handlers::notifications::list_notifications,
        handlers::notifications::mark_read,
        handlers::notifications::mark_all_read,
        handlers::media::upload,
    ),
    components(
        schemas(
            UserRole,
            PackageType,
            PurchaseStatus,
            ClassStatus,
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            ConfirmEmailRequest,
            RefreshTokenRequest,
            AuthResponse,
            SessionInfo,
            GateRequest,
            GateResponse,
            ProfileResponse,
            UpdateProfileRequest,
            CreateStoreRequest,
            UpdateStoreRequest,
            StoreResponse,
            StoreDetailResponse,
            CreatePackageRequest,
            UpdatePackageRequest,
            PackageResponse,
            CheckoutRequest,
            PurchaseResponse,
            CoachingAccessResponse,
            CoachStudentSummary,
            RevenueSummary,
            StoreRevenue,
            RevenueReport,
            CreateClassRequest,
            UpdateClassStatusRequest,
            ClassResponse,
            CreateReviewRequest,
            ReviewResponse,
            SendMessageRequest,
            MessageResponse,
            ConversationSummary,
            NotificationResponse,
            MediaKind,
            UploadResponse,
            AffectedRows,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and email confirmation"),
        (name = "session", description = "Role resolution and route gating"),
        (name = "profile", description = "Own profile"),
        (name = "admin", description = "Platform administration and revenue"),
        (name = "coach", description = "Coach store, packages, sales and classes"),
        (name = "stores", description = "Store browsing and reviews"),
        (name = "purchases", description = "Checkout and coaching access"),
        (name = "classes", description = "Group class enrollment"),
        (name = "messages", description = "Direct messaging"),
        (name = "notifications", description = "In-app notifications"),
        (name = "media", description = "Video and image uploads"),
    ),
    info(
        title = "FitMarket Backend API",
        version = "1.0.0",
        description = "Fitness coaching marketplace REST API"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/session/gate"));
        assert!(doc.paths.paths.contains_key("/admin/revenue"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
