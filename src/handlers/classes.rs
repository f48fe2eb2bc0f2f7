use crate::entities::UserRole;
use crate::handlers::{authorize, respond};
use crate::services::{ClassService, SessionService};
use actix_web::{HttpRequest, HttpResponse, Result, web};

const STUDENT: &[UserRole] = &[UserRole::Student];

#[utoipa::path(
    get,
    path = "/classes/upcoming",
    tag = "classes",
    responses((status = 200, description = "即将开始的团课", body = [ClassResponse]))
)]
pub async fn list_upcoming(class_service: web::Data<ClassService>) -> Result<HttpResponse> {
    respond(class_service.list_upcoming().await)
}

#[utoipa::path(
    get,
    path = "/classes/mine",
    tag = "classes",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "已报名的团课", body = [ClassResponse]))
)]
pub async fn list_mine(
    session_service: web::Data<SessionService>,
    class_service: web::Data<ClassService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, STUDENT).await?;
        class_service.list_student_classes(session.user_id).await
    }
    .await;
    respond(result)
}

#[utoipa::path(
    post,
    path = "/classes/{id}/enroll",
    tag = "classes",
    params(("id" = i64, Path, description = "团课ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "报名成功", body = ClassResponse),
        (status = 409, description = "已报名或已满员")
    )
)]
pub async fn enroll(
    session_service: web::Data<SessionService>,
    class_service: web::Data<ClassService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, STUDENT).await?;
        class_service.enroll(session.user_id, path.into_inner()).await
    }
    .await;
    respond(result)
}

#[utoipa::path(
    delete,
    path = "/classes/{id}/enroll",
    tag = "classes",
    params(("id" = i64, Path, description = "团课ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "已取消报名"),
        (status = 400, description = "课程已开始")
    )
)]
pub async fn cancel_enrollment(
    session_service: web::Data<SessionService>,
    class_service: web::Data<ClassService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, STUDENT).await?;
        class_service
            .cancel_enrollment(session.user_id, path.into_inner())
            .await
    }
    .await;
    respond(result)
}

pub fn classes_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/classes")
            .route("/upcoming", web::get().to(list_upcoming))
            .route("/mine", web::get().to(list_mine))
            .route("/{id}/enroll", web::post().to(enroll))
            .route("/{id}/enroll", web::delete().to(cancel_enrollment)),
    );
}
