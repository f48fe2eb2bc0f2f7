//! 教练后台接口：店铺、套餐、销售、学员、收入、团课

use crate::entities::UserRole;
use crate::handlers::{authorize, respond, respond_created};
use crate::models::*;
use crate::services::{
    ClassService, PackageService, PurchaseService, RevenueService, SessionService, StoreService,
};
use actix_web::{HttpRequest, HttpResponse, Result, web};

const COACH: &[UserRole] = &[UserRole::Coach];

#[utoipa::path(
    get,
    path = "/coach/store",
    tag = "coach",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "我的店铺", body = StoreResponse),
        (status = 404, description = "尚未开店")
    )
)]
pub async fn get_my_store(
    session_service: web::Data<SessionService>,
    store_service: web::Data<StoreService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, COACH).await?;
        store_service.get_my_store(session.user_id).await
    }
    .await;
    respond(result)
}

#[utoipa::path(
    post,
    path = "/coach/store",
    tag = "coach",
    request_body = CreateStoreRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "开店成功", body = StoreResponse),
        (status = 409, description = "已拥有店铺")
    )
)]
pub async fn create_store(
    session_service: web::Data<SessionService>,
    store_service: web::Data<StoreService>,
    req: HttpRequest,
    request: web::Json<CreateStoreRequest>,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, COACH).await?;
        store_service
            .create_store(session.user_id, request.into_inner())
            .await
    }
    .await;
    respond_created(result)
}

#[utoipa::path(
    put,
    path = "/coach/store",
    tag = "coach",
    request_body = UpdateStoreRequest,
    security(("bearer_auth" = [])),
    responses((status = 200, description = "更新成功", body = StoreResponse))
)]
pub async fn update_store(
    session_service: web::Data<SessionService>,
    store_service: web::Data<StoreService>,
    req: HttpRequest,
    request: web::Json<UpdateStoreRequest>,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, COACH).await?;
        store_service
            .update_store(session.user_id, request.into_inner())
            .await
    }
    .await;
    respond(result)
}

#[utoipa::path(
    get,
    path = "/coach/packages",
    tag = "coach",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "套餐列表", body = [PackageResponse]))
)]
pub async fn list_packages(
    session_service: web::Data<SessionService>,
    package_service: web::Data<PackageService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, COACH).await?;
        package_service.list_coach_packages(session.user_id).await
    }
    .await;
    respond(result)
}

#[utoipa::path(
    post,
    path = "/coach/packages",
    tag = "coach",
    request_body = CreatePackageRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "创建成功", body = PackageResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn create_package(
    session_service: web::Data<SessionService>,
    package_service: web::Data<PackageService>,
    req: HttpRequest,
    request: web::Json<CreatePackageRequest>,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, COACH).await?;
        package_service
            .create_package(session.user_id, request.into_inner())
            .await
    }
    .await;
    respond_created(result)
}

#[utoipa::path(
    put,
    path = "/coach/packages/{id}",
    tag = "coach",
    params(("id" = i64, Path, description = "套餐ID")),
    request_body = UpdatePackageRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "更新成功", body = PackageResponse),
        (status = 404, description = "套餐不存在")
    )
)]
pub async fn update_package(
    session_service: web::Data<SessionService>,
    package_service: web::Data<PackageService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdatePackageRequest>,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, COACH).await?;
        package_service
            .update_package(session.user_id, path.into_inner(), request.into_inner())
            .await
    }
    .await;
    respond(result)
}

#[utoipa::path(
    delete,
    path = "/coach/packages/{id}",
    tag = "coach",
    params(("id" = i64, Path, description = "套餐ID")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "已下架"))
)]
pub async fn deactivate_package(
    session_service: web::Data<SessionService>,
    package_service: web::Data<PackageService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, COACH).await?;
        package_service
            .deactivate_package(session.user_id, path.into_inner())
            .await
    }
    .await;
    respond(result)
}

#[utoipa::path(
    get,
    path = "/coach/sales",
    tag = "coach",
    params(PaginationParams),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "销售记录"))
)]
pub async fn list_sales(
    session_service: web::Data<SessionService>,
    purchase_service: web::Data<PurchaseService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, COACH).await?;
        purchase_service
            .list_coach_sales(session.user_id, &query)
            .await
    }
    .await;
    respond(result)
}

#[utoipa::path(
    get,
    path = "/coach/students",
    tag = "coach",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "学员列表", body = [CoachStudentSummary]))
)]
pub async fn list_students(
    session_service: web::Data<SessionService>,
    purchase_service: web::Data<PurchaseService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, COACH).await?;
        purchase_service.list_coach_students(session.user_id).await
    }
    .await;
    respond(result)
}

#[utoipa::path(
    get,
    path = "/coach/revenue",
    tag = "coach",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "营收汇总", body = RevenueSummary))
)]
pub async fn revenue_summary(
    session_service: web::Data<SessionService>,
    revenue_service: web::Data<RevenueService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, COACH).await?;
        revenue_service.coach_summary(session.user_id).await
    }
    .await;
    respond(result)
}

#[utoipa::path(
    get,
    path = "/coach/classes",
    tag = "coach",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "我的团课", body = [ClassResponse]))
)]
pub async fn list_classes(
    session_service: web::Data<SessionService>,
    class_service: web::Data<ClassService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, COACH).await?;
        class_service.list_coach_classes(session.user_id).await
    }
    .await;
    respond(result)
}

#[utoipa::path(
    post,
    path = "/coach/classes",
    tag = "coach",
    request_body = CreateClassRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "创建成功", body = ClassResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn create_class(
    session_service: web::Data<SessionService>,
    class_service: web::Data<ClassService>,
    req: HttpRequest,
    request: web::Json<CreateClassRequest>,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, COACH).await?;
        class_service
            .create_class(session.user_id, request.into_inner())
            .await
    }
    .await;
    respond_created(result)
}

#[utoipa::path(
    put,
    path = "/coach/classes/{id}/status",
    tag = "coach",
    params(("id" = i64, Path, description = "团课ID")),
    request_body = UpdateClassStatusRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "状态已更新", body = ClassResponse),
        (status = 400, description = "状态只能向前推进")
    )
)]
pub async fn update_class_status(
    session_service: web::Data<SessionService>,
    class_service: web::Data<ClassService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateClassStatusRequest>,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, COACH).await?;
        class_service
            .update_status(session.user_id, path.into_inner(), request.status)
            .await
    }
    .await;
    respond(result)
}

pub fn coach_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/coach")
            .route("/store", web::get().to(get_my_store))
            .route("/store", web::post().to(create_store))
            .route("/store", web::put().to(update_store))
            .route("/packages", web::get().to(list_packages))
            .route("/packages", web::post().to(create_package))
            .route("/packages/{id}", web::put().to(update_package))
            .route("/packages/{id}", web::delete().to(deactivate_package))
            .route("/sales", web::get().to(list_sales))
            .route("/students", web::get().to(list_students))
            .route("/revenue", web::get().to(revenue_summary))
            .route("/classes", web::get().to(list_classes))
            .route("/classes", web::post().to(create_class))
            .route("/classes/{id}/status", web::put().to(update_class_status)),
    );
}
