use crate::entities::UserRole;
use crate::handlers::{authorize, respond, respond_created};
use crate::models::*;
use crate::services::{ReviewService, SessionService, StoreService};
use actix_web::{HttpRequest, HttpResponse, Result, web};

#[utoipa::path(
    get,
    path = "/stores",
    tag = "stores",
    params(StoreQuery),
    responses((status = 200, description = "店铺列表"))
)]
pub async fn list_stores(
    store_service: web::Data<StoreService>,
    query: web::Query<StoreQuery>,
) -> Result<HttpResponse> {
    respond(store_service.list_stores(&query).await)
}

#[utoipa::path(
    get,
    path = "/stores/{id}",
    tag = "stores",
    params(("id" = i64, Path, description = "店铺ID")),
    responses(
        (status = 200, description = "店铺详情", body = StoreDetailResponse),
        (status = 404, description = "店铺不存在")
    )
)]
pub async fn get_store(
    store_service: web::Data<StoreService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond(store_service.get_store_detail(path.into_inner()).await)
}

#[utoipa::path(
    get,
    path = "/stores/{id}/reviews",
    tag = "stores",
    params(("id" = i64, Path, description = "店铺ID")),
    responses((status = 200, description = "评价列表", body = [ReviewResponse]))
)]
pub async fn list_reviews(
    review_service: web::Data<ReviewService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    respond(review_service.list_store_reviews(path.into_inner()).await)
}

#[utoipa::path(
    post,
    path = "/stores/{id}/reviews",
    tag = "stores",
    params(("id" = i64, Path, description = "店铺ID")),
    request_body = CreateReviewRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "评价成功", body = ReviewResponse),
        (status = 403, description = "未在该店铺购买"),
        (status = 409, description = "已评价")
    )
)]
pub async fn create_review(
    session_service: web::Data<SessionService>,
    review_service: web::Data<ReviewService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(&req, &session_service, &[UserRole::Student]).await?;
        review_service
            .create_review(session.user_id, path.into_inner(), request.into_inner())
            .await
    }
    .await;
    respond_created(result)
}

pub fn stores_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stores")
            .route("", web::get().to(list_stores))
            .route("/{id}", web::get().to(get_store))
            .route("/{id}/reviews", web::get().to(list_reviews))
            .route("/{id}/reviews", web::post().to(create_review)),
    );
}
