use actix_web::{HttpResponse, web};
use serde_json::json;

/// 存活探针，不访问数据库
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "status": "ok" }
    }))
}

pub fn health_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
