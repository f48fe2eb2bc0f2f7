use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        // 前端与各角色面板可能部署在不同域名
        .allowed_origin_fn(|_, _req_head| true)
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}
