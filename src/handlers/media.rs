use crate::entities::UserRole;
use crate::error::AppError;
use crate::external::StorageService;
use crate::handlers::{authorize, respond_created};
use crate::models::*;
use crate::services::SessionService;
use actix_web::{HttpRequest, HttpResponse, Result, http::header, web};

fn content_type_of(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

/// 原始二进制上传，文件类型取自 Content-Type
#[utoipa::path(
    post,
    path = "/media/upload",
    tag = "media",
    params(UploadQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "上传成功", body = UploadResponse),
        (status = 400, description = "类型或大小不符合要求"),
        (status = 502, description = "存储服务错误")
    )
)]
pub async fn upload(
    session_service: web::Data<SessionService>,
    storage_service: web::Data<StorageService>,
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let result = async {
        let session = authorize(
            &req,
            &session_service,
            &[UserRole::Coach, UserRole::Admin],
        )
        .await?;
        let content_type = content_type_of(&req)
            .ok_or_else(|| AppError::ValidationError("Missing Content-Type".to_string()))?;
        storage_service
            .upload(
                session.user_id,
                query.kind,
                &query.filename,
                &content_type,
                body.to_vec(),
            )
            .await
    }
    .await;
    respond_created(result)
}

pub fn media_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/media").route("/upload", web::post().to(upload)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_content_type_parameters_are_stripped() {
        let req = TestRequest::default()
            .insert_header((header::CONTENT_TYPE, "Video/MP4; codecs=avc1"))
            .to_http_request();
        assert_eq!(content_type_of(&req).as_deref(), Some("video/mp4"));

        let req = TestRequest::default().to_http_request();
        assert_eq!(content_type_of(&req), None);
    }
}
