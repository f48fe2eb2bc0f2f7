use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};
use crate::models::{MediaKind, UploadResponse};
use crate::services::AuthFailure;
use reqwest::Client;
use uuid::Uuid;

pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_VIDEO_BYTES: u64 = 100 * 1024 * 1024;

impl MediaKind {
    pub fn max_bytes(self) -> u64 {
        match self {
            MediaKind::Image => MAX_IMAGE_BYTES,
            MediaKind::Video => MAX_VIDEO_BYTES,
        }
    }

    fn folder(self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
        }
    }

    fn accepts(self, content_type: &str) -> bool {
        let prefix = match self {
            MediaKind::Image => "image/",
            MediaKind::Video => "video/",
        };
        content_type
            .get(..prefix.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(prefix))
            && content_type.len() > prefix.len()
    }
}

/// 上传前校验类型与大小
pub fn validate_upload(kind: MediaKind, content_type: &str, size: u64) -> AppResult<()> {
    if size == 0 {
        return Err(AppError::ValidationError("File is empty".to_string()));
    }
    if !kind.accepts(content_type) {
        return Err(AppError::ValidationError(format!(
            "Unsupported content type: {content_type}"
        )));
    }
    if size > kind.max_bytes() {
        return Err(AppError::ValidationError(format!(
            "File exceeds the {} MB limit",
            kind.max_bytes() / (1024 * 1024)
        )));
    }
    Ok(())
}

fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    (!ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(ext)
}

/// 对象路径：`<folder>/<owner>/<uuid>[.ext]`，不使用客户端原始文件名
pub fn object_path(kind: MediaKind, owner_id: i64, filename: &str) -> String {
    let id = Uuid::new_v4();
    match extension_of(filename) {
        Some(ext) => format!("{}/{owner_id}/{id}.{ext}", kind.folder()),
        None => format!("{}/{owner_id}/{id}", kind.folder()),
    }
}

#[derive(Clone)]
pub struct StorageService {
    client: Client,
    config: StorageConfig,
}

impl StorageService {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn public_url(&self, path: &str) -> String {
        let base = self
            .config
            .public_base_url
            .as_deref()
            .unwrap_or(&self.config.url)
            .trim_end_matches('/');
        format!(
            "{base}/storage/v1/object/public/{}/{path}",
            self.config.bucket
        )
    }

    pub async fn upload(
        &self,
        owner_id: i64,
        kind: MediaKind,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<UploadResponse> {
        let size = bytes.len() as u64;
        validate_upload(kind, content_type, size)?;

        let path = object_path(kind, owner_id, filename);
        let url = format!(
            "{}/storage/v1/object/{}/{path}",
            self.config.url.trim_end_matches('/'),
            self.config.bucket
        );

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            log::info!("Uploaded {size} bytes to {path}");
            return Ok(UploadResponse {
                url: self.public_url(&path),
                path,
                size,
                content_type: content_type.to_string(),
            });
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        log::error!("Storage upload failed: {path}, status: {status}, error: {error_text}");

        match AuthFailure::classify(Some(status.as_u16()), &error_text) {
            AuthFailure::RateLimited => Err(AuthFailure::RateLimited.into()),
            _ => Err(AppError::ExternalApiError(format!(
                "Upload failed: {error_text}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upload() {
        assert!(validate_upload(MediaKind::Image, "image/png", 1024).is_ok());
        assert!(validate_upload(MediaKind::Video, "video/mp4", MAX_VIDEO_BYTES).is_ok());
        assert!(validate_upload(MediaKind::Image, "image/png", 0).is_err());
        assert!(validate_upload(MediaKind::Image, "video/mp4", 1024).is_err());
        assert!(validate_upload(MediaKind::Image, "image/", 1024).is_err());
        assert!(validate_upload(MediaKind::Video, "video/x-matroska", 1024).is_ok());
        assert!(validate_upload(MediaKind::Image, "image/jpeg", MAX_IMAGE_BYTES + 1).is_err());
        assert!(validate_upload(MediaKind::Video, "video/webm", MAX_VIDEO_BYTES + 1).is_err());
    }

    #[test]
    fn test_object_path() {
        let path = object_path(MediaKind::Video, 42, "Intro.MP4");
        assert!(path.starts_with("videos/42/"));
        assert!(path.ends_with(".mp4"));

        let path = object_path(MediaKind::Image, 7, "../../etc/passwd");
        assert!(path.starts_with("images/7/"));
        assert!(!path.contains(".."));
    }

    #[test]
    fn test_public_url() {
        let storage = StorageService::new(StorageConfig {
            url: "https://storage.example.com/".to_string(),
            anon_key: "anon".to_string(),
            bucket: "media".to_string(),
            public_base_url: None,
        });
        assert_eq!(
            storage.public_url("images/1/a.png"),
            "https://storage.example.com/storage/v1/object/public/media/images/1/a.png"
        );
    }
}
