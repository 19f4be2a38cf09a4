/// Media hosting client
///
/// Images and videos are stored by an external hosting API; Agora only keeps
/// the returned URLs. [`MediaStore`] is the seam the API handlers depend on,
/// [`HostedMediaStore`] is the HTTP implementation.
///
/// # Request signing
///
/// Every upload is signed: the parameters other than `file` and `api_key`
/// are sorted by name, joined as `k=v` with `&`, the API secret is appended
/// and the result is hashed with SHA-256 (hex encoded).
///
/// ```text
/// folder=agora/posts&timestamp=1700000000<api_secret>  ->  sha256 hex
/// ```

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

/// Errors from media validation and upload
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Hosting credentials are not configured
    #[error("Media uploads are not configured")]
    NotConfigured,

    /// Content type is neither `image/*` nor `video/*`
    #[error("Unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("File is too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Empty file")]
    Empty,

    /// Transport failure talking to the hosting API
    #[error("Media request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Hosting API answered with an error
    #[error("Media provider error ({status}): {message}")]
    Provider { status: u16, message: String },
}

/// Kind of hosted asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Video,
}

impl ResourceType {
    /// Classifies a MIME type; `None` for anything but images and videos
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();

        if essence.starts_with("image/") && essence.len() > "image/".len() {
            Some(ResourceType::Image)
        } else if essence.starts_with("video/") && essence.len() > "video/".len() {
            Some(ResourceType::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
        }
    }
}

/// Checks type and size before anything is sent upstream
pub fn validate_upload(content_type: &str, size: usize, max_bytes: usize) -> Result<ResourceType, MediaError> {
    let resource_type = ResourceType::from_content_type(content_type)
        .ok_or_else(|| MediaError::UnsupportedType(content_type.to_string()))?;

    if size == 0 {
        return Err(MediaError::Empty);
    }

    if size > max_bytes {
        return Err(MediaError::TooLarge { size, max: max_bytes });
    }

    Ok(resource_type)
}

/// File to upload
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub data: Bytes,
    pub file_name: String,
    pub content_type: String,
    pub resource_type: ResourceType,

    /// Sub-folder under the configured root, e.g. `posts`
    pub folder: Option<String>,
}

/// Hosted asset returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
    pub resource_type: ResourceType,
    pub bytes: u64,
}

/// Uploads media somewhere that serves it back over HTTPS
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedMedia, MediaError>;
}

/// Store used when no hosting credentials are configured
pub struct DisabledMediaStore;

#[async_trait]
impl MediaStore for DisabledMediaStore {
    async fn upload(&self, _upload: MediaUpload) -> Result<UploadedMedia, MediaError> {
        Err(MediaError::NotConfigured)
    }
}

/// Hosting API settings
#[derive(Debug, Clone)]
pub struct HostedMediaConfig {
    /// API root, e.g. `https://api.cloudinary.com/v1_1`
    pub api_base_url: String,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,

    /// Root folder every upload goes under
    pub root_folder: String,

    pub timeout_secs: u64,
}

/// Signed multipart uploads over `reqwest`
pub struct HostedMediaStore {
    http: reqwest::Client,
    config: HostedMediaConfig,
}

#[derive(Debug, Deserialize)]
struct ProviderUploadResponse {
    secure_url: String,
    public_id: String,
    bytes: u64,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorResponse {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

impl HostedMediaStore {
    pub fn new(config: HostedMediaConfig) -> Result<Self, MediaError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("agora/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    fn upload_url(&self, resource_type: ResourceType) -> String {
        format!(
            "{}/{}/{}/upload",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.cloud_name,
            resource_type.as_str()
        )
    }

    fn folder_for(&self, sub: Option<&str>) -> String {
        match sub.map(str::trim).filter(|s| !s.is_empty()) {
            Some(sub) => format!("{}/{}", self.config.root_folder.trim_end_matches('/'), sub),
            None => self.config.root_folder.clone(),
        }
    }
}

#[async_trait]
impl MediaStore for HostedMediaStore {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedMedia, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let folder = self.folder_for(upload.folder.as_deref());

        let mut params = BTreeMap::new();
        params.insert("folder", folder.clone());
        params.insert("timestamp", timestamp.clone());
        let signature = sign_params(&params, &self.config.api_secret);

        let size = upload.data.len();
        let file_part = reqwest::multipart::Part::bytes(upload.data.to_vec())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)
            .map_err(|_| MediaError::UnsupportedType(upload.content_type.clone()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("folder", folder)
            .text("timestamp", timestamp)
            .text("signature", signature);

        debug!(
            resource_type = upload.resource_type.as_str(),
            size,
            "Uploading media"
        );

        let response = self
            .http
            .post(self.upload_url(upload.resource_type))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ProviderErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            warn!(status = status.as_u16(), %message, "Media provider rejected upload");
            return Err(MediaError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: ProviderUploadResponse = response.json().await?;
        info!(public_id = %body.public_id, bytes = body.bytes, "Media uploaded");

        Ok(UploadedMedia {
            url: body.secure_url,
            public_id: body.public_id,
            resource_type: upload.resource_type,
            bytes: body.bytes,
        })
    }
}

/// Signs upload parameters: `sha256("k1=v1&k2=v2" + secret)` as lowercase hex
///
/// Keys are taken in sorted order; empty values are skipped.
pub fn sign_params(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HostedMediaStore {
        HostedMediaStore::new(HostedMediaConfig {
            api_base_url: "https://media.example.com/v1_1/".to_string(),
            cloud_name: "agora".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            root_folder: "agora".to_string(),
            timeout_secs: 30,
        })
        .unwrap()
    }

    #[test]
    fn test_resource_type_from_content_type() {
        assert_eq!(ResourceType::from_content_type("image/png"), Some(ResourceType::Image));
        assert_eq!(
            ResourceType::from_content_type("video/mp4; codecs=avc1"),
            Some(ResourceType::Video)
        );
        assert_eq!(ResourceType::from_content_type("IMAGE/JPEG"), Some(ResourceType::Image));
        assert_eq!(ResourceType::from_content_type("application/pdf"), None);
        assert_eq!(ResourceType::from_content_type("image/"), None);
    }

    #[test]
    fn test_validate_upload() {
        assert_eq!(validate_upload("image/png", 10, 100).unwrap(), ResourceType::Image);
        assert!(matches!(validate_upload("text/plain", 10, 100), Err(MediaError::UnsupportedType(_))));
        assert!(matches!(validate_upload("image/png", 0, 100), Err(MediaError::Empty)));
        assert!(matches!(
            validate_upload("video/mp4", 101, 100),
            Err(MediaError::TooLarge { size: 101, max: 100 })
        ));
    }

    #[test]
    fn test_sign_params_sorted() {
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1700000000".to_string());
        params.insert("folder", "agora/posts".to_string());

        let expected = {
            let mut hasher = Sha256::new();
            hasher.update(b"folder=agora/posts&timestamp=1700000000secret");
            hex::encode(hasher.finalize())
        };

        assert_eq!(sign_params(&params, "secret"), expected);
        assert_eq!(sign_params(&params, "secret").len(), 64);
    }

    #[test]
    fn test_sign_params_skips_empty() {
        let mut with_empty = BTreeMap::new();
        with_empty.insert("folder", String::new());
        with_empty.insert("timestamp", "1".to_string());

        let mut without = BTreeMap::new();
        without.insert("timestamp", "1".to_string());

        assert_eq!(sign_params(&with_empty, "s"), sign_params(&without, "s"));
    }

    #[test]
    fn test_upload_url_and_folder() {
        let store = store();
        assert_eq!(
            store.upload_url(ResourceType::Video),
            "https://media.example.com/v1_1/agora/video/upload"
        );
        assert_eq!(store.folder_for(Some("posts")), "agora/posts");
        assert_eq!(store.folder_for(Some("  ")), "agora");
        assert_eq!(store.folder_for(None), "agora");
    }

    #[tokio::test]
    async fn test_disabled_store() {
        let result = DisabledMediaStore
            .upload(MediaUpload {
                data: Bytes::from_static(b"png"),
                file_name: "a.png".to_string(),
                content_type: "image/png".to_string(),
                resource_type: ResourceType::Image,
                folder: None,
            })
            .await;

        assert!(matches!(result, Err(MediaError::NotConfigured)));
    }
}
