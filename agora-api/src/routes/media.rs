/// Media upload endpoint
///
/// `POST /v1/media` (multipart) with a `file` field and an optional `folder`
/// field. Images and videos are forwarded to the hosting service and the
/// hosted URL is returned:
///
/// ```json
/// { "url": "https://...", "public_id": "agora/posts/abc", "resource_type": "image", "bytes": 48213 }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use agora_shared::auth::middleware::AuthContext;
use agora_shared::integrations::media::{validate_upload, MediaUpload, UploadedMedia};
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;

const MAX_FOLDER_LEN: usize = 64;

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Upload exceeds the size limit".to_string())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Folder names are lower-case letters, digits, `-` and `_`
fn check_folder(folder: &str) -> ApiResult<()> {
    let valid = !folder.is_empty()
        && folder.len() <= MAX_FOLDER_LEN
        && folder
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');

    if !valid {
        return Err(ApiError::invalid(
            "folder",
            "Folder may only contain lower-case letters, digits, '-' and '_'",
        ));
    }

    Ok(())
}

/// Uploads an image or video
///
/// # Errors
///
/// - `400 Bad Request`: Missing `file` field or malformed multipart body
/// - `413 Payload Too Large`: File over `MEDIA_MAX_BYTES`
/// - `422 Unprocessable Entity`: Not an image or video, or bad folder name
/// - `502 Bad Gateway`: Hosting service failed
/// - `503 Service Unavailable`: Media hosting not configured
pub async fn upload_media(
    State(state): State<AppState>,
    auth: AuthContext,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadedMedia>)> {
    let mut file: Option<(Bytes, String, String)> = None;
    let mut folder: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((data, file_name, content_type));
            }
            Some("folder") => {
                let value = field.text().await.map_err(multipart_error)?;
                let value = value.trim().to_string();
                check_folder(&value)?;
                folder = Some(value);
            }
            _ => {}
        }
    }

    let (data, file_name, content_type) =
        file.ok_or_else(|| ApiError::BadRequest("Missing 'file' field".to_string()))?;

    let resource_type = validate_upload(&content_type, data.len(), state.config.media.max_bytes)?;

    let size = data.len();
    let uploaded = state
        .media
        .upload(MediaUpload {
            data,
            file_name,
            content_type,
            resource_type,
            folder,
        })
        .await?;

    tracing::info!(
        user_id = %auth.user_id,
        public_id = %uploaded.public_id,
        resource_type = resource_type.as_str(),
        bytes = size,
        "Media uploaded"
    );

    Ok((StatusCode::CREATED, Json(uploaded)))
}
