//! Object storage helpers (S3 in production, MinIO locally).

use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

/// Uploads `body` to `s3://{bucket}/{key}`.
pub async fn put_object(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    body: Bytes,
    content_type: &str,
) -> Result<(), AppError> {
    let size = body.len();
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Upload of {key} failed: {e}")))?;

    info!("Uploaded {size} bytes to s3://{bucket}/{key}");
    Ok(())
}

/// File extension for the intro video content types we accept.
pub fn video_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        "video/quicktime" => Some("mov"),
        _ => None,
    }
}

pub fn intro_video_key(user_id: Uuid, extension: &str) -> String {
    format!("intro-videos/{user_id}/{}.{extension}", Uuid::new_v4())
}

/// Public URL of an object given the bucket's base URL.
pub fn public_object_url(base_url: &str, key: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_extension() {
        assert_eq!(video_extension("video/mp4"), Some("mp4"));
        assert_eq!(video_extension("video/quicktime"), Some("mov"));
        assert_eq!(video_extension("image/png"), None);
    }

    #[test]
    fn test_intro_video_key_is_scoped_to_user() {
        let user = Uuid::new_v4();
        let key = intro_video_key(user, "webm");
        assert!(key.starts_with(&format!("intro-videos/{user}/")));
        assert!(key.ends_with(".webm"));
        assert_ne!(key, intro_video_key(user, "webm"));
    }

    #[test]
    fn test_public_object_url_joins_cleanly() {
        assert_eq!(
            public_object_url("http://localhost:9000/media/", "intro-videos/a.mp4"),
            "http://localhost:9000/media/intro-videos/a.mp4"
        );
    }
}
