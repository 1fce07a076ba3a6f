use thiserror::Error;

use crate::config::UploadConfig;
use crate::integrations::{ResourceType, UploadRequest};

const IMAGE_TYPES: &[&str] = &["logo", "hero", "banner", "gallery", "team", "product", "general"];
const VIDEO_TYPES: &[&str] = &["hero", "background", "testimonial", "tutorial", "promo", "general"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file provided")]
    MissingFile,

    #[error("Description is required (minimum 3 characters)")]
    AltTooShort,

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File too large. Maximum size is {limit_mb}MB.")]
    TooLarge { limit_mb: usize },

    #[error("Business setup incomplete. Please complete your business profile first.")]
    SetupIncomplete,

    #[error("Failed to parse upload data: {0}")]
    Malformed(String),
}

/// File part pulled out of the multipart body
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Lowercase, strip punctuation, hyphenate whitespace, cap at 50 chars
pub fn slugify(text: &str) -> String {
    let cleaned: String = text
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut slug = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }

    slug.chars().take(50).collect()
}

fn resource_type(content_type: &str) -> Result<ResourceType, UploadError> {
    if content_type.starts_with("video/") {
        Ok(ResourceType::Video)
    } else if content_type.starts_with("image/") {
        Ok(ResourceType::Image)
    } else {
        Err(UploadError::UnsupportedType(content_type.to_string()))
    }
}

/// Requested media type if known for the resource, else `general`
pub fn media_type(resource: ResourceType, requested: Option<&str>) -> &'static str {
    let allowed = match resource {
        ResourceType::Image => IMAGE_TYPES,
        ResourceType::Video => VIDEO_TYPES,
    };
    requested
        .and_then(|r| allowed.iter().find(|t| **t == r).copied())
        .unwrap_or("general")
}

/// Validate an upload and build the provider request. Checks run in the
/// order: tenant setup, file presence, alt text, content type, size.
pub fn prepare_upload(
    tenant_slug: Option<&str>,
    file: Option<IncomingFile>,
    alt: Option<&str>,
    requested_type: Option<&str>,
    limits: &UploadConfig,
    timestamp_millis: i64,
) -> Result<UploadRequest, UploadError> {
    let slug = tenant_slug
        .filter(|s| !s.is_empty())
        .ok_or(UploadError::SetupIncomplete)?;
    let file = file.ok_or(UploadError::MissingFile)?;

    let alt = alt.map(str::trim).unwrap_or_default();
    if alt.chars().count() < 3 {
        return Err(UploadError::AltTooShort);
    }

    let resource = resource_type(&file.content_type)?;
    let max_bytes = match resource {
        ResourceType::Image => limits.max_image_bytes,
        ResourceType::Video => limits.max_video_bytes,
    };
    if file.bytes.len() > max_bytes {
        return Err(UploadError::TooLarge {
            limit_mb: max_bytes / (1024 * 1024),
        });
    }

    let kind = media_type(resource, requested_type);
    let mut folder = format!("clientflow/{}", slug);
    let mut tags = vec![kind.to_string(), slug.to_string()];
    if resource == ResourceType::Video {
        folder.push_str("/videos");
        tags.push("video".to_string());
    }

    Ok(UploadRequest {
        folder,
        public_id: format!("{}-{}", slugify(alt), timestamp_millis),
        resource_type: resource,
        tags,
        file_name: file.file_name,
        content_type: file.content_type,
        bytes: file.bytes,
    })
}
