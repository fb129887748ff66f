//! Image Service - profile image uploads and resized variants
//!
//! Reading a profile image never writes an attachment: a user either has an
//! uploaded image or gets the well-known default asset.

use image::{DynamicImage, ImageFormat, imageops::FilterType};
use std::io::Cursor;

use crate::domain::{DomainError, User, ValidationErrors};
use crate::infrastructure::storage::{DiskStorage, content_type_of};

pub const DEFAULT_SIZE: u32 = 100;
pub const MAX_SIZE: u32 = 2000;

/// Requested bounding box for a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    /// Missing dimensions default to 100; all are clamped to 1..=2000
    pub fn from_query(width: Option<u32>, height: Option<u32>) -> Self {
        let clamp = |v: Option<u32>| v.unwrap_or(DEFAULT_SIZE).clamp(1, MAX_SIZE);
        Self {
            width: clamp(width),
            height: clamp(height),
        }
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::from_query(None, None)
    }
}

/// Where a user's profile image can be fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileImage {
    Attached {
        user_id: i32,
        key: String,
        size: ImageSize,
    },
    Default(String),
}

impl ProfileImage {
    pub fn for_user(user: &User, default_image: &str, size: ImageSize) -> Self {
        match &user.profile_image {
            Some(key) => ProfileImage::Attached {
                user_id: user.id,
                key: key.clone(),
                size,
            },
            None => ProfileImage::Default(default_image.to_string()),
        }
    }

    pub fn url(&self) -> String {
        match self {
            ProfileImage::Attached { user_id, size, .. } => format!(
                "/users/{}/profile_image?width={}&height={}",
                user_id, size.width, size.height
            ),
            ProfileImage::Default(path) => path.clone(),
        }
    }
}

/// Accepted upload formats and their storage extensions
fn sniff(bytes: &[u8]) -> Result<(ImageFormat, &'static str), DomainError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => Ok((ImageFormat::Png, "png")),
        Ok(ImageFormat::Jpeg) => Ok((ImageFormat::Jpeg, "jpg")),
        _ => Err(DomainError::invalid("profile_image", UNSUPPORTED_IMAGE)),
    }
}

const UNSUPPORTED_IMAGE: &str = "must be a JPEG or PNG image";

/// Decode check for an upload; returns the storage extension
fn check_upload(bytes: &[u8]) -> Result<&'static str, DomainError> {
    let (format, extension) = sniff(bytes)?;
    // Reject files that only carry a valid magic number
    image::load_from_memory_with_format(bytes, format).map_err(|e| {
        tracing::warn!("Rejected undecodable profile image: {}", e);
        DomainError::invalid("profile_image", UNSUPPORTED_IMAGE)
    })?;
    Ok(extension)
}

/// Record a `profile_image` error alongside the other form errors
pub fn validate_upload(errors: &mut ValidationErrors, bytes: &[u8]) {
    if check_upload(bytes).is_err() {
        errors.add("profile_image", UNSUPPORTED_IMAGE);
    }
}

/// Check an upload and store it, returning the storage key
pub async fn store_upload(storage: &DiskStorage, bytes: &[u8]) -> Result<String, DomainError> {
    let extension = check_upload(bytes)?;
    storage.put(bytes, extension).await
}

/// Shrink to fit inside `size`, keeping the aspect ratio. Smaller images are
/// re-encoded unchanged.
pub fn resize_to_limit(bytes: &[u8], size: ImageSize) -> Result<Vec<u8>, DomainError> {
    let (format, _) = sniff(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| DomainError::Storage(format!("Failed to decode image: {}", e)))?;

    let img = if img.width() > size.width || img.height() > size.height {
        img.resize(size.width, size.height, FilterType::Triangle)
    } else {
        img
    };

    // JPEG has no alpha channel
    let img = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img,
    };

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)
        .map_err(|e| DomainError::Storage(format!("Failed to encode image: {}", e)))?;
    Ok(out.into_inner())
}

/// Fetch (or build and cache) a resized variant. Returns bytes and content type.
pub async fn variant(
    storage: &DiskStorage,
    key: &str,
    size: ImageSize,
) -> Result<(Vec<u8>, &'static str), DomainError> {
    let content_type = content_type_of(key);

    if let Some(bytes) = storage.read_variant(key, size.width, size.height).await? {
        return Ok((bytes, content_type));
    }

    let original = storage.get(key).await?;
    let resized = tokio::task::spawn_blocking(move || resize_to_limit(&original, size))
        .await
        .map_err(|e| DomainError::Internal(e.to_string()))??;

    storage
        .write_variant(key, size.width, size.height, &resized)
        .await?;
    tracing::debug!(
        "Built variant {}x{} for {}",
        size.width,
        size.height,
        key
    );

    Ok((resized, content_type))
}
