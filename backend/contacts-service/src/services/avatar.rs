/// Avatar ingestion: staged upload, square resize, atomic publish
use crate::error::{AppError, Result};
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Published avatars are exact squares of this edge length.
pub const AVATAR_SIZE: u32 = 250;

/// Upload size guardrail, checked while streaming the request body.
pub const MAX_AVATAR_BYTES: usize = 10 * 1024 * 1024; // 10MB

const JPEG_QUALITY: u8 = 85;

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Filesystem layout for avatar files.
///
/// Uploads stream into `<public>/tmp` first; only a successfully decoded
/// and resized image is moved into the served `<public>/avatars`
/// directory, so a failed upload never replaces the current avatar.
#[derive(Clone)]
pub struct AvatarStore {
    avatars_dir: PathBuf,
    staging_dir: PathBuf,
}

impl AvatarStore {
    pub async fn new(public_dir: &str) -> Result<Self> {
        let root = PathBuf::from(public_dir);
        let avatars_dir = root.join("avatars");
        let staging_dir = root.join("tmp");

        tokio::fs::create_dir_all(&avatars_dir).await?;
        tokio::fs::create_dir_all(&staging_dir).await?;

        Ok(Self {
            avatars_dir,
            staging_dir,
        })
    }

    pub fn avatars_dir(&self) -> &Path {
        &self.avatars_dir
    }

    /// Lowercased extension of the uploaded filename, if it is one we
    /// can both decode and re-encode.
    pub fn allowed_extension(filename: &str) -> Option<String> {
        let ext = Path::new(filename).extension()?.to_str()?.to_lowercase();
        ALLOWED_EXTENSIONS
            .contains(&ext.as_str())
            .then_some(ext)
    }

    /// Fresh staging path for an incoming upload.
    pub fn staging_path(&self, ext: &str) -> PathBuf {
        self.staging_dir.join(format!("{}.{}", Uuid::new_v4(), ext))
    }

    /// Normalize the staged file and publish it under the owner's
    /// deterministic name. Returns the relative URL path stored on the
    /// user row. On any failure the staged file is removed and the
    /// previously published avatar stays untouched.
    pub async fn publish(&self, staged: &Path, owner_id: Uuid, ext: &str) -> Result<String> {
        if let Err(err) = resize_square(staged, AVATAR_SIZE, ext).await {
            let _ = tokio::fs::remove_file(staged).await;
            return Err(err);
        }

        // A replacement under a new extension must not leave the old
        // file behind as a stale sibling.
        for other in ALLOWED_EXTENSIONS {
            if *other != ext {
                let stale = self.avatars_dir.join(format!("{}.{}", owner_id, other));
                let _ = tokio::fs::remove_file(stale).await;
            }
        }

        let final_name = format!("{}.{}", owner_id, ext);
        let final_path = self.avatars_dir.join(&final_name);
        tokio::fs::rename(staged, &final_path).await?;

        Ok(format!("avatars/{}", final_name))
    }

    /// Remove a staged file after an aborted upload.
    pub async fn discard(&self, staged: &Path) {
        let _ = tokio::fs::remove_file(staged).await;
    }
}

/// Decode the staged image, resize it to an exact square and write it
/// back in place. Runs on the blocking pool; decode and encode are CPU
/// bound.
async fn resize_square(path: &Path, size: u32, ext: &str) -> Result<()> {
    let path = path.to_path_buf();
    let ext = ext.to_string();

    tokio::task::spawn_blocking(move || {
        let img = image::open(&path)?;
        let resized = img.resize_exact(size, size, FilterType::Lanczos3);

        if matches!(ext.as_str(), "jpg" | "jpeg") {
            // JPEG has no alpha channel; flatten before encoding.
            let rgb = resized.to_rgb8();
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                std::fs::File::create(&path)?,
                JPEG_QUALITY,
            );
            encoder.encode(rgb.as_raw(), size, size, image::ColorType::Rgb8)?;
        } else if ext == "webp" {
            // The webp encoder is lossless-only and wants rgb/rgba input.
            let rgba = resized.to_rgba8();
            let encoder =
                image::codecs::webp::WebPEncoder::new_lossless(std::fs::File::create(&path)?);
            encoder.encode(rgba.as_raw(), size, size, image::ColorType::Rgba8)?;
        } else {
            resized.save(&path)?;
        }

        Ok::<_, AppError>(())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Image task failed: {}", e)))?
}
