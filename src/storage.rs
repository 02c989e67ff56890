//! Persistence helpers for fused images
//!
//! Writing results is the caller's business; these helpers cover the common
//! case of dropping a fused image into a picture directory. The batch that a
//! file belongs to is always passed in explicitly.

use crate::errors::FusionError;
use crate::types::Frame;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Identifier grouping the files written for one capture session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(uuid::Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Short form used in file names
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    /// Pick a format from a file extension, PNG unless it says JPEG
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => OutputFormat::Jpeg,
            _ => OutputFormat::Png,
        }
    }
}

/// Where and how fused images are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageOptions {
    pub output_directory: PathBuf,
    pub file_prefix: String,
    pub format: OutputFormat,
    pub jpeg_quality: u8,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("./captures"),
            file_prefix: "HDR".to_string(),
            format: OutputFormat::Jpeg,
            jpeg_quality: 95,
        }
    }
}

impl StorageOptions {
    pub fn validate(&self) -> Result<(), FusionError> {
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(FusionError::InvalidConfig(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }
        Ok(())
    }

    /// `{prefix}_{batch}_{timestamp}.{ext}` inside the output directory
    pub fn file_path(&self, batch: &BatchId) -> PathBuf {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S_%3f");
        self.output_directory.join(format!(
            "{}_{}_{}.{}",
            self.file_prefix,
            batch.short(),
            timestamp,
            self.format.extension()
        ))
    }
}

/// Write a fused image into the configured directory.
///
/// Returns the path written. RGBA images are flattened to RGB for JPEG.
pub fn save_fused(frame: &Frame, batch: &BatchId, options: &StorageOptions) -> Result<PathBuf, FusionError> {
    options.validate()?;

    fs::create_dir_all(&options.output_directory).map_err(|e| {
        FusionError::Storage(format!(
            "Failed to create output directory {:?}: {}",
            options.output_directory, e
        ))
    })?;

    let (path, file) = create_unique(&options.file_path(batch))?;
    write_frame(frame, file, &path, options.format, options.jpeg_quality)?;

    log::info!("Saved fused image for batch {} to {:?}", batch, path);
    Ok(path)
}

/// Save any frame, choosing the format from the extension.
pub fn save_frame<P: AsRef<Path>>(frame: &Frame, path: P, jpeg_quality: u8) -> Result<(), FusionError> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| FusionError::Storage(format!("Failed to create {:?}: {}", path, e)))?;
    write_frame(frame, file, path, OutputFormat::from_path(path), jpeg_quality)?;
    log::debug!("Frame {} saved to {:?}", frame.id, path);
    Ok(())
}

/// Decode an image file into a frame.
pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<Frame, FusionError> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .map_err(|e| FusionError::Storage(format!("Failed to read {:?}: {}", path, e)))?;
    let frame = Frame::decode(&bytes)?;
    log::debug!(
        "Loaded {:?}: {}x{}x{}",
        path,
        frame.width,
        frame.height,
        frame.channels
    );
    Ok(frame)
}

/// Upper bound on `_N` suffixes tried before giving up on a unique name
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Create `base`, or `{stem}_{n}.{ext}` beside it if the name is taken.
///
/// Existing files are never truncated.
fn create_unique(base: &Path) -> Result<(PathBuf, File), FusionError> {
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
    let extension = base.extension().and_then(|s| s.to_str());

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = match (attempt, extension) {
            (0, _) => base.to_path_buf(),
            (n, Some(ext)) => base.with_file_name(format!("{}_{}.{}", stem, n, ext)),
            (n, None) => base.with_file_name(format!("{}_{}", stem, n)),
        };

        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                log::debug!("{:?} already exists, trying next name", candidate);
            }
            Err(e) => {
                return Err(FusionError::Storage(format!(
                    "Failed to create {:?}: {}",
                    candidate, e
                )));
            }
        }
    }

    Err(FusionError::Storage(format!(
        "No free file name for {:?} after {} attempts",
        base, MAX_NAME_ATTEMPTS
    )))
}

fn write_frame(
    frame: &Frame,
    file: File,
    path: &Path,
    format: OutputFormat,
    jpeg_quality: u8,
) -> Result<(), FusionError> {
    let img = frame.to_dynamic()?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Jpeg => {
            let img = if frame.channels == 4 {
                image::DynamicImage::ImageRgb8(img.into_rgb8())
            } else {
                img
            };
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, jpeg_quality);
            img.write_with_encoder(encoder)
                .map_err(|e| FusionError::Storage(format!("Failed to encode JPEG {:?}: {}", path, e)))?;
        }
        OutputFormat::Png => {
            img.write_to(&mut writer, image::ImageFormat::Png)
                .map_err(|e| FusionError::Storage(format!("Failed to save PNG {:?}: {}", path, e)))?;
        }
    }

    writer
        .flush()
        .map_err(|e| FusionError::Storage(format!("Failed to flush {:?}: {}", path, e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a.JPG")), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_path(Path::new("a.jpeg")), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_path(Path::new("a.png")), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("a")), OutputFormat::Png);
    }

    #[test]
    fn test_file_path_contains_batch() {
        let batch = BatchId::new();
        let options = StorageOptions::default();
        let path = options.file_path(&batch);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(&format!("HDR_{}_", batch.short())));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_quality_validation() {
        let mut options = StorageOptions::default();
        options.jpeg_quality = 101;
        assert!(options.validate().is_err());
        options.jpeg_quality = 1;
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_png_round_trip_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let frame = Frame::rgb((0..48).collect(), 4, 4);

        save_frame(&frame, &path, 95).unwrap();
        let loaded = load_frame(&path).unwrap();

        assert_eq!(loaded.dimensions(), (4, 4));
        assert_eq!(loaded.channels, 3);
        assert_eq!(loaded.data, frame.data);
    }

    #[test]
    fn test_create_unique_never_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("HDR_abcd1234_20260101_120000_000.jpg");
        fs::write(&base, b"first").unwrap();

        let (path, _file) = create_unique(&base).unwrap();
        assert_eq!(path, dir.path().join("HDR_abcd1234_20260101_120000_000_1.jpg"));
        assert_eq!(fs::read(&base).unwrap(), b"first");

        let (next, _file) = create_unique(&base).unwrap();
        assert_eq!(next, dir.path().join("HDR_abcd1234_20260101_120000_000_2.jpg"));
    }

    #[test]
    fn test_rapid_saves_in_one_batch_keep_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let options = StorageOptions {
            output_directory: dir.path().to_path_buf(),
            format: OutputFormat::Png,
            ..Default::default()
        };
        let batch = BatchId::new();

        let paths: Vec<PathBuf> = (0..5u8)
            .map(|v| save_fused(&Frame::rgb(vec![v; 12], 2, 2), &batch, &options).unwrap())
            .collect();

        let unique: std::collections::HashSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), 5);
        for (v, path) in paths.iter().enumerate() {
            assert_eq!(load_frame(path).unwrap().data, vec![v as u8; 12]);
        }
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_frame("definitely/not/here.png"),
            Err(FusionError::Storage(_))
        ));
    }
}
