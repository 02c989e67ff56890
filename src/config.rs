//! Configuration management for crabhdr
//!
//! Provides configuration loading, saving, and validation for bracket
//! requests, capture timing, fusion options and output storage.

use crate::bracket::CaptureOptions;
use crate::errors::FusionError;
use crate::fusion::{FusionOptions, FusionStrategy, ResizeFilter};
use crate::storage::{OutputFormat, StorageOptions};
use crate::types::BracketRequest;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrabHdrConfig {
    pub bracket: BracketConfig,
    pub capture: CaptureConfig,
    pub fusion: FusionConfig,
    pub storage: StorageConfig,
}

/// Bracket request defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketConfig {
    /// Number of exposures per bracket (3-7)
    pub shot_count: u32,
    /// EV spacing between exposures (0.5-2.0)
    pub ev_spacing: f32,
}

/// Capture timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Delay after each exposure change in milliseconds
    pub settle_delay_ms: u64,
    /// Retry attempts per exposure
    pub max_retries: u32,
    /// Restore unadjusted exposure after the bracket
    pub restore_exposure: bool,
}

/// Fusion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    pub strategy: FusionStrategy,
    pub resize_filter: ResizeFilter,
    /// Accept a single frame and return it unfused
    pub allow_single_frame: bool,
}

/// Output storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory fused images are written to
    pub output_directory: String,
    /// File name prefix
    pub file_prefix: String,
    /// Output image format (jpeg, png)
    pub format: OutputFormat,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for CrabHdrConfig {
    fn default() -> Self {
        Self {
            bracket: BracketConfig {
                shot_count: 3,
                ev_spacing: 1.0,
            },
            capture: CaptureConfig {
                settle_delay_ms: 150,
                max_retries: 2,
                restore_exposure: true,
            },
            fusion: FusionConfig {
                strategy: FusionStrategy::FlatAlpha,
                resize_filter: ResizeFilter::Triangle,
                allow_single_frame: false,
            },
            storage: StorageConfig {
                output_directory: "./captures".to_string(),
                file_prefix: "HDR".to_string(),
                format: OutputFormat::Jpeg,
                jpeg_quality: 95,
            },
        }
    }
}

impl CrabHdrConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, FusionError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| FusionError::InvalidConfig(format!("Failed to read config file: {}", e)))?;

        let config: CrabHdrConfig = toml::from_str(&contents)
            .map_err(|e| FusionError::InvalidConfig(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), FusionError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                FusionError::Storage(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| FusionError::InvalidConfig(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| FusionError::Storage(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabhdr.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), FusionError> {
        self.bracket_request().validate()?;

        if self.capture.max_retries > 10 {
            return Err(FusionError::InvalidConfig(
                "max_retries must be at most 10".to_string(),
            ));
        }
        if self.capture.settle_delay_ms > 10_000 {
            return Err(FusionError::InvalidConfig(
                "settle_delay_ms must be at most 10000".to_string(),
            ));
        }

        self.storage_options().validate()?;
        if self.storage.file_prefix.contains(['/', '\\']) {
            return Err(FusionError::InvalidConfig(
                "file_prefix must not contain path separators".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bracket_request(&self) -> BracketRequest {
        BracketRequest::new(self.bracket.shot_count, self.bracket.ev_spacing)
    }

    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            settle_delay_ms: self.capture.settle_delay_ms,
            max_retries: self.capture.max_retries,
            restore_exposure: self.capture.restore_exposure,
        }
    }

    pub fn fusion_options(&self) -> FusionOptions {
        FusionOptions {
            strategy: self.fusion.strategy,
            resize_filter: self.fusion.resize_filter,
            allow_single_frame: self.fusion.allow_single_frame,
        }
    }

    pub fn storage_options(&self) -> StorageOptions {
        StorageOptions {
            output_directory: PathBuf::from(&self.storage.output_directory),
            file_prefix: self.storage.file_prefix.clone(),
            format: self.storage.format,
            jpeg_quality: self.storage.jpeg_quality,
        }
    }
}
