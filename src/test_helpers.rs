//! Shared fixtures for unit tests: PNG generation and fake encoders, so the
//! pipeline can be exercised without `cwebp` installed.

use crate::config::Quality;
use crate::error::ConvertError;
use crate::image_processor::WebpEncoder;
use crate::metadata::{DimensionReader, ImageHeaderReader};
use async_trait::async_trait;
use std::path::Path;

/// Write a solid PNG of the given size, regardless of the file extension
pub fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]))
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Copies the source bytes to the output after checking they decode
pub struct CopyEncoder;

#[async_trait]
impl WebpEncoder for CopyEncoder {
    fn name(&self) -> &str {
        "copy"
    }

    async fn encode(&self, input: &Path, output: &Path, _quality: Quality) -> Result<(), ConvertError> {
        ImageHeaderReader.read_dimensions(input).map_err(|e| ConvertError::Conversion {
            path: input.to_path_buf(),
            reason: e.to_string(),
        })?;
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    async fn validate(&self) -> Result<(), ConvertError> {
        Ok(())
    }
}

/// Always fails to encode
pub struct FailingEncoder;

#[async_trait]
impl WebpEncoder for FailingEncoder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn encode(&self, input: &Path, _output: &Path, _quality: Quality) -> Result<(), ConvertError> {
        Err(ConvertError::Conversion {
            path: input.to_path_buf(),
            reason: "encoder refused".to_string(),
        })
    }

    async fn validate(&self) -> Result<(), ConvertError> {
        Ok(())
    }
}

/// Reports success without writing anything
pub struct SilentEncoder;

#[async_trait]
impl WebpEncoder for SilentEncoder {
    fn name(&self) -> &str {
        "silent"
    }

    async fn encode(&self, _input: &Path, _output: &Path, _quality: Quality) -> Result<(), ConvertError> {
        Ok(())
    }

    async fn validate(&self) -> Result<(), ConvertError> {
        Ok(())
    }
}

/// Encoder that is not installed
pub struct MissingEncoder;

#[async_trait]
impl WebpEncoder for MissingEncoder {
    fn name(&self) -> &str {
        "missing"
    }

    async fn encode(&self, input: &Path, _output: &Path, _quality: Quality) -> Result<(), ConvertError> {
        Err(ConvertError::Conversion {
            path: input.to_path_buf(),
            reason: "not installed".to_string(),
        })
    }

    async fn validate(&self) -> Result<(), ConvertError> {
        Err(ConvertError::MissingDependency("missing".to_string()))
    }
}
