//! Uploaded artifact photos
//!
//! An upload lives for one request: it is decoded once, re-encoded as PNG for
//! the vision backend, and echoed back to the page in its original encoding.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::NarratorError;

/// Upload formats accepted by the shell
pub const ACCEPTED_FORMATS: [ImageFormat; 3] =
    [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

/// A decoded artifact photo
#[derive(Debug, Clone)]
pub struct ArtifactImage {
    bytes: Vec<u8>,
    format: ImageFormat,
    bitmap: DynamicImage,
}

impl ArtifactImage {
    /// Decode uploaded bytes (JPEG, PNG or WEBP)
    pub fn decode(bytes: Vec<u8>) -> Result<Self, NarratorError> {
        let format = image::guess_format(&bytes)?;
        if !ACCEPTED_FORMATS.contains(&format) {
            return Err(NarratorError::UnsupportedImageFormat(format!("{:?}", format)));
        }

        let bitmap = image::load_from_memory_with_format(&bytes, format)?;
        debug!(
            "Decoded {:?} upload ({}x{}, {} bytes)",
            format,
            bitmap.width(),
            bitmap.height(),
            bytes.len()
        );

        Ok(Self {
            bytes,
            format,
            bitmap,
        })
    }

    /// Format the upload was sent in
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type of the original upload
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Width and height in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        (self.bitmap.width(), self.bitmap.height())
    }

    /// Original upload as a `data:` URI for display
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), BASE64.encode(&self.bytes))
    }

    /// Re-encode the bitmap as PNG
    pub fn to_png(&self) -> Result<Vec<u8>, NarratorError> {
        let mut png = Vec::new();
        self.bitmap
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }

    /// PNG payload, base64 encoded, as vision backends expect it
    pub fn to_png_base64(&self) -> Result<String, NarratorError> {
        Ok(BASE64.encode(self.to_png()?))
    }
}
