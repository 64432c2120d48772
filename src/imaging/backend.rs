//! QR imaging backend trait and shared types.
//!
//! The [`QrBackend`] trait covers the three things the catalogs need from an
//! image codec: render a payload into a QR image, write an image to disk, and
//! read one back. The catalogs never look inside the image; they only carry
//! the handle around for display.
//!
//! The production implementation is
//! [`QrcodeBackend`](super::qr_backend::QrcodeBackend).

use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for QR imaging backends.
pub trait QrBackend {
    /// Render a payload string as a QR code image.
    fn render(&self, payload: &str) -> Result<DynamicImage, BackendError>;

    /// Write an image to `path` as PNG.
    fn save(&self, image: &DynamicImage, path: &Path) -> Result<(), BackendError>;

    /// Read an image from disk.
    fn load(&self, path: &Path) -> Result<DynamicImage, BackendError>;
}
