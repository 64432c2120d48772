//! Pure Rust QR backend.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Encode payload | `qrcode::QrCode` at error-correction level L, smallest fitting version |
//! | Rasterize | `qrcode` renderer → `image::GrayImage`, black on white |
//! | Write PNG | `image::DynamicImage::save_with_format` |
//! | Read | `image::ImageReader` with format guessing |

use super::backend::{BackendError, QrBackend};
use image::{DynamicImage, ImageFormat, ImageReader, Luma};
use qrcode::{EcLevel, QrCode};
use std::path::Path;

/// Pixels per QR module.
pub const DEFAULT_MODULE_SIZE: u32 = 10;

pub struct QrcodeBackend {
    module_size: u32,
}

impl QrcodeBackend {
    pub fn new() -> Self {
        Self {
            module_size: DEFAULT_MODULE_SIZE,
        }
    }

    pub fn with_module_size(module_size: u32) -> Self {
        Self {
            module_size: module_size.max(1),
        }
    }
}

impl Default for QrcodeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl QrBackend for QrcodeBackend {
    fn render(&self, payload: &str) -> Result<DynamicImage, BackendError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L)
            .map_err(|e| BackendError::ProcessingFailed(format!("Failed to encode payload: {e}")))?;
        // The quiet zone is 4 modules on each side.
        let image = code
            .render::<Luma<u8>>()
            .module_dimensions(self.module_size, self.module_size)
            .quiet_zone(true)
            .build();
        Ok(DynamicImage::ImageLuma8(image))
    }

    fn save(&self, image: &DynamicImage, path: &Path) -> Result<(), BackendError> {
        image.save_with_format(path, ImageFormat::Png).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    fn load(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        ImageReader::open(path)
            .map_err(BackendError::Io)?
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Failed to decode {}: {}",
                    path.display(),
                    e
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn render_produces_square_image_with_quiet_zone() {
        let backend = QrcodeBackend::new();
        let img = backend.render("dive;noid;dive_type:0").unwrap();
        let (w, h) = img.dimensions();
        assert_eq!(w, h);
        // Smallest QR is 21 modules, plus 4 on each side
        assert!(w >= (21 + 8) * DEFAULT_MODULE_SIZE);
        assert_eq!(w % DEFAULT_MODULE_SIZE, 0);
        // Quiet zone corner is white, first finder module is black
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
        let finder = 4 * DEFAULT_MODULE_SIZE;
        assert_eq!(img.get_pixel(finder, finder).0[0], 0);
    }

    #[test]
    fn longer_payload_grows_the_code() {
        let backend = QrcodeBackend::with_module_size(1);
        let small = backend.render("x").unwrap();
        let large = backend.render(&"dive;noid;".repeat(40)).unwrap();
        assert!(large.width() > small.width());
    }

    #[test]
    fn save_and_load_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("code.png");
        let backend = QrcodeBackend::with_module_size(2);
        let img = backend.render("payload").unwrap();
        backend.save(&img, &path).unwrap();

        let loaded = backend.load(&path).unwrap();
        assert_eq!(loaded.dimensions(), img.dimensions());
    }

    #[test]
    fn load_garbage_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("fake.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(QrcodeBackend::new().load(&path).is_err());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = QrcodeBackend::new().load(Path::new("/nonexistent/code.png"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = "x".repeat(8000);
        assert!(QrcodeBackend::new().render(&payload).is_err());
    }
}
