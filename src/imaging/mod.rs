//! QR imaging in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Render** | `qrcode` (level L, 10 px modules, 4-module quiet zone) |
//! | **Save** | `image` PNG encoder |
//! | **Load** | `image::ImageReader` |
//!
//! The module is split into:
//! - **Backend**: [`QrBackend`] trait, the seam the catalogs depend on
//! - **QR backend**: [`QrcodeBackend`], the production implementation

pub mod backend;
pub mod qr_backend;

pub use backend::{BackendError, QrBackend};
pub use qr_backend::QrcodeBackend;
