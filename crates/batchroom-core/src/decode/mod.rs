//! Source image decoding.
//!
//! Turns the raw bytes behind a [`crate::SourceImage`] into an RGBA8 surface
//! in its natural, stored orientation. EXIF rotation is not applied.
//!
//! Supported containers: PNG, JPEG, WebP, GIF (first frame) and BMP. The
//! format is sniffed from the magic bytes, never from a file name.
//!
//! # Examples
//!
//! ```ignore
//! use batchroom_core::decode::decode_image;
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width(), image.height());
//! ```

mod reader;
mod types;

pub use reader::{decode_image, probe_dimensions};
pub use types::{DecodeError, ResampleFilter};
