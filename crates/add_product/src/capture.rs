//! Captured product photo held by the form.

use std::{fmt, io::Cursor, sync::Arc};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GenericImageView, ImageFormat};

/// Camera frame after orientation correction. Cheap to clone.
#[derive(Clone)]
pub struct CapturedImage {
    image: Arc<DynamicImage>,
}

impl CapturedImage {
    /// Frames arrive in sensor orientation; the form stores them rotated a
    /// quarter turn clockwise.
    pub fn from_camera_frame(frame: DynamicImage) -> Self {
        Self {
            image: Arc::new(frame.rotate90()),
        }
    }

    pub fn decode_frame(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).context("failed to decode captured image")
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.image
            .write_to(&mut out, ImageFormat::Png)
            .context("failed to encode captured image as png")?;
        Ok(out.into_inner())
    }

    pub fn to_png_data_url(&self) -> Result<String> {
        Ok(format!(
            "data:image/png;base64,{}",
            STANDARD.encode(self.to_png_bytes()?)
        ))
    }
}

impl PartialEq for CapturedImage {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image) || *self.image == *other.image
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.dimensions();
        f.debug_struct("CapturedImage")
            .field("width", &width)
            .field("height", &height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn marked_frame() -> DynamicImage {
        // 3x2 frame with a red pixel in the top-left corner.
        let mut frame = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 255]));
        frame.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        DynamicImage::ImageRgba8(frame)
    }

    #[test]
    fn camera_frame_is_rotated_clockwise() {
        let captured = CapturedImage::from_camera_frame(marked_frame());
        assert_eq!(captured.dimensions(), (2, 3));
        // Top-left moves to top-right under a clockwise quarter turn.
        assert_eq!(captured.image().get_pixel(1, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(captured.image().get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn png_round_trip_keeps_rotated_dimensions() {
        let captured = CapturedImage::from_camera_frame(marked_frame());
        let bytes = captured.to_png_bytes().expect("encode");
        let decoded = CapturedImage::decode_frame(&bytes).expect("decode");
        assert_eq!(decoded.dimensions(), (2, 3));
    }

    #[test]
    fn data_url_carries_png_prefix() {
        let captured = CapturedImage::from_camera_frame(marked_frame());
        let url = captured.to_png_data_url().expect("encode");
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(CapturedImage::decode_frame(b"not an image").is_err());
    }

    #[test]
    fn equality_compares_pixels() {
        let a = CapturedImage::from_camera_frame(marked_frame());
        let b = CapturedImage::from_camera_frame(marked_frame());
        assert_eq!(a, b);
        assert_eq!(a, a.clone());
    }
}
