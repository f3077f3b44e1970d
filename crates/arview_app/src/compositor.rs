//! Still capture: the camera frame with the 3D layer on top, as one PNG.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use arview_capture::VideoFrame;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("could not write screenshot: {0}")]
    Io(#[from] std::io::Error),
}

/// Merges `video` (stretched to the layer size) under `layer`.
///
/// `layer` is the sRGB-encoded readback of a target rendered with
/// premultiplied alpha, so its colour decodes to premultiplied linear light.
/// Blending happens in linear space, matching what the window shows.
/// Without a video frame the background is opaque black.  The result is
/// opaque.
pub fn compose(video: Option<&VideoFrame>, layer: &RgbaImage) -> RgbaImage {
    let (w, h) = layer.dimensions();
    let mut out = match video.and_then(video_image) {
        Some(frame) if frame.dimensions() == (w, h) => frame,
        Some(frame) => imageops::resize(&frame, w, h, FilterType::Triangle),
        None => RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255])),
    };

    let decode = srgb_decode_table();
    for (dst, src) in out.pixels_mut().zip(layer.pixels()) {
        match src[3] {
            0 => {}
            255 => {
                dst[0] = src[0];
                dst[1] = src[1];
                dst[2] = src[2];
            }
            a => {
                let inv = 1.0 - f32::from(a) / 255.0;
                for c in 0..3 {
                    let linear = decode[usize::from(src[c])] + decode[usize::from(dst[c])] * inv;
                    dst[c] = srgb_encode(linear);
                }
            }
        }
        dst[3] = 255;
    }
    out
}

fn srgb_decode_table() -> [f32; 256] {
    std::array::from_fn(|i| {
        let v = i as f32 / 255.0;
        if v <= 0.04045 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    })
}

fn srgb_encode(linear: f32) -> u8 {
    let v = linear.clamp(0.0, 1.0);
    let encoded = if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round() as u8
}

fn video_image(frame: &VideoFrame) -> Option<RgbaImage> {
    if frame.width == 0 || frame.height == 0 {
        return None;
    }
    let image = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone());
    if image.is_none() {
        log::warn!(
            "video frame {}x{} has {} bytes; drawing black instead",
            frame.width,
            frame.height,
            frame.data.len()
        );
    }
    image
}

/// A composed still and when it was taken.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub image: RgbaImage,
    pub taken_at_ms: u64,
}

impl Screenshot {
    pub fn new(image: RgbaImage, taken_at_ms: u64) -> Self {
        Self { image, taken_at_ms }
    }

    pub fn file_name(&self) -> String {
        format!("ar-screenshot-{}.png", self.taken_at_ms)
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, ComposeError> {
        let mut bytes = Cursor::new(Vec::new());
        self.image.write_to(&mut bytes, ImageFormat::Png)?;
        Ok(bytes.into_inner())
    }

    /// Writes `<dir>/ar-screenshot-<millis>.png`, creating `dir` if needed.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, ComposeError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.encode_png()?)?;
        log::info!("screenshot saved to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_layer_shows_video() {
        let video = VideoFrame::filled(2, 2, [10, 200, 30, 255]);
        let layer = RgbaImage::new(4, 4);
        let out = compose(Some(&video), &layer);
        assert_eq!(out.dimensions(), (4, 4));
        assert!(out.pixels().all(|p| p.0 == [10, 200, 30, 255]));
    }

    #[test]
    fn opaque_layer_covers_video() {
        let video = VideoFrame::filled(4, 4, [10, 200, 30, 255]);
        let mut layer = RgbaImage::new(4, 4);
        layer.put_pixel(1, 2, Rgba([0, 255, 136, 255]));
        let out = compose(Some(&video), &layer);
        assert_eq!(out.get_pixel(1, 2).0, [0, 255, 136, 255]);
        assert_eq!(out.get_pixel(0, 0).0, [10, 200, 30, 255]);
    }

    #[test]
    fn translucent_layer_blends_premultiplied() {
        let video = VideoFrame::filled(1, 1, [200, 200, 200, 255]);
        let mut layer = RgbaImage::new(1, 1);
        // 50% white: premultiplied linear 0.5, sRGB-encoded to 188
        layer.put_pixel(0, 0, Rgba([188, 188, 188, 128]));
        let p = compose(Some(&video), &layer).get_pixel(0, 0).0;
        assert_eq!(p[3], 255);
        assert!((228..=231).contains(&p[0]), "got {p:?}");
    }

    #[test]
    fn blend_happens_in_linear_light() {
        // half-covered black over white lands at linear 0.5, not byte 128
        let video = VideoFrame::filled(1, 1, [255, 255, 255, 255]);
        let mut layer = RgbaImage::new(1, 1);
        layer.put_pixel(0, 0, Rgba([0, 0, 0, 128]));
        let p = compose(Some(&video), &layer).get_pixel(0, 0).0;
        assert!((186..=189).contains(&p[0]), "got {p:?}");
    }

    #[test]
    fn srgb_round_trip_is_exact() {
        let decode = srgb_decode_table();
        for b in 0..=255u8 {
            assert_eq!(srgb_encode(decode[usize::from(b)]), b);
        }
    }

    #[test]
    fn no_video_means_black_background() {
        let out = compose(None, &RgbaImage::new(3, 2));
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 255]));

        let truncated = VideoFrame {
            width: 3,
            height: 2,
            data: vec![255; 5],
        };
        let out = compose(Some(&truncated), &RgbaImage::new(3, 2));
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn screenshot_file_name_and_png() {
        let dir = tempfile::tempdir().unwrap();
        let shot = Screenshot::new(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])), 1_700_000_000_123);
        assert_eq!(shot.file_name(), "ar-screenshot-1700000000123.png");

        let path = shot.save(&dir.path().join("shots")).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(1, 1).0, [1, 2, 3, 255]);
    }
}
