//! Face-presence check.
//!
//! There is no detector behind this: the check crops the central square
//! where a portrait's face usually sits and always reports a face. Failing to
//! crop (e.g. on a 1x1 image) also counts as a face so analysis can proceed.

use anyhow::Result;
use image::{DynamicImage, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, warn};

/// Side of the central square as a fraction of the shorter image side
pub const FACE_REGION_RATIO: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

impl FaceRegion {
    /// Central square for an image of the given size
    pub fn central(width: u32, height: u32) -> Result<Self> {
        let size = (width.min(height) as f32 * FACE_REGION_RATIO) as u32;
        if size == 0 {
            anyhow::bail!("image {}x{} is too small for a face region", width, height);
        }

        let x = (width as f32 / 2.0 - size as f32 / 2.0) as u32;
        let y = (height as f32 / 2.0 - size as f32 / 2.0) as u32;

        Ok(Self { x, y, size })
    }
}

/// Crop the central face region
pub fn extract_face_region(image: &DynamicImage) -> Result<(FaceRegion, DynamicImage)> {
    let region = FaceRegion::central(image.width(), image.height())?;
    let crop = image.crop_imm(region.x, region.y, region.size, region.size);
    Ok((region, crop))
}

/// Always true; see the module docs.
pub fn detect_face(image: &DynamicImage) -> bool {
    match extract_face_region(image) {
        Ok((region, _crop)) => {
            debug!(
                "Face region at ({}, {}) size {}",
                region.x, region.y, region.size
            );
            true
        }
        Err(e) => {
            warn!("Face region extraction failed, continuing anyway: {}", e);
            true
        }
    }
}

/// Copy of `image` with the face region outlined
pub fn annotate_face_region(image: &DynamicImage, region: FaceRegion) -> DynamicImage {
    let mut canvas = image.to_rgb8();
    let rect = Rect::at(region.x as i32, region.y as i32).of_size(region.size, region.size);
    draw_hollow_rect_mut(&mut canvas, rect, Rgb([0u8, 255, 0]));
    DynamicImage::ImageRgb8(canvas)
}
