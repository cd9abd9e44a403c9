use anyhow::Result;
use image::{DynamicImage, RgbImage};
use ndarray::{Array3, Array4, Axis};

use crate::error::AnalysisError;

/// Spatial size of the model input (height, width)
pub const MODEL_INPUT_SIZE: (usize, usize) = (224, 224);

/// Decode an encoded image (JPEG, PNG, ...)
pub fn decode_image(data: &[u8]) -> Result<DynamicImage, AnalysisError> {
    let image = image::load_from_memory(data).map_err(|e| AnalysisError::Decode(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(AnalysisError::Decode("image has no pixels".to_string()));
    }
    Ok(image)
}

/// Resize, scale to [0, 1] and add the batch axis: `[1, 224, 224, 3]`
pub fn preprocess(image: &DynamicImage) -> Result<Array4<f32>> {
    let (target_h, target_w) = MODEL_INPUT_SIZE;
    let resized = resize_bilinear(&image.to_rgb8(), target_h, target_w)?;
    let normalized = resized.mapv(|v| v / 255.0);
    Ok(normalized.insert_axis(Axis(0)))
}

/// Bilinear resize to an HWC float array, keeping the native 0..255 range.
///
/// Source coordinates are `dst * (in / out)` without half-pixel offsets,
/// clamped at the bottom/right edge.
pub fn resize_bilinear(image: &RgbImage, out_h: usize, out_w: usize) -> Result<Array3<f32>> {
    let (in_w, in_h) = (image.width() as usize, image.height() as usize);
    if in_w == 0 || in_h == 0 {
        anyhow::bail!("cannot resize an empty image");
    }
    if out_w == 0 || out_h == 0 {
        anyhow::bail!("target size must be non-zero");
    }

    let scale_y = in_h as f32 / out_h as f32;
    let scale_x = in_w as f32 / out_w as f32;

    // Horizontal sample positions are shared by every row
    let columns: Vec<(u32, u32, f32)> = (0..out_w)
        .map(|x| {
            let src_x = x as f32 * scale_x;
            let x0 = (src_x.floor() as usize).min(in_w - 1);
            let x1 = (x0 + 1).min(in_w - 1);
            (x0 as u32, x1 as u32, src_x - x0 as f32)
        })
        .collect();

    let mut output = Array3::<f32>::zeros((out_h, out_w, 3));

    for y in 0..out_h {
        let src_y = y as f32 * scale_y;
        let y0 = (src_y.floor() as usize).min(in_h - 1);
        let y1 = (y0 + 1).min(in_h - 1);
        let dy = src_y - y0 as f32;

        for (x, &(x0, x1, dx)) in columns.iter().enumerate() {
            let top_left = image.get_pixel(x0, y0 as u32);
            let top_right = image.get_pixel(x1, y0 as u32);
            let bottom_left = image.get_pixel(x0, y1 as u32);
            let bottom_right = image.get_pixel(x1, y1 as u32);

            for c in 0..3 {
                let top = top_left[c] as f32 + (top_right[c] as f32 - top_left[c] as f32) * dx;
                let bottom =
                    bottom_left[c] as f32 + (bottom_right[c] as f32 - bottom_left[c] as f32) * dx;
                output[[y, x, c]] = top + (bottom - top) * dy;
            }
        }
    }

    Ok(output)
}

/// Turn a `[1, H, W, 3]` tensor in [0, 1] back into an image (debug previews)
pub fn tensor_to_image(tensor: &Array4<f32>) -> Option<DynamicImage> {
    let (batch, height, width, channels) = tensor.dim();
    if batch == 0 || channels != 3 {
        return None;
    }

    let image = RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let mut pixel = [0u8; 3];
        for (c, value) in pixel.iter_mut().enumerate() {
            *value = (tensor[[0, y as usize, x as usize, c]] * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        image::Rgb(pixel)
    });

    Some(DynamicImage::ImageRgb8(image))
}
