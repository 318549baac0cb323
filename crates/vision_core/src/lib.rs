//! vision_core: mask rendering and overlay compositing for segmentation
//! predictions.

use image::{imageops, GrayImage, Luma, Rgb, RgbImage};

/// Blend weight used for prediction overlays.
pub const OVERLAY_ALPHA: f32 = 0.4;
/// Highlight color used for prediction overlays.
pub const OVERLAY_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Render a mask plane (row-major, values in [0, 1]) into an 8-bit grayscale
/// image, thresholding at 0.5.
pub fn mask_to_image(mask: &[f32], width: u32, height: u32) -> GrayImage {
    debug_assert_eq!(mask.len(), (width * height) as usize);
    GrayImage::from_fn(width, height, |x, y| {
        let v = mask[(y * width + x) as usize];
        Luma([if v > 0.5 { 255 } else { 0 }])
    })
}

/// Resize a binary mask without introducing intermediate gray values.
pub fn resize_mask_nearest(mask: &GrayImage, width: u32, height: u32) -> GrayImage {
    imageops::resize(mask, width, height, imageops::FilterType::Nearest)
}

/// Composite `color` over `image` wherever `mask` is set, with the given
/// blend weight. Pixels outside the mask pass through unchanged. The mask
/// must match the image dimensions.
pub fn blend_overlay(image: &RgbImage, mask: &GrayImage, color: Rgb<u8>, alpha: f32) -> RgbImage {
    debug_assert_eq!(image.dimensions(), mask.dimensions());
    let alpha = alpha.clamp(0.0, 1.0);
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let px = *image.get_pixel(x, y);
        if mask.get_pixel(x, y)[0] < 128 {
            return px;
        }
        let mut out = [0u8; 3];
        for c in 0..3 {
            let blended = (1.0 - alpha) * px[c] as f32 + alpha * color[c] as f32;
            out[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(out)
    })
}
