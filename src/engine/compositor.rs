//! Layer compositing
//!
//! Flattens a base/overlay sprite pair into a single RGBA image. The overlay
//! is stretched to the base canvas when their sizes differ, resampling in
//! premultiplied alpha so transparent texels do not bleed into edges, then
//! drawn on top with straight-alpha "over" blending.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use thiserror::Error;
use tracing::{debug, info};

use super::discovery::LayerPair;

/// Compositing errors
#[derive(Debug, Error)]
pub enum CompositorError {
    #[error("Failed to decode {path}: {source}")]
    DecodeFailed {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("Failed to encode {path}: {source}")]
    EncodeFailed {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Flattens layered sprites
pub struct Compositor {
    filter: FilterType,
}

impl Compositor {
    /// Create a new compositor using Lanczos3 resampling
    pub fn new() -> Self {
        Compositor {
            filter: FilterType::Lanczos3,
        }
    }

    /// Composite `overlay` over `base`, returning an image the size of `base`
    pub fn flatten(&self, base: &DynamicImage, overlay: &DynamicImage) -> RgbaImage {
        let mut base_rgba = base.to_rgba8();
        let (width, height) = base_rgba.dimensions();

        let overlay_rgba = if overlay.width() != width || overlay.height() != height {
            debug!(
                overlay_width = overlay.width(),
                overlay_height = overlay.height(),
                width = width,
                height = height,
                "Resampling overlay to base size"
            );
            self.resample_premultiplied(overlay, width, height)
        } else {
            overlay.to_rgba8()
        };

        for (x, y, base_pixel) in base_rgba.enumerate_pixels_mut() {
            let overlay_pixel = overlay_rgba.get_pixel(x, y);
            *base_pixel = self.blend_over_pixel(base_pixel, overlay_pixel);
        }

        base_rgba
    }

    /// Flatten one discovered pair from `dir` and write it as `output_name`
    ///
    /// Returns the path of the written file. The input files are left
    /// untouched.
    pub fn flatten_pair(
        &self,
        dir: &Path,
        pair: &LayerPair,
        output_name: &str,
    ) -> Result<PathBuf, CompositorError> {
        let base = open_image(&dir.join(&pair.base))?;
        let overlay = open_image(&dir.join(&pair.overlay))?;

        let flattened = self.flatten(&base, &overlay);

        let output_path = dir.join(output_name);
        flattened
            .save_with_format(&output_path, ImageFormat::Png)
            .map_err(|source| CompositorError::EncodeFailed {
                path: output_path.display().to_string(),
                source,
            })?;

        info!(
            base = %pair.base,
            overlay = %pair.overlay,
            output = %output_name,
            width = flattened.width(),
            height = flattened.height(),
            "Composited layer pair"
        );

        Ok(output_path)
    }

    /// Resize with color channels weighted by alpha
    fn resample_premultiplied(&self, image: &DynamicImage, width: u32, height: u32) -> RgbaImage {
        let mut premultiplied = image.to_rgba32f();
        for pixel in premultiplied.pixels_mut() {
            let alpha = pixel.0[3];
            for channel in &mut pixel.0[..3] {
                *channel *= alpha;
            }
        }

        let resized = image::imageops::resize(&premultiplied, width, height, self.filter);

        let mut output = RgbaImage::new(width, height);
        for (x, y, pixel) in resized.enumerate_pixels() {
            let alpha = pixel.0[3].clamp(0.0, 1.0);
            let mut result = [0u8; 4];
            if alpha > 0.0 {
                for i in 0..3 {
                    result[i] = ((pixel.0[i] / alpha).clamp(0.0, 1.0) * 255.0).round() as u8;
                }
            }
            result[3] = (alpha * 255.0).round() as u8;
            output.put_pixel(x, y, Rgba(result));
        }

        output
    }

    /// Porter-Duff "over" on straight (non-premultiplied) alpha
    fn blend_over_pixel(&self, base: &Rgba<u8>, overlay: &Rgba<u8>) -> Rgba<u8> {
        let src_alpha = overlay.0[3] as f64 / 255.0;
        let dst_alpha = base.0[3] as f64 / 255.0;
        let dst_weight = dst_alpha * (1.0 - src_alpha);
        let out_alpha = src_alpha + dst_weight;

        if out_alpha <= 0.0 {
            return Rgba([0, 0, 0, 0]);
        }

        let mut result = [0u8; 4];
        for i in 0..3 {
            let value =
                (overlay.0[i] as f64 * src_alpha + base.0[i] as f64 * dst_weight) / out_alpha;
            result[i] = value.round().clamp(0.0, 255.0) as u8;
        }
        result[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;

        Rgba(result)
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

fn open_image(path: &Path) -> Result<DynamicImage, CompositorError> {
    image::open(path).map_err(|source| CompositorError::DecodeFailed {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{solid, ScratchDir};

    #[test]
    fn test_transparent_overlay_keeps_base() {
        let mut base = RgbaImage::new(3, 2);
        for (x, y, pixel) in base.enumerate_pixels_mut() {
            *pixel = Rgba([x as u8 * 40, y as u8 * 90, 17, 255]);
        }
        let overlay = solid(3, 2, [255, 255, 255, 0]);

        let flattened = Compositor::new().flatten(
            &DynamicImage::ImageRgba8(base.clone()),
            &DynamicImage::ImageRgba8(overlay),
        );

        assert_eq!(flattened, base);
    }

    #[test]
    fn test_opaque_overlay_replaces_base() {
        let base = solid(4, 4, [255, 0, 0, 255]);
        let overlay = solid(4, 4, [0, 0, 255, 255]);

        let flattened = Compositor::new().flatten(
            &DynamicImage::ImageRgba8(base),
            &DynamicImage::ImageRgba8(overlay.clone()),
        );

        assert_eq!(flattened, overlay);
    }

    #[test]
    fn test_blend_half_alpha() {
        let compositor = Compositor::new();
        let blended = compositor.blend_over_pixel(&Rgba([0, 0, 0, 255]), &Rgba([255, 255, 255, 128]));
        assert_eq!(blended.0[3], 255);
        assert!((blended.0[0] as i32 - 128).abs() <= 1);

        let both_clear = compositor.blend_over_pixel(&Rgba([10, 20, 30, 0]), &Rgba([40, 50, 60, 0]));
        assert_eq!(both_clear, Rgba([0, 0, 0, 0]));

        let onto_clear = compositor.blend_over_pixel(&Rgba([10, 20, 30, 0]), &Rgba([40, 50, 60, 100]));
        assert_eq!(onto_clear, Rgba([40, 50, 60, 100]));
    }

    #[test]
    fn test_overlay_resampled_to_base_size() {
        let base = solid(64, 64, [255, 0, 0, 255]);
        let overlay = solid(32, 32, [0, 0, 255, 255]);

        let flattened = Compositor::new().flatten(
            &DynamicImage::ImageRgba8(base),
            &DynamicImage::ImageRgba8(overlay),
        );

        assert_eq!(flattened.dimensions(), (64, 64));
        for pixel in flattened.pixels() {
            assert!(pixel.0[0] <= 2, "red bleeds through: {:?}", pixel);
            assert!(pixel.0[2] >= 253, "overlay not covering: {:?}", pixel);
            assert_eq!(pixel.0[3], 255);
        }
    }

    #[test]
    fn test_resample_keeps_edge_color_over_transparent_black() {
        let mut overlay = RgbaImage::new(4, 1);
        overlay.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        overlay.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        let overlay = DynamicImage::ImageRgba8(overlay);

        let compositor = Compositor::new();
        let resized = compositor.resample_premultiplied(&overlay, 8, 1);
        let mut partial = 0;
        for pixel in resized.pixels().filter(|p| p.0[3] > 0) {
            if pixel.0[3] < 255 {
                partial += 1;
            }
            assert!(pixel.0[..3].iter().all(|&c| c >= 250), "edge darkened: {:?}", pixel);
        }
        assert!(partial > 0, "expected a soft edge: {:?}", resized);

        let base = DynamicImage::ImageRgba8(solid(8, 1, [0, 0, 255, 255]));
        let flattened = compositor.flatten(&base, &overlay);
        for (pixel, resized_pixel) in flattened.pixels().zip(resized.pixels()) {
            let coverage = resized_pixel.0[3] as i32;
            assert_eq!(pixel.0[3], 255);
            assert!((pixel.0[0] as i32 - coverage).abs() <= 2, "{:?} vs {:?}", pixel, resized_pixel);
            assert!((pixel.0[2] as i32 - (255 - coverage)).abs() <= 2, "{:?} vs {:?}", pixel, resized_pixel);
        }
    }

    #[test]
    fn test_flatten_pair_writes_output() {
        let dir = ScratchDir::new();
        dir.write_png("Gaseous_01-0.png", &solid(8, 8, [0, 255, 0, 255]));
        dir.write_png("Gaseous_01-1.png", &solid(8, 8, [0, 0, 0, 0]));
        let pair = LayerPair {
            index: 1,
            base: "Gaseous_01-0.png".to_string(),
            overlay: "Gaseous_01-1.png".to_string(),
        };

        let path = Compositor::new()
            .flatten_pair(dir.path(), &pair, "Gaseous01.png")
            .unwrap();

        assert_eq!(path, dir.path().join("Gaseous01.png"));
        let written = image::open(&path).unwrap().to_rgba8();
        assert_eq!(written, solid(8, 8, [0, 255, 0, 255]));
        assert!(dir.path().join("Gaseous_01-0.png").is_file());
        assert!(dir.path().join("Gaseous_01-1.png").is_file());
    }

    #[test]
    fn test_flatten_pair_corrupt_input() {
        let dir = ScratchDir::new();
        std::fs::write(dir.path().join("Gaseous_01-0.png"), b"not a png").unwrap();
        dir.write_png("Gaseous_01-1.png", &solid(2, 2, [0, 0, 0, 0]));
        let pair = LayerPair {
            index: 1,
            base: "Gaseous_01-0.png".to_string(),
            overlay: "Gaseous_01-1.png".to_string(),
        };

        let result = Compositor::new().flatten_pair(dir.path(), &pair, "Gaseous01.png");

        assert!(matches!(result, Err(CompositorError::DecodeFailed { .. })));
        assert!(!dir.path().join("Gaseous01.png").exists());
    }
}
