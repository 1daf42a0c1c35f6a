use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize, Serializer};

pub const MIN_FACTOR: f32 = 0.5;
pub const MAX_FACTOR: f32 = 2.0;
pub const IDENTITY_FACTOR: f32 = 1.0;

/// 3x3 smoothing kernel used as the "blurred" reference for sharpness
const SMOOTH_KERNEL: [[f32; 3]; 3] = [[1.0, 1.0, 1.0], [1.0, 5.0, 1.0], [1.0, 1.0, 1.0]];
const SMOOTH_SCALE: f32 = 13.0;

/// Photo-filter factors, each in [0.5, 2.0]; 1.0 leaves the image unchanged
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnhancementSettings {
    #[serde(default = "identity", serialize_with = "serialize_factor")]
    pub brightness: f32,
    #[serde(default = "identity", serialize_with = "serialize_factor")]
    pub contrast: f32,
    #[serde(default = "identity", serialize_with = "serialize_factor")]
    pub sharpness: f32,
}

fn identity() -> f32 {
    IDENTITY_FACTOR
}

// Two decimals, so 1.3 is written as 1.3 rather than its f32 widening
fn serialize_factor<S: Serializer>(factor: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((*factor as f64 * 100.0).round() / 100.0)
}

impl Default for EnhancementSettings {
    fn default() -> Self {
        Self {
            brightness: IDENTITY_FACTOR,
            contrast: IDENTITY_FACTOR,
            sharpness: IDENTITY_FACTOR,
        }
    }
}

/// Clamp a factor into the supported range (NaN becomes the identity)
pub fn clamp_factor(factor: f32) -> f32 {
    if factor.is_nan() {
        IDENTITY_FACTOR
    } else {
        factor.clamp(MIN_FACTOR, MAX_FACTOR)
    }
}

impl EnhancementSettings {
    pub fn new(brightness: f32, contrast: f32, sharpness: f32) -> Self {
        Self {
            brightness: clamp_factor(brightness),
            contrast: clamp_factor(contrast),
            sharpness: clamp_factor(sharpness),
        }
    }

    /// Copy with every factor pulled back into range
    pub fn clamped(&self) -> Self {
        Self::new(self.brightness, self.contrast, self.sharpness)
    }

    pub fn is_identity(&self) -> bool {
        let s = self.clamped();
        s.brightness == IDENTITY_FACTOR
            && s.contrast == IDENTITY_FACTOR
            && s.sharpness == IDENTITY_FACTOR
    }

    /// Apply brightness, then contrast, then sharpness.
    ///
    /// The order is fixed; changing it changes the output.
    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        if self.is_identity() {
            return image.clone();
        }

        let s = self.clamped();
        let mut buffer = image.to_rgba8();

        if s.brightness != IDENTITY_FACTOR {
            buffer = adjust_brightness(&buffer, s.brightness);
        }
        if s.contrast != IDENTITY_FACTOR {
            buffer = adjust_contrast(&buffer, s.contrast);
        }
        if s.sharpness != IDENTITY_FACTOR {
            buffer = adjust_sharpness(&buffer, s.sharpness);
        }

        if image.color().has_alpha() {
            DynamicImage::ImageRgba8(buffer)
        } else {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(buffer).to_rgb8())
        }
    }
}

/// Interpolate (or extrapolate) from `degenerate` towards `value`
fn blend(degenerate: f32, value: f32, factor: f32) -> u8 {
    (degenerate + factor * (value - degenerate))
        .round()
        .clamp(0.0, 255.0) as u8
}

fn adjust_brightness(src: &RgbaImage, factor: f32) -> RgbaImage {
    RgbaImage::from_fn(src.width(), src.height(), |x, y| {
        let p = src.get_pixel(x, y);
        Rgba([
            blend(0.0, p[0] as f32, factor),
            blend(0.0, p[1] as f32, factor),
            blend(0.0, p[2] as f32, factor),
            p[3],
        ])
    })
}

/// ITU-R 601-2 luma, integer form
fn luma(p: &Rgba<u8>) -> u32 {
    (p[0] as u32 * 19595 + p[1] as u32 * 38470 + p[2] as u32 * 7471 + 0x8000) >> 16
}

fn adjust_contrast(src: &RgbaImage, factor: f32) -> RgbaImage {
    let count = (src.width() as u64 * src.height() as u64).max(1);
    let total: u64 = src.pixels().map(|p| luma(p) as u64).sum();
    let mean = (total as f64 / count as f64 + 0.5).floor() as f32;

    RgbaImage::from_fn(src.width(), src.height(), |x, y| {
        let p = src.get_pixel(x, y);
        Rgba([
            blend(mean, p[0] as f32, factor),
            blend(mean, p[1] as f32, factor),
            blend(mean, p[2] as f32, factor),
            p[3],
        ])
    })
}

fn adjust_sharpness(src: &RgbaImage, factor: f32) -> RgbaImage {
    let (w, h) = src.dimensions();

    RgbaImage::from_fn(w, h, |x, y| {
        let p = src.get_pixel(x, y);

        // Border pixels have no full neighbourhood and stay as they are
        if x == 0 || y == 0 || x + 1 >= w || y + 1 >= h {
            return *p;
        }

        let mut smoothed = [0.0f32; 3];
        for (ky, row) in SMOOTH_KERNEL.iter().enumerate() {
            for (kx, weight) in row.iter().enumerate() {
                let n = src.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1);
                for c in 0..3 {
                    smoothed[c] += weight * n[c] as f32;
                }
            }
        }

        let mut out = *p;
        for c in 0..3 {
            let degenerate = (smoothed[c] / SMOOTH_SCALE).round();
            out[c] = blend(degenerate, p[c] as f32, factor);
        }
        out
    })
}
