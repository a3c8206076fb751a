// THEORY:
// The `texture` module turns a color image into a single number describing how much
// fine, high-frequency detail the surface carries. Scratches, burrs and cut marks
// create sharp local intensity changes; a clean, polished or out-of-focus surface
// does not.
//
// The pipeline has three stages, each operating on the whole frame:
// 1.  **Intensity**: every pixel is collapsed to an 8-bit luma value (`Pixel::intensity`).
// 2.  **Smoothing**: a separable 5x5 binomial (Gaussian) kernel `[1 4 6 4 1] / 16`
//     suppresses single-pixel sensor noise so it does not masquerade as texture.
//     The output is rounded back to 8 bits.
// 3.  **Second derivative**: the 4-neighbour Laplacian `[0 1 0; 1 -4 1; 0 1 0]`
//     responds strongly to edges and fine detail. The texture score is the population
//     variance of that response map.
//
// Borders are extrapolated by reflecting around the edge pixel (`dcb|abcd|cba`), so
// the response map has the same size as the input and edge pixels are not biased.

use crate::core_modules::pixel::pixel::Pixel;
use image::{GrayImage, Luma, RgbImage};

const BINOMIAL_KERNEL: [u32; 5] = [1, 4, 6, 4, 1];
const BINOMIAL_RADIUS: i64 = 2;
/// Sum of the 2-D kernel (16 * 16).
const BINOMIAL_NORM: u32 = 256;

/// Maps an out-of-range coordinate back into `0..len` by reflecting around the border
/// pixel without repeating it.
#[inline]
fn reflect_101(mut index: i64, len: u32) -> u32 {
    let len = len as i64;
    if len == 1 {
        return 0;
    }
    while index < 0 || index >= len {
        if index < 0 {
            index = -index;
        }
        if index >= len {
            index = 2 * len - 2 - index;
        }
    }
    index as u32
}

/// Collapses an RGB image to 8-bit intensity.
pub fn to_intensity(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([Pixel::from(image.get_pixel(x, y)).intensity()])
    })
}

/// Applies the separable 5x5 binomial blur.
pub fn gaussian_blur_5x5(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();

    // Horizontal pass keeps full precision; rounding happens once after the vertical pass.
    let mut horizontal = vec![0u32; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0u32;
            for (k, weight) in BINOMIAL_KERNEL.iter().enumerate() {
                let sx = reflect_101(x as i64 + k as i64 - BINOMIAL_RADIUS, width);
                acc += weight * gray.get_pixel(sx, y).0[0] as u32;
            }
            horizontal[(y * width + x) as usize] = acc;
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let mut acc = 0u32;
        for (k, weight) in BINOMIAL_KERNEL.iter().enumerate() {
            let sy = reflect_101(y as i64 + k as i64 - BINOMIAL_RADIUS, height);
            acc += weight * horizontal[(sy * width + x) as usize];
        }
        Luma([((acc + BINOMIAL_NORM / 2) / BINOMIAL_NORM).min(255) as u8])
    })
}

/// 4-neighbour Laplacian response, row-major, same size as the input.
pub fn laplacian(gray: &GrayImage) -> Vec<f64> {
    let (width, height) = gray.dimensions();
    let sample = |x: i64, y: i64| -> f64 {
        gray.get_pixel(reflect_101(x, width), reflect_101(y, height)).0[0] as f64
    };

    let mut response = Vec::with_capacity((width * height) as usize);
    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let center = sample(x, y);
            let neighbours = sample(x, y - 1) + sample(x, y + 1) + sample(x - 1, y) + sample(x + 1, y);
            response.push(neighbours - 4.0 * center);
        }
    }
    response
}

/// Population variance. Returns 0 for an empty slice.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count
}

/// Variance of the Laplacian of the blurred intensity image.
pub fn texture_score(image: &RgbImage) -> f64 {
    let gray = to_intensity(image);
    let blurred = gaussian_blur_5x5(&gray);
    variance(&laplacian(&blurred))
}
