//! Color space conversion routines.
//!
//! RGB to YCbCr conversion follows ITU-R BT.601 as used by JFIF:
//! ```text
//! Y  =  0.29900 * R + 0.58700 * G + 0.11400 * B
//! Cb = -0.16874 * R - 0.33126 * G + 0.50000 * B + 128
//! Cr =  0.50000 * R - 0.41869 * G - 0.08131 * B + 128
//! ```
//!
//! Results stay in `f32` without intermediate rounding, so the same input
//! always produces bit-identical planes.

const Y_R: f32 = 0.299;
const Y_G: f32 = 0.587;
const Y_B: f32 = 0.114;
const CB_R: f32 = -0.168_736;
const CB_G: f32 = -0.331_264;
const CB_B: f32 = 0.5;
const CR_R: f32 = 0.5;
const CR_G: f32 = -0.418_688;
const CR_B: f32 = -0.081_312;

/// Center value for Cb/Cr
const CBCR_CENTER: f32 = 128.0;

/// Convert a single RGB pixel to YCbCr.
///
/// Chroma is not clamped and can reach 255.5 for saturated primaries.
#[inline]
pub fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32;
    let g = g as f32;
    let b = b as f32;

    let y = Y_R * r + Y_G * g + Y_B * b;
    let cb = CB_R * r + CB_G * g + CB_B * b + CBCR_CENTER;
    let cr = CR_R * r + CR_G * g + CR_B * b + CBCR_CENTER;

    (y, cb, cr)
}

/// Convert a single RGB pixel to luminance only.
#[inline]
pub fn rgb_to_gray(r: u8, g: u8, b: u8) -> f32 {
    Y_R * r as f32 + Y_G * g as f32 + Y_B * b as f32
}

/// Convert one interleaved scanline (3 or 4 bytes per pixel) to Y, Cb and Cr.
///
/// A fourth (alpha) byte per pixel is ignored.
pub fn convert_row_to_ycbcr(
    src: &[u8],
    channels: usize,
    y_out: &mut [f32],
    cb_out: &mut [f32],
    cr_out: &mut [f32],
) {
    debug_assert!(channels == 3 || channels == 4);
    let pixels = src.chunks_exact(channels);
    for (((px, y), cb), cr) in pixels
        .zip(y_out.iter_mut())
        .zip(cb_out.iter_mut())
        .zip(cr_out.iter_mut())
    {
        let (py, pcb, pcr) = rgb_to_ycbcr(px[0], px[1], px[2]);
        *y = py;
        *cb = pcb;
        *cr = pcr;
    }
}

/// Convert one scanline of 1, 3 or 4 bytes per pixel to luminance.
pub fn convert_row_to_gray(src: &[u8], channels: usize, out: &mut [f32]) {
    if channels == 1 {
        for (o, &v) in out.iter_mut().zip(src.iter()) {
            *o = v as f32;
        }
    } else {
        for (o, px) in out.iter_mut().zip(src.chunks_exact(channels)) {
            *o = rgb_to_gray(px[0], px[1], px[2]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_black_white_gray() {
        let (y, cb, cr) = rgb_to_ycbcr(0, 0, 0);
        assert!(approx(y, 0.0) && approx(cb, 128.0) && approx(cr, 128.0));

        let (y, cb, cr) = rgb_to_ycbcr(255, 255, 255);
        assert!(approx(y, 255.0) && approx(cb, 128.0) && approx(cr, 128.0));

        let (y, cb, cr) = rgb_to_ycbcr(100, 100, 100);
        assert!(approx(y, 100.0) && approx(cb, 128.0) && approx(cr, 128.0));
    }

    #[test]
    fn test_primaries() {
        let (y, cb, cr) = rgb_to_ycbcr(255, 0, 0);
        assert!(approx(y, 76.245));
        assert!(approx(cb, 84.972));
        // Unclamped: saturated primaries land half a step past 255.
        assert!(approx(cr, 255.5));

        let (y, cb, _) = rgb_to_ycbcr(0, 0, 255);
        assert!(approx(y, 29.07));
        assert!(approx(cb, 255.5));
    }

    #[test]
    fn test_gray_matches_ycbcr_luma() {
        for &(r, g, b) in &[(12u8, 200u8, 77u8), (255, 1, 128), (0, 0, 0)] {
            let (y, _, _) = rgb_to_ycbcr(r, g, b);
            assert_eq!(y, rgb_to_gray(r, g, b));
        }
    }

    #[test]
    fn test_convert_row_rgba_ignores_alpha() {
        let rgb = [10u8, 20, 30, 40, 50, 60];
        let rgba = [10u8, 20, 30, 0, 40, 50, 60, 255];

        let mut y1 = [0.0f32; 2];
        let mut cb1 = [0.0f32; 2];
        let mut cr1 = [0.0f32; 2];
        convert_row_to_ycbcr(&rgb, 3, &mut y1, &mut cb1, &mut cr1);

        let mut y2 = [0.0f32; 2];
        let mut cb2 = [0.0f32; 2];
        let mut cr2 = [0.0f32; 2];
        convert_row_to_ycbcr(&rgba, 4, &mut y2, &mut cb2, &mut cr2);

        assert_eq!(y1, y2);
        assert_eq!(cb1, cb2);
        assert_eq!(cr1, cr2);
    }

    #[test]
    fn test_convert_row_to_gray_single_channel() {
        let src = [0u8, 17, 255];
        let mut out = [0.0f32; 3];
        convert_row_to_gray(&src, 1, &mut out);
        assert_eq!(out, [0.0, 17.0, 255.0]);
    }
}
