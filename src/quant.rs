//! Quantization tables and block quantization.
//!
//! Tables are the Annex K base tables scaled by the IJG quality curve:
//! - quality < 50: scale = 5000 / quality
//! - quality >= 50: scale = 200 - 2 * quality
//!
//! Each entry becomes `(base * scale + 50) / 100` clamped to 1..=255, so
//! quality 100 degenerates to an all-ones table.

use crate::consts::{
    DCTSIZE, DCTSIZE2, JPEG_NATURAL_ORDER, STD_CHROMINANCE_QUANT_TBL, STD_LUMINANCE_QUANT_TBL,
};
use crate::dct::{SampleBlock, AAN_SCALE};
use crate::types::EncodingParams;

/// Largest AC magnitude representable with the baseline AC tables (size 10).
const MAX_AC_COEF: i32 = 1023;

/// DC range for 8-bit samples; any two values differ by at most 2047 (size 11).
const MIN_DC_COEF: i32 = -1024;
const MAX_DC_COEF: i32 = 1023;

/// A quantization table with its precomputed float divisors.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantTable {
    /// Quantizer step per coefficient, natural (row-major) order
    pub values: [u16; DCTSIZE2],
    /// Reciprocal of `value * 8 * AAN_SCALE[row] * AAN_SCALE[col]`, natural order
    pub divisors: [f64; DCTSIZE2],
}

impl QuantTable {
    /// Build a table from natural-order quantizer values.
    pub fn new(values: [u16; DCTSIZE2]) -> Self {
        let mut divisors = [0.0f64; DCTSIZE2];
        for row in 0..DCTSIZE {
            for col in 0..DCTSIZE {
                let i = row * DCTSIZE + col;
                divisors[i] = 1.0 / (values[i] as f64 * AAN_SCALE[row] * AAN_SCALE[col] * 8.0);
            }
        }
        Self { values, divisors }
    }

    /// Quantizer values in zigzag order, as written to DQT.
    pub fn zigzag_values(&self) -> [u16; DCTSIZE2] {
        let mut out = [0u16; DCTSIZE2];
        for (zz, &natural) in JPEG_NATURAL_ORDER.iter().enumerate() {
            out[zz] = self.values[natural];
        }
        out
    }
}

/// Convert a 1-100 quality rating to a percentage scale factor.
///
/// The caller is responsible for validating the quality range.
pub fn quality_to_scale_factor(quality: i32) -> i32 {
    let quality = quality.clamp(1, 100);
    if quality < 50 {
        5000 / quality
    } else {
        200 - quality * 2
    }
}

/// Scale a base table by a percentage scale factor.
pub fn create_quant_table(base: &[u16; DCTSIZE2], scale_factor: i32) -> QuantTable {
    let mut values = [0u16; DCTSIZE2];
    for (v, &b) in values.iter_mut().zip(base.iter()) {
        let q = (b as i32 * scale_factor + 50) / 100;
        *v = q.clamp(1, 255) as u16;
    }
    QuantTable::new(values)
}

/// Create the (luma, chroma) table pair for a set of parameters.
///
/// With `no_chroma_discrim` the luma table is used for both classes.
pub fn create_quant_tables(params: &EncodingParams) -> (QuantTable, QuantTable) {
    let scale = quality_to_scale_factor(params.quality);
    let luma = create_quant_table(&STD_LUMINANCE_QUANT_TBL, scale);
    let chroma = if params.no_chroma_discrim {
        luma.clone()
    } else {
        create_quant_table(&STD_CHROMINANCE_QUANT_TBL, scale)
    };
    (luma, chroma)
}

/// Quantize AAN-scaled DCT output and reorder it into zigzag sequence.
///
/// Rounds to nearest with ties away from zero. Output index 0 is DC.
pub fn quantize_block(coeffs: &SampleBlock, table: &QuantTable) -> [i16; DCTSIZE2] {
    let mut out = [0i16; DCTSIZE2];
    for (zz, &natural) in JPEG_NATURAL_ORDER.iter().enumerate() {
        let q = (coeffs[natural] as f64 * table.divisors[natural]).round() as i32;
        out[zz] = if zz == 0 {
            q.clamp(MIN_DC_COEF, MAX_DC_COEF)
        } else {
            q.clamp(-MAX_AC_COEF, MAX_AC_COEF)
        } as i16;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dct::forward_dct_8x8;

    #[test]
    fn test_scale_factor_curve() {
        assert_eq!(quality_to_scale_factor(1), 5000);
        assert_eq!(quality_to_scale_factor(25), 200);
        assert_eq!(quality_to_scale_factor(49), 102);
        assert_eq!(quality_to_scale_factor(50), 100);
        assert_eq!(quality_to_scale_factor(75), 50);
        assert_eq!(quality_to_scale_factor(100), 0);
    }

    #[test]
    fn test_quality_50_is_base_table() {
        let (luma, chroma) = create_quant_tables(&EncodingParams {
            quality: 50,
            ..Default::default()
        });
        assert_eq!(luma.values, STD_LUMINANCE_QUANT_TBL);
        assert_eq!(chroma.values, STD_CHROMINANCE_QUANT_TBL);
    }

    #[test]
    fn test_quality_100_all_ones() {
        let (luma, chroma) = create_quant_tables(&EncodingParams {
            quality: 100,
            ..Default::default()
        });
        assert!(luma.values.iter().all(|&v| v == 1));
        assert!(chroma.values.iter().all(|&v| v == 1));
    }

    #[test]
    fn test_quality_1_clamped() {
        let (luma, _) = create_quant_tables(&EncodingParams {
            quality: 1,
            ..Default::default()
        });
        assert!(luma.values.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_rounding() {
        // quality 75 -> scale 50: 11 * 50 = 550 -> (550 + 50) / 100 = 6
        let table = create_quant_table(&STD_LUMINANCE_QUANT_TBL, 50);
        assert_eq!(table.values[0], 8);
        assert_eq!(table.values[1], 6);
    }

    #[test]
    fn test_no_chroma_discrim() {
        let params = EncodingParams {
            quality: 60,
            no_chroma_discrim: true,
            ..Default::default()
        };
        let (luma, chroma) = create_quant_tables(&params);
        assert_eq!(luma, chroma);
    }

    #[test]
    fn test_zigzag_values() {
        let table = create_quant_table(&STD_LUMINANCE_QUANT_TBL, 100);
        let zz = table.zigzag_values();
        assert_eq!(zz[0], 16);
        assert_eq!(zz[1], 11); // natural (0,1)
        assert_eq!(zz[2], 12); // natural (1,0)
        assert_eq!(zz[63], 99);
    }

    #[test]
    fn test_quantize_uniform_block() {
        // Uniform level-shifted value 100: DC = 800, q = 16 -> 50
        let table = create_quant_table(&STD_LUMINANCE_QUANT_TBL, 100);
        let mut block = [100.0f32; DCTSIZE2];
        forward_dct_8x8(&mut block);
        let q = quantize_block(&block, &table);
        assert_eq!(q[0], 50);
        assert!(q[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_quantize_ties_away_from_zero() {
        // DC = 8 * 3 = 24 with q = 16 -> 1.5 -> 2; negative -> -2
        let table = create_quant_table(&STD_LUMINANCE_QUANT_TBL, 100);
        let mut pos = [3.0f32; DCTSIZE2];
        forward_dct_8x8(&mut pos);
        assert_eq!(quantize_block(&pos, &table)[0], 2);

        let mut neg = [-3.0f32; DCTSIZE2];
        forward_dct_8x8(&mut neg);
        assert_eq!(quantize_block(&neg, &table)[0], -2);
    }

    #[test]
    fn test_quantize_clamps_ac() {
        // Checkerboard at full swing with an all-ones table saturates high AC.
        let table = create_quant_table(&STD_LUMINANCE_QUANT_TBL, 0);
        let mut block = [0.0f32; DCTSIZE2];
        for y in 0..8 {
            for x in 0..8 {
                block[y * 8 + x] = if (x + y) % 2 == 0 { 127.0 } else { -128.0 };
            }
        }
        forward_dct_8x8(&mut block);
        let q = quantize_block(&block, &table);
        assert!(q[1..].iter().all(|&c| (c as i32).abs() <= MAX_AC_COEF));
    }
}
