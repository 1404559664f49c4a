//! Core type definitions: encoding parameters, subsampling modes and
//! per-component frame information.

use crate::error::{Error, Result};

// =============================================================================
// Subsampling
// =============================================================================

/// Chroma subsampling mode.
///
/// The discriminants match the numeric codes accepted by
/// [`Subsampling::try_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Subsampling {
    /// Luma only (grayscale output, 1 block per MCU)
    Gray = 0,
    /// YCbCr without subsampling (4:4:4, 3 blocks per MCU)
    H1V1 = 1,
    /// YCbCr with 2:1 horizontal subsampling (4:2:2, 4 blocks per MCU)
    H2V1 = 2,
    /// YCbCr with 2:1 horizontal and vertical subsampling (4:2:0, 6 blocks per MCU)
    #[default]
    H2V2 = 3,
}

impl Subsampling {
    /// Returns (h_samp_factor, v_samp_factor) for the luminance component.
    ///
    /// Chroma components are always 1x1.
    pub const fn luma_factors(self) -> (u8, u8) {
        match self {
            Subsampling::Gray | Subsampling::H1V1 => (1, 1),
            Subsampling::H2V1 => (2, 1),
            Subsampling::H2V2 => (2, 2),
        }
    }

    /// Number of components in the output frame.
    pub const fn num_components(self) -> usize {
        match self {
            Subsampling::Gray => 1,
            _ => 3,
        }
    }

    /// Short name used in log output.
    pub const fn name(self) -> &'static str {
        match self {
            Subsampling::Gray => "gray",
            Subsampling::H1V1 => "4:4:4",
            Subsampling::H2V1 => "4:2:2",
            Subsampling::H2V2 => "4:2:0",
        }
    }
}

impl TryFrom<u8> for Subsampling {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Subsampling::Gray),
            1 => Ok(Subsampling::H1V1),
            2 => Ok(Subsampling::H2V1),
            3 => Ok(Subsampling::H2V2),
            other => Err(Error::InvalidSubsampling(other)),
        }
    }
}

// =============================================================================
// Encoding Parameters
// =============================================================================

/// Compression parameters for one encode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingParams {
    /// Quality 1-100, higher is better. Typical values are 50-95.
    pub quality: i32,
    /// Chroma subsampling mode
    pub subsampling: Subsampling,
    /// Use the luminance quantization table for chroma too (testing only)
    pub no_chroma_discrim: bool,
    /// Gather symbol statistics in a first pass and emit optimal Huffman tables
    pub two_pass: bool,
}

impl Default for EncodingParams {
    fn default() -> Self {
        Self {
            quality: 85,
            subsampling: Subsampling::H2V2,
            no_chroma_discrim: false,
            two_pass: false,
        }
    }
}

impl EncodingParams {
    /// Validate the parameters.
    ///
    /// The subsampling mode is range-checked when it is built from a raw
    /// code (see [`Subsampling::try_from`]), so only quality is left to test.
    pub fn check(&self) -> Result<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(Error::InvalidQuality(self.quality));
        }
        Ok(())
    }

    /// Build parameters from raw numeric values, validating both.
    pub fn from_raw(quality: i32, subsampling: u8) -> Result<Self> {
        let params = Self {
            quality,
            subsampling: Subsampling::try_from(subsampling)?,
            ..Default::default()
        };
        params.check()?;
        Ok(params)
    }
}

// =============================================================================
// Component Info
// =============================================================================

/// Per-component frame information written to SOF0 and SOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Component identifier (1 = Y, 2 = Cb, 3 = Cr)
    pub component_id: u8,
    /// Horizontal sampling factor (1 or 2)
    pub h_samp_factor: u8,
    /// Vertical sampling factor (1 or 2)
    pub v_samp_factor: u8,
    /// Quantization table slot
    pub quant_tbl_no: u8,
    /// DC Huffman table slot
    pub dc_tbl_no: u8,
    /// AC Huffman table slot
    pub ac_tbl_no: u8,
}

impl ComponentInfo {
    /// Number of 8x8 blocks this component contributes to one MCU.
    pub const fn blocks_in_mcu(&self) -> usize {
        (self.h_samp_factor as usize) * (self.v_samp_factor as usize)
    }

    /// True for the chroma components (table class 1).
    pub const fn is_chroma(&self) -> bool {
        self.quant_tbl_no != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = EncodingParams::default();
        assert_eq!(params.quality, 85);
        assert_eq!(params.subsampling, Subsampling::H2V2);
        assert!(!params.no_chroma_discrim);
        assert!(!params.two_pass);
        assert!(params.check().is_ok());
    }

    #[test]
    fn test_check_quality_range() {
        for quality in 1..=100 {
            for code in 0..=3u8 {
                let params = EncodingParams {
                    quality,
                    subsampling: Subsampling::try_from(code).unwrap(),
                    ..Default::default()
                };
                assert!(params.check().is_ok(), "q={} s={}", quality, code);
            }
        }

        for quality in [0, 101, -5, i32::MAX] {
            let params = EncodingParams {
                quality,
                ..Default::default()
            };
            assert_eq!(params.check(), Err(Error::InvalidQuality(quality)));
        }
    }

    #[test]
    fn test_subsampling_codes() {
        assert_eq!(Subsampling::try_from(0), Ok(Subsampling::Gray));
        assert_eq!(Subsampling::try_from(3), Ok(Subsampling::H2V2));
        assert_eq!(Subsampling::try_from(4), Err(Error::InvalidSubsampling(4)));
        assert_eq!(
            Subsampling::try_from(255),
            Err(Error::InvalidSubsampling(255))
        );
    }

    #[test]
    fn test_from_raw() {
        assert!(EncodingParams::from_raw(90, 0).is_ok());
        assert_eq!(
            EncodingParams::from_raw(0, 1),
            Err(Error::InvalidQuality(0))
        );
        assert_eq!(
            EncodingParams::from_raw(101, 1),
            Err(Error::InvalidQuality(101))
        );
        assert_eq!(
            EncodingParams::from_raw(50, 4),
            Err(Error::InvalidSubsampling(4))
        );
    }

    #[test]
    fn test_luma_factors() {
        assert_eq!(Subsampling::Gray.luma_factors(), (1, 1));
        assert_eq!(Subsampling::H1V1.luma_factors(), (1, 1));
        assert_eq!(Subsampling::H2V1.luma_factors(), (2, 1));
        assert_eq!(Subsampling::H2V2.luma_factors(), (2, 2));
        assert_eq!(Subsampling::Gray.num_components(), 1);
        assert_eq!(Subsampling::H2V1.num_components(), 3);
    }
}
