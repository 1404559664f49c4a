//! Whole-image encoding on top of [`EncodingSession`].
//!
//! [`Encoder`] is a small builder over [`EncodingParams`] that feeds a
//! complete pixel buffer through a session one scanline at a time. The
//! `compress_image_*` functions are one-call adapters for a stream, a file
//! path or a caller-owned byte buffer.
//!
//! # Examples
//!
//! ```
//! use seqjpeg::{Encoder, Subsampling};
//!
//! # fn main() -> Result<(), seqjpeg::Error> {
//! let pixels = vec![128u8; 32 * 32 * 3];
//! let jpeg = Encoder::new()
//!     .quality(90)
//!     .subsampling(Subsampling::H1V1)
//!     .encode_rgb(&pixels, 32, 32)?;
//! assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use crate::bitstream::OutputSink;
use crate::error::{Error, Result};
use crate::types::{EncodingParams, Subsampling};

pub(crate) mod helpers;
mod session;

pub use session::{EncoderState, EncodingSession};

// ============================================================================
// Encode Trait
// ============================================================================

/// Trait for JPEG encoding of complete images.
pub trait Encode {
    /// Encode RGB image data to JPEG.
    ///
    /// # Arguments
    /// * `rgb_data` - RGB pixel data (3 bytes per pixel, row-major order)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    fn encode_rgb(&self, rgb_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>>;

    /// Encode grayscale image data to JPEG.
    ///
    /// # Arguments
    /// * `gray_data` - Grayscale pixel data (1 byte per pixel, row-major order)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    fn encode_gray(&self, gray_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>>;
}

/// Baseline JPEG encoder with builder-style configuration.
///
/// Settings are validated when encoding starts, so an out-of-range quality
/// surfaces as [`Error::InvalidQuality`] from the `encode_*` call.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    params: EncodingParams,
}

impl Encoder {
    /// Create an encoder with default settings (quality 85, 4:2:0, one pass).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set quality (1-100).
    pub fn quality(mut self, quality: i32) -> Self {
        self.params.quality = quality;
        self
    }

    /// Set chroma subsampling mode.
    ///
    /// [`Subsampling::Gray`] writes a luma-only file even from color input.
    pub fn subsampling(mut self, mode: Subsampling) -> Self {
        self.params.subsampling = mode;
        self
    }

    /// Quantize chroma with the luma table instead of the chroma table.
    pub fn no_chroma_discrim(mut self, enable: bool) -> Self {
        self.params.no_chroma_discrim = enable;
        self
    }

    /// Enable two-pass encoding with image-specific Huffman tables.
    ///
    /// The whole source image is retained until the second pass.
    pub fn two_pass(mut self, enable: bool) -> Self {
        self.params.two_pass = enable;
        self
    }

    /// Replace all settings at once.
    pub fn params(mut self, params: EncodingParams) -> Self {
        self.params = params;
        self
    }

    /// Current settings.
    pub fn encoding_params(&self) -> &EncodingParams {
        &self.params
    }

    /// Encode RGB image data to JPEG.
    pub fn encode_rgb(&self, rgb_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        self.encode(rgb_data, width, height, 3)
    }

    /// Encode grayscale image data to JPEG.
    pub fn encode_gray(&self, gray_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        self.encode(gray_data, width, height, 1)
    }

    /// Encode RGBA image data to JPEG; alpha is ignored.
    pub fn encode_rgba(&self, rgba_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        self.encode(rgba_data, width, height, 4)
    }

    /// Encode interleaved pixels with 1, 3 or 4 bytes per pixel.
    pub fn encode(&self, pixels: &[u8], width: u32, height: u32, channels: u8) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.encode_to_writer(pixels, width, height, channels, &mut output)?;
        Ok(output)
    }

    /// Encode interleaved pixels to any [`OutputSink`] (every `io::Write` is one).
    ///
    /// On error the sink may hold a partial file.
    pub fn encode_to_writer<S: OutputSink>(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        channels: u8,
        output: S,
    ) -> Result<()> {
        let mut session = EncodingSession::new(output);
        session.init(width, height, channels, self.params)?;

        let row_len = width as usize * channels as usize;
        let expected = row_len
            .checked_mul(height as usize)
            .ok_or(Error::InvalidDimensions { width, height })?;
        if pixels.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        for scanline in pixels.chunks_exact(row_len) {
            session.process_scanline(scanline)?;
        }
        session.process_end_of_image()
    }
}

impl Encode for Encoder {
    fn encode_rgb(&self, rgb_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        self.encode_rgb(rgb_data, width, height)
    }

    fn encode_gray(&self, gray_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        self.encode_gray(gray_data, width, height)
    }
}

// ============================================================================
// One-call adapters
// ============================================================================

/// Encode a whole image into `sink`.
pub fn compress_image_to_stream<S: OutputSink>(
    sink: S,
    width: u32,
    height: u32,
    channels: u8,
    pixels: &[u8],
    params: &EncodingParams,
) -> Result<()> {
    Encoder::new()
        .params(*params)
        .encode_to_writer(pixels, width, height, channels, sink)
}

/// Encode a whole image into a new file at `path`.
pub fn compress_image_to_jpeg_file<P: AsRef<Path>>(
    path: P,
    width: u32,
    height: u32,
    channels: u8,
    pixels: &[u8],
    params: &EncodingParams,
) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    compress_image_to_stream(&mut file, width, height, channels, pixels, params)?;
    file.flush()?;
    Ok(())
}

/// Encode a whole image into `buf` and return the number of bytes used.
///
/// Fails with [`Error::IoError`] if the file does not fit.
pub fn compress_image_to_jpeg_file_in_memory(
    buf: &mut [u8],
    width: u32,
    height: u32,
    channels: u8,
    pixels: &[u8],
    params: &EncodingParams,
) -> Result<usize> {
    let mut cursor = Cursor::new(buf);
    compress_image_to_stream(&mut cursor, width, height, channels, pixels, params)?;
    Ok(cursor.position() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_rgb(width: u32, height: u32) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| {
                let (x, y) = (i % width, i / width);
                if (x / 4 + y / 4) % 2 == 0 {
                    [230, 40, 40]
                } else {
                    [20, 60, 200]
                }
            })
            .collect()
    }

    #[test]
    fn test_builder_settings() {
        let encoder = Encoder::new()
            .quality(42)
            .subsampling(Subsampling::H2V1)
            .no_chroma_discrim(true)
            .two_pass(true);
        let params = encoder.encoding_params();
        assert_eq!(params.quality, 42);
        assert_eq!(params.subsampling, Subsampling::H2V1);
        assert!(params.no_chroma_discrim);
        assert!(params.two_pass);

        let reset = encoder.params(EncodingParams::default());
        assert_eq!(*reset.encoding_params(), EncodingParams::default());
    }

    #[test]
    fn test_invalid_quality_surfaces_at_encode() {
        let result = Encoder::new().quality(101).encode_gray(&[0; 64], 8, 8);
        assert_eq!(result, Err(Error::InvalidQuality(101)));
    }

    #[test]
    fn test_buffer_size_mismatch() {
        let result = Encoder::new().encode_rgb(&[0; 10], 2, 2);
        assert_eq!(
            result,
            Err(Error::BufferSizeMismatch {
                expected: 12,
                actual: 10
            })
        );
    }

    #[test]
    fn test_rgba_matches_rgb() {
        let rgb = checker_rgb(24, 17);
        let rgba: Vec<u8> = rgb
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 0x7F])
            .collect();
        let encoder = Encoder::new().quality(70);
        assert_eq!(
            encoder.encode_rgb(&rgb, 24, 17).unwrap(),
            encoder.encode_rgba(&rgba, 24, 17).unwrap()
        );
    }

    #[test]
    fn test_gray_output_from_rgb() {
        let rgb = checker_rgb(16, 16);
        let jpeg = Encoder::new()
            .subsampling(Subsampling::Gray)
            .encode_rgb(&rgb, 16, 16)
            .unwrap();
        // SOF0 declares a single component
        let sof = jpeg
            .windows(2)
            .position(|w| w == [0xFF, 0xC0])
            .unwrap();
        assert_eq!(jpeg[sof + 9], 1);
    }

    #[test]
    fn test_in_memory_matches_vec_output() {
        let rgb = checker_rgb(40, 30);
        let params = EncodingParams::default();
        let expected = Encoder::new().params(params).encode_rgb(&rgb, 40, 30).unwrap();

        let mut buf = vec![0u8; expected.len() + 100];
        let used = compress_image_to_jpeg_file_in_memory(&mut buf, 40, 30, 3, &rgb, &params)
            .unwrap();
        assert_eq!(used, expected.len());
        assert_eq!(&buf[..used], &expected[..]);
    }

    #[test]
    fn test_in_memory_overflow() {
        let rgb = checker_rgb(40, 30);
        let mut buf = [0u8; 200];
        let result = compress_image_to_jpeg_file_in_memory(
            &mut buf,
            40,
            30,
            3,
            &rgb,
            &EncodingParams::default(),
        );
        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[test]
    fn test_file_output() {
        let rgb = checker_rgb(20, 20);
        let params = EncodingParams {
            two_pass: true,
            ..Default::default()
        };
        let path = std::env::temp_dir().join(format!("seqjpeg-test-{}.jpg", std::process::id()));
        compress_image_to_jpeg_file(&path, 20, 20, 3, &rgb, &params).unwrap();
        let written = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let expected = Encoder::new().params(params).encode_rgb(&rgb, 20, 20).unwrap();
        assert_eq!(written, expected);
    }
}
