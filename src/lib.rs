//! # seqjpeg
//!
//! Pure Rust baseline (sequential, Huffman-coded) JPEG encoder.
//!
//! - Grayscale and YCbCr output with 4:4:4, 4:2:2 or 4:2:0 chroma sampling
//! - Quality 1-100 scaling of the Annex K quantization tables
//! - Standard Huffman tables, or image-specific tables from a two-pass encode
//! - Scanline-at-a-time input with bounded memory (one MCU row) in single-pass mode
//! - Output to any [`std::io::Write`] or custom [`OutputSink`]
//!
//! ## Quick Start
//!
//! ```
//! use seqjpeg::Encoder;
//!
//! # fn main() -> Result<(), seqjpeg::Error> {
//! // RGB pixel data (3 bytes per pixel, row-major order)
//! let rgb_pixels: Vec<u8> = vec![0; 64 * 48 * 3];
//!
//! let jpeg_data = Encoder::new()
//!     .quality(85)
//!     .encode_rgb(&rgb_pixels, 64, 48)?;
//!
//! // Smaller files with Huffman tables fitted to the image
//! let optimized = Encoder::new()
//!     .quality(85)
//!     .two_pass(true)
//!     .encode_rgb(&rgb_pixels, 64, 48)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Scanline Encoding
//!
//! ```
//! use seqjpeg::{EncodingParams, EncodingSession};
//!
//! # fn main() -> Result<(), seqjpeg::Error> {
//! let mut session = EncodingSession::new(Vec::new());
//! session.init(100, 20, 1, EncodingParams::default())?;
//! for y in 0..20u8 {
//!     session.process_scanline(&[y * 10; 100])?;
//! }
//! session.process_end_of_image()?;
//! let jpeg = session.into_sink();
//! # assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Writing to a File
//!
//! ```no_run
//! use seqjpeg::{compress_image_to_jpeg_file, EncodingParams};
//!
//! # fn main() -> Result<(), seqjpeg::Error> {
//! # let rgb_pixels: Vec<u8> = vec![0; 100 * 100 * 3];
//! compress_image_to_jpeg_file("output.jpg", 100, 100, 3, &rgb_pixels, &EncodingParams::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Session setup and pass transitions are reported through the [`log`]
//! facade at `debug` level, per-MCU-row progress at `trace`. No logger is
//! installed by this crate.

#![deny(unsafe_code)]
#![warn(missing_docs)]

// ============================================================================
// Internal modules - hidden from public docs but accessible for tests
// ============================================================================

/// Bitstream writing utilities (internal).
#[doc(hidden)]
pub mod bitstream;

/// Color conversion utilities (internal).
#[doc(hidden)]
pub mod color;

/// Constants and standard tables (internal).
#[doc(hidden)]
pub mod consts;

/// DCT transform (internal).
#[doc(hidden)]
pub mod dct;

/// Entropy encoding (internal).
#[doc(hidden)]
pub mod entropy;

/// Huffman table utilities (internal).
#[doc(hidden)]
pub mod huffman;

/// JPEG marker writing (internal).
#[doc(hidden)]
pub mod marker;

/// Quantization utilities (internal).
#[doc(hidden)]
pub mod quant;

/// MCU-row sample buffer (internal).
#[doc(hidden)]
pub mod sample;

/// Type definitions (internal).
#[doc(hidden)]
pub mod types;

// Main encoder module (not hidden)
mod encode;
mod error;

// ============================================================================
// Public API
// ============================================================================

/// Whole-image encoder and the scanline-driven session it runs on.
///
/// # Example
///
/// ```
/// use seqjpeg::{Encoder, Subsampling};
///
/// # fn main() -> Result<(), seqjpeg::Error> {
/// let pixels: Vec<u8> = vec![200; 16 * 16 * 3];
/// let jpeg = Encoder::new()
///     .subsampling(Subsampling::H2V1)
///     .encode_rgb(&pixels, 16, 16)?;
/// # Ok(())
/// # }
/// ```
pub use encode::{Encode, Encoder, EncoderState, EncodingSession};

/// One-call adapters for a stream, a file or a fixed buffer.
pub use encode::{
    compress_image_to_jpeg_file, compress_image_to_jpeg_file_in_memory, compress_image_to_stream,
};

/// Destination for encoded bytes.
///
/// Every [`std::io::Write`] is a sink; implement the trait directly for
/// anything else.
pub use bitstream::OutputSink;

/// Error type for encoding operations.
///
/// # Example
///
/// ```
/// use seqjpeg::{Encoder, Error};
///
/// let result = Encoder::new().encode_rgb(&[], 0, 0);
/// match result {
///     Ok(data) => println!("Encoded {} bytes", data.len()),
///     Err(Error::InvalidDimensions { width, height }) => {
///         eprintln!("Invalid dimensions: {}x{}", width, height);
///     }
///     Err(e) => eprintln!("Encoding failed: {}", e),
/// }
/// ```
pub use error::Error;

/// Result type alias for encoding operations.
pub use error::Result;

/// Encoding parameters and chroma subsampling mode.
pub use types::{EncodingParams, Subsampling};
