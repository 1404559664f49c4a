//! Bitstream writer for JPEG entropy coding.
//!
//! This module provides bit-level output with:
//! - A 64-bit bit accumulator
//! - 0xFF byte stuffing (0xFF -> 0xFF 0x00) for entropy-coded data
//! - A fixed 2048-byte output buffer that is handed to the [`OutputSink`]
//!   whenever it fills up, and on explicit flush
//!
//! Marker segments go through the same output buffer unstuffed via
//! [`BitWriter::write_bytes`].

use std::io::{self, Write};

/// Size of the output byte buffer
pub const OUT_BUF_SIZE: usize = 2048;

/// Size of the bit buffer in bits
const BIT_BUF_SIZE: i32 = 64;

/// Destination for encoded bytes.
///
/// Any `std::io::Write` is a sink; a write error aborts the encode session.
pub trait OutputSink {
    /// Accept the whole of `buf` or fail.
    fn put_buf(&mut self, buf: &[u8]) -> io::Result<()>;
}

impl<W: Write> OutputSink for W {
    #[inline]
    fn put_buf(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_all(buf)
    }
}

/// Bitstream writer feeding an [`OutputSink`].
pub struct BitWriter<S: OutputSink> {
    /// Output destination
    sink: S,
    /// Pending output bytes
    out_buf: [u8; OUT_BUF_SIZE],
    /// Write cursor into `out_buf`
    out_len: usize,
    /// Bit accumulation buffer
    put_buffer: u64,
    /// Number of free bits remaining in the accumulator
    free_bits: i32,
    /// Bytes already handed to the sink
    bytes_flushed: u64,
}

impl<S: OutputSink> BitWriter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            out_buf: [0; OUT_BUF_SIZE],
            out_len: 0,
            put_buffer: 0,
            free_bits: BIT_BUF_SIZE,
            bytes_flushed: 0,
        }
    }

    /// Append `size` bits of `code` (right-aligned), MSB first.
    #[inline]
    pub fn put_bits(&mut self, code: u32, size: u8) -> io::Result<()> {
        debug_assert!(size <= 16, "Size must be <= 16 bits");
        debug_assert!(size == 0 || code < (1 << size), "Code exceeds size bits");

        let size = size as i32;
        self.free_bits -= size;

        if self.free_bits < 0 {
            let overflow_bits = (-self.free_bits) as u32;

            // Top bits complete the accumulator, the rest start the next one
            self.put_buffer = (self.put_buffer << (size + self.free_bits))
                | ((code as u64) >> overflow_bits);
            self.flush_accumulator()?;

            self.free_bits += BIT_BUF_SIZE;
            self.put_buffer = (code as u64) & ((1u64 << overflow_bits) - 1);
        } else {
            self.put_buffer = (self.put_buffer << size) | (code as u64);
        }

        Ok(())
    }

    /// Move a full 64-bit accumulator into the output buffer.
    fn flush_accumulator(&mut self) -> io::Result<()> {
        let buffer = self.put_buffer;

        // SWAR: nonzero if some byte may be 0xFF
        let maybe_ff =
            buffer & 0x8080_8080_8080_8080 & !(buffer.wrapping_add(0x0101_0101_0101_0101)) != 0;

        if !maybe_ff && self.out_len + 8 <= OUT_BUF_SIZE {
            self.out_buf[self.out_len..self.out_len + 8].copy_from_slice(&buffer.to_be_bytes());
            self.out_len += 8;
            if self.out_len == OUT_BUF_SIZE {
                self.flush_to_sink()?;
            }
        } else {
            for byte in buffer.to_be_bytes() {
                self.emit_byte_stuffed(byte)?;
            }
        }

        Ok(())
    }

    /// Emit one entropy-coded byte, stuffing 0x00 after 0xFF.
    #[inline]
    fn emit_byte_stuffed(&mut self, byte: u8) -> io::Result<()> {
        self.push_byte(byte)?;
        if byte == 0xFF {
            self.push_byte(0x00)?;
        }
        Ok(())
    }

    #[inline]
    fn push_byte(&mut self, byte: u8) -> io::Result<()> {
        self.out_buf[self.out_len] = byte;
        self.out_len += 1;
        if self.out_len == OUT_BUF_SIZE {
            self.flush_to_sink()?;
        }
        Ok(())
    }

    /// Flush remaining bits, padding with 1-bits to a byte boundary.
    ///
    /// Called once at the end of the scan.
    pub fn flush_bits(&mut self) -> io::Result<()> {
        let bits_in_buffer = BIT_BUF_SIZE - self.free_bits;

        if bits_in_buffer > 0 {
            let padding_bits = (8 - (bits_in_buffer % 8)) % 8;
            let total_bits = bits_in_buffer + padding_bits;

            // Left-align, then set the padding bits
            let mut buffer = self.put_buffer << (BIT_BUF_SIZE - bits_in_buffer);
            if padding_bits > 0 {
                buffer |= ((1u64 << padding_bits) - 1) << (BIT_BUF_SIZE - total_bits);
            }

            for byte in buffer.to_be_bytes().into_iter().take((total_bits / 8) as usize) {
                self.emit_byte_stuffed(byte)?;
            }

            self.put_buffer = 0;
            self.free_bits = BIT_BUF_SIZE;
        }

        Ok(())
    }

    /// Write raw bytes (marker segments), without stuffing.
    ///
    /// The bit accumulator must be empty.
    pub fn write_bytes(&mut self, mut bytes: &[u8]) -> io::Result<()> {
        debug_assert!(
            self.free_bits == BIT_BUF_SIZE,
            "Bits must be flushed before writing raw bytes"
        );
        while !bytes.is_empty() {
            let n = bytes.len().min(OUT_BUF_SIZE - self.out_len);
            self.out_buf[self.out_len..self.out_len + n].copy_from_slice(&bytes[..n]);
            self.out_len += n;
            bytes = &bytes[n..];
            if self.out_len == OUT_BUF_SIZE {
                self.flush_to_sink()?;
            }
        }
        Ok(())
    }

    /// Hand all buffered bytes to the sink.
    pub fn flush_to_sink(&mut self) -> io::Result<()> {
        if self.out_len > 0 {
            let len = self.out_len;
            self.out_len = 0;
            self.sink.put_buf(&self.out_buf[..len])?;
            self.bytes_flushed += len as u64;
        }
        Ok(())
    }

    /// Drop buffered bytes and pending bits, keeping the sink.
    pub fn reset(&mut self) {
        self.out_len = 0;
        self.put_buffer = 0;
        self.free_bits = BIT_BUF_SIZE;
        self.bytes_flushed = 0;
    }

    /// Total bytes produced, flushed or still buffered.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_flushed + self.out_len as u64
    }

    /// Get a reference to the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the writer and return the sink. Buffered bytes are dropped.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finish(mut writer: BitWriter<Vec<u8>>) -> Vec<u8> {
        writer.flush_bits().unwrap();
        writer.flush_to_sink().unwrap();
        writer.into_sink()
    }

    /// Sink recording each chunk it receives.
    #[derive(Default)]
    struct ChunkSink {
        chunks: Vec<usize>,
    }

    impl OutputSink for ChunkSink {
        fn put_buf(&mut self, buf: &[u8]) -> io::Result<()> {
            self.chunks.push(buf.len());
            Ok(())
        }
    }

    struct FailingSink;

    impl OutputSink for FailingSink {
        fn put_buf(&mut self, _buf: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "sink closed"))
        }
    }

    #[test]
    fn test_basic_bits() {
        let mut writer = BitWriter::new(Vec::new());
        writer.put_bits(0b1010_1010, 8).unwrap();
        assert_eq!(finish(writer), vec![0b1010_1010]);
    }

    #[test]
    fn test_multiple_small_writes() {
        let mut writer = BitWriter::new(Vec::new());
        writer.put_bits(0b11, 2).unwrap();
        writer.put_bits(0b00, 2).unwrap();
        writer.put_bits(0b1111, 4).unwrap();
        assert_eq!(finish(writer), vec![0b1100_1111]);
    }

    #[test]
    fn test_cross_byte_boundary() {
        let mut writer = BitWriter::new(Vec::new());
        writer.put_bits(0b1111_0000_1111, 12).unwrap();
        // 11110000 1111 + 1111 padding = 0xF0 0xFF, stuffed
        assert_eq!(finish(writer), vec![0xF0, 0xFF, 0x00]);
    }

    #[test]
    fn test_byte_stuffing() {
        let mut writer = BitWriter::new(Vec::new());
        writer.put_bits(0xFF, 8).unwrap();
        writer.put_bits(0xFE, 8).unwrap();
        assert_eq!(finish(writer), vec![0xFF, 0x00, 0xFE]);
    }

    #[test]
    fn test_stuffing_across_accumulator_flush() {
        let mut writer = BitWriter::new(Vec::new());
        for _ in 0..20 {
            writer.put_bits(0xFFFF, 16).unwrap();
        }
        let bytes = finish(writer);
        assert_eq!(bytes.len(), 80);
        for pair in bytes.chunks(2) {
            assert_eq!(pair, [0xFF, 0x00]);
        }
    }

    #[test]
    fn test_padding_with_ones() {
        let mut writer = BitWriter::new(Vec::new());
        writer.put_bits(0b10101, 5).unwrap();
        assert_eq!(finish(writer), vec![0b1010_1111]);
    }

    #[test]
    fn test_flush_bits_when_aligned_is_noop() {
        let mut writer = BitWriter::new(Vec::new());
        writer.put_bits(0xABCD, 16).unwrap();
        writer.flush_bits().unwrap();
        writer.flush_bits().unwrap();
        assert_eq!(finish(writer), vec![0xAB, 0xCD]);
    }

    #[test]
    fn test_raw_bytes_not_stuffed() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bytes(&[0xFF, 0xD8]).unwrap();
        writer.put_bits(0xFF, 8).unwrap();
        writer.flush_bits().unwrap();
        writer.write_bytes(&[0xFF, 0xD9]).unwrap();
        assert_eq!(finish(writer), vec![0xFF, 0xD8, 0xFF, 0x00, 0xFF, 0xD9]);
    }

    #[test]
    fn test_sink_receives_full_chunks() {
        let mut writer = BitWriter::new(ChunkSink::default());
        for i in 0..3000u32 {
            writer.put_bits(i & 0x7F, 8).unwrap();
        }
        writer.flush_bits().unwrap();
        assert_eq!(writer.bytes_written(), 3000);
        assert_eq!(writer.sink().chunks, vec![OUT_BUF_SIZE]);
        writer.flush_to_sink().unwrap();
        assert_eq!(writer.into_sink().chunks, vec![OUT_BUF_SIZE, 3000 - OUT_BUF_SIZE]);
    }

    #[test]
    fn test_large_raw_write_is_chunked() {
        let mut writer = BitWriter::new(ChunkSink::default());
        writer.write_bytes(&vec![0u8; OUT_BUF_SIZE * 2 + 10]).unwrap();
        writer.flush_to_sink().unwrap();
        assert_eq!(
            writer.into_sink().chunks,
            vec![OUT_BUF_SIZE, OUT_BUF_SIZE, 10]
        );
    }

    #[test]
    fn test_sink_error_propagates() {
        let mut writer = BitWriter::new(FailingSink);
        writer.write_bytes(&[1, 2, 3]).unwrap();
        assert!(writer.flush_to_sink().is_err());
    }

    #[test]
    fn test_reset_discards_pending_output() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bytes(&[1, 2, 3]).unwrap();
        writer.put_bits(0b101, 3).unwrap();
        writer.reset();
        assert_eq!(writer.bytes_written(), 0);
        writer.put_bits(0xAB, 8).unwrap();
        assert_eq!(finish(writer), vec![0xAB]);
    }

    #[test]
    fn test_io_write_is_a_sink() {
        let mut out = std::io::Cursor::new(vec![0u8; 4]);
        out.put_buf(&[1, 2]).unwrap();
        assert_eq!(out.position(), 2);
    }
}
