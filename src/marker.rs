//! JPEG marker emission.
//!
//! Segments written for a baseline JFIF file:
//! - SOI (Start of Image)
//! - APP0 (JFIF 1.01, no thumbnail)
//! - DQT, one segment per table, 8-bit precision
//! - SOF0 (baseline frame header)
//! - DHT, one segment per table
//! - SOS (single interleaved scan, Ss=0 Se=63 Ah=Al=0)
//! - EOI (End of Image)
//!
//! All multi-byte fields are big-endian.
//!
//! Reference: ITU-T T.81 Section B

use std::io::{self, Write};

use crate::consts::{
    DCTSIZE2, JPEG_APP0, JPEG_DHT, JPEG_DQT, JPEG_EOI, JPEG_SOF0, JPEG_SOI, JPEG_SOS,
};
use crate::huffman::HuffTable;
use crate::types::ComponentInfo;

/// JFIF identifier
const JFIF_ID: [u8; 5] = *b"JFIF\0";

/// JFIF version 1.01
const JFIF_VERSION: [u8; 2] = [1, 1];

/// Marker writer for JPEG headers.
pub struct MarkerWriter<W: Write> {
    output: W,
    bytes_written: usize,
}

impl<W: Write> MarkerWriter<W> {
    pub fn new(output: W) -> Self {
        Self {
            output,
            bytes_written: 0,
        }
    }

    fn emit_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.output.write_all(bytes)?;
        self.bytes_written += bytes.len();
        Ok(())
    }

    fn emit_byte(&mut self, byte: u8) -> io::Result<()> {
        self.emit_bytes(&[byte])
    }

    fn emit_2bytes(&mut self, value: u16) -> io::Result<()> {
        self.emit_bytes(&value.to_be_bytes())
    }

    fn emit_marker(&mut self, marker: u8) -> io::Result<()> {
        self.emit_bytes(&[0xFF, marker])
    }

    /// Write Start of Image marker.
    pub fn write_soi(&mut self) -> io::Result<()> {
        self.emit_marker(JPEG_SOI)
    }

    /// Write End of Image marker.
    pub fn write_eoi(&mut self) -> io::Result<()> {
        self.emit_marker(JPEG_EOI)
    }

    /// Write the JFIF APP0 segment.
    ///
    /// # Arguments
    /// * `density_unit` - 0=no units (aspect ratio only), 1=dots/inch, 2=dots/cm
    /// * `x_density` - Horizontal pixel density
    /// * `y_density` - Vertical pixel density
    pub fn write_jfif_app0(
        &mut self,
        density_unit: u8,
        x_density: u16,
        y_density: u16,
    ) -> io::Result<()> {
        self.emit_marker(JPEG_APP0)?;
        // length + identifier + version + units + densities + thumbnail size
        self.emit_2bytes(16)?;
        self.emit_bytes(&JFIF_ID)?;
        self.emit_bytes(&JFIF_VERSION)?;
        self.emit_byte(density_unit)?;
        self.emit_2bytes(x_density)?;
        self.emit_2bytes(y_density)?;
        // No thumbnail
        self.emit_bytes(&[0, 0])
    }

    /// Write one DQT segment holding a single 8-bit table.
    ///
    /// `table` is in zigzag order; every entry must be in 1..=255.
    pub fn write_dqt(&mut self, table_index: u8, table: &[u16; DCTSIZE2]) -> io::Result<()> {
        debug_assert!(table.iter().all(|&v| (1..=255).contains(&v)));
        self.emit_marker(JPEG_DQT)?;
        self.emit_2bytes(2 + 1 + DCTSIZE2 as u16)?;
        // Pq = 0 (8-bit) in the high nibble, Tq in the low nibble
        self.emit_byte(table_index & 0x0F)?;
        for &value in table {
            self.emit_byte(value as u8)?;
        }
        Ok(())
    }

    /// Write the baseline (SOF0) frame header with 8-bit precision.
    pub fn write_sof0(
        &mut self,
        height: u16,
        width: u16,
        components: &[ComponentInfo],
    ) -> io::Result<()> {
        self.emit_marker(JPEG_SOF0)?;

        let num_components = components.len() as u16;
        self.emit_2bytes(8 + 3 * num_components)?;

        self.emit_byte(8)?;
        self.emit_2bytes(height)?;
        self.emit_2bytes(width)?;
        self.emit_byte(num_components as u8)?;

        for comp in components {
            self.emit_byte(comp.component_id)?;
            self.emit_byte((comp.h_samp_factor << 4) | comp.v_samp_factor)?;
            self.emit_byte(comp.quant_tbl_no)?;
        }

        Ok(())
    }

    /// Write one DHT segment.
    ///
    /// # Arguments
    /// * `table_index` - Table slot (0 = luma, 1 = chroma)
    /// * `is_ac` - True for AC table, false for DC table
    /// * `table` - Huffman table
    pub fn write_dht(&mut self, table_index: u8, is_ac: bool, table: &HuffTable) -> io::Result<()> {
        let values = table.values();

        self.emit_marker(JPEG_DHT)?;
        self.emit_2bytes(2 + 1 + 16 + values.len() as u16)?;

        let tc_th = if is_ac {
            0x10 | (table_index & 0x0F)
        } else {
            table_index & 0x0F
        };
        self.emit_byte(tc_th)?;
        self.emit_bytes(&table.bits[1..=16])?;
        self.emit_bytes(values)
    }

    /// Write the SOS header for one interleaved scan over all components.
    pub fn write_sos(&mut self, components: &[ComponentInfo]) -> io::Result<()> {
        self.emit_marker(JPEG_SOS)?;

        let ns = components.len() as u16;
        self.emit_2bytes(6 + 2 * ns)?;
        self.emit_byte(ns as u8)?;

        for comp in components {
            self.emit_byte(comp.component_id)?;
            self.emit_byte((comp.dc_tbl_no << 4) | comp.ac_tbl_no)?;
        }

        // Ss, Se, Ah/Al
        self.emit_bytes(&[0, 63, 0])
    }

    /// Get total bytes written.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Consume the writer and return the underlying output.
    pub fn into_inner(self) -> W {
        self.output
    }
}
