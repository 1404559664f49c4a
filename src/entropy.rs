//! Huffman entropy coding of quantized blocks.
//!
//! Baseline sequential coding (ITU-T T.81 Section F.1.2):
//! - DC: difference from the component's previous DC, as a size category
//!   followed by the extra bits
//! - AC: (run, size) symbols with ZRL for runs of 16 zeros and EOB when the
//!   block ends in zeros
//!
//! Blocks arrive in zigzag order. [`count_block`] walks the same symbols
//! without emitting bits, for the statistics pass.

use std::io;

use crate::bitstream::{BitWriter, OutputSink};
use crate::consts::DCTSIZE2;
use crate::huffman::{DerivedTable, FrequencyCounter};

/// End of block: run 0, size 0
const EOB: u8 = 0x00;

/// Sixteen zeros
const ZRL: u8 = 0xF0;

/// Number of bits needed to represent `value`'s magnitude (its category).
///
/// - 0 -> 0
/// - ±1 -> 1
/// - ±2..3 -> 2
/// - ±1024..2047 -> 11
#[inline]
pub fn jpeg_nbits(value: i32) -> u8 {
    (32 - value.unsigned_abs().leading_zeros()) as u8
}

/// Category and extra bits for a value.
///
/// Negative values are sent as `value - 1` masked to the category width.
#[inline]
fn magnitude_bits(value: i32) -> (u8, u32) {
    let nbits = jpeg_nbits(value);
    let mask = (1u32 << nbits) - 1;
    let bits = if value < 0 {
        (value - 1) as u32 & mask
    } else {
        value as u32
    };
    (nbits, bits)
}

#[inline]
fn put_symbol<S: OutputSink>(
    writer: &mut BitWriter<S>,
    table: &DerivedTable,
    symbol: u8,
) -> io::Result<()> {
    let (code, size) = table.get_code(symbol);
    debug_assert!(size > 0, "symbol {:#04x} has no code", symbol);
    writer.put_bits(code as u32, size)
}

/// Encode one block and update the component's DC predictor.
pub fn encode_block<S: OutputSink>(
    writer: &mut BitWriter<S>,
    block: &[i16; DCTSIZE2],
    last_dc: &mut i32,
    dc_table: &DerivedTable,
    ac_table: &DerivedTable,
) -> io::Result<()> {
    let dc = block[0] as i32;
    let (nbits, bits) = magnitude_bits(dc - *last_dc);
    *last_dc = dc;

    put_symbol(writer, dc_table, nbits)?;
    if nbits > 0 {
        writer.put_bits(bits, nbits)?;
    }

    let mut run = 0u8;
    for &coef in &block[1..] {
        if coef == 0 {
            run += 1;
            continue;
        }
        while run >= 16 {
            put_symbol(writer, ac_table, ZRL)?;
            run -= 16;
        }
        let (nbits, bits) = magnitude_bits(coef as i32);
        put_symbol(writer, ac_table, (run << 4) | nbits)?;
        writer.put_bits(bits, nbits)?;
        run = 0;
    }

    if run > 0 {
        put_symbol(writer, ac_table, EOB)?;
    }

    Ok(())
}

/// Count the symbols [`encode_block`] would emit for one block.
pub fn count_block(
    block: &[i16; DCTSIZE2],
    last_dc: &mut i32,
    dc_counter: &mut FrequencyCounter,
    ac_counter: &mut FrequencyCounter,
) {
    let dc = block[0] as i32;
    dc_counter.count(jpeg_nbits(dc - *last_dc));
    *last_dc = dc;

    let mut run = 0u8;
    for &coef in &block[1..] {
        if coef == 0 {
            run += 1;
            continue;
        }
        while run >= 16 {
            ac_counter.count(ZRL);
            run -= 16;
        }
        ac_counter.count((run << 4) | jpeg_nbits(coef as i32));
        run = 0;
    }

    if run > 0 {
        ac_counter.count(EOB);
    }
}
