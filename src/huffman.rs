//! Huffman tables for baseline encoding.
//!
//! - [`HuffTable`] is the DHT form: `bits[1..=16]` code counts per length
//!   plus symbols in code order.
//! - [`DerivedTable`] maps each symbol to its (code, length), built with
//!   Figures C.1-C.3 of ITU-T T.81.
//! - [`generate_optimal_table`] builds a length-limited table from symbol
//!   counts (Section K.2).

use crate::error::{Error, Result};

/// Longest code JPEG allows
pub const MAX_CODE_LENGTH: usize = 16;

/// Number of symbol slots including the reserved pseudo-symbol
pub const NUM_SYMBOLS: usize = 257;

/// Deepest possible tree over 257 leaves
const MAX_TREE_DEPTH: usize = NUM_SYMBOLS - 1;

/// A Huffman table in its DHT representation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuffTable {
    /// Number of codes of each length; `bits[0]` is unused
    pub bits: [u8; 17],
    /// Symbols in order of increasing code length
    pub huffval: [u8; 256],
}

impl Default for HuffTable {
    fn default() -> Self {
        Self {
            bits: [0; 17],
            huffval: [0; 256],
        }
    }
}

impl HuffTable {
    /// Build a table from a BITS list and its symbol values.
    pub fn from_spec(bits: &[u8; 17], values: &[u8]) -> Self {
        let mut htbl = Self {
            bits: *bits,
            ..Default::default()
        };
        htbl.huffval[..values.len()].copy_from_slice(values);
        htbl
    }

    /// Number of symbols with a code.
    pub fn num_symbols(&self) -> usize {
        self.bits[1..].iter().map(|&b| b as usize).sum()
    }

    /// The populated part of `huffval`.
    pub fn values(&self) -> &[u8] {
        &self.huffval[..self.num_symbols().min(256)]
    }
}

/// Per-symbol code lookup for the encoder.
#[derive(Clone, Debug)]
pub struct DerivedTable {
    /// Code for each symbol
    pub ehufco: [u16; 256],
    /// Code length for each symbol; 0 means no code
    pub ehufsi: [u8; 256],
}

impl Default for DerivedTable {
    fn default() -> Self {
        Self {
            ehufco: [0; 256],
            ehufsi: [0; 256],
        }
    }
}

impl DerivedTable {
    /// Expand a DHT-form table into symbol-indexed codes.
    ///
    /// DC tables may only carry symbols 0..=11.
    pub fn from_huff_table(htbl: &HuffTable, is_dc: bool) -> Result<Self> {
        // C.1: code size per position
        let mut huffsize = [0u8; 257];
        let mut lastp = 0usize;
        for len in 1..=MAX_CODE_LENGTH {
            let count = htbl.bits[len] as usize;
            if lastp + count > 256 {
                return Err(Error::InvalidHuffmanTable);
            }
            huffsize[lastp..lastp + count].fill(len as u8);
            lastp += count;
        }

        // C.2: canonical codes
        let mut huffcode = [0u32; 257];
        let mut code = 0u32;
        let mut si = huffsize[0] as u32;
        let mut p = 0usize;
        while p < lastp {
            while p < lastp && huffsize[p] as u32 == si {
                huffcode[p] = code;
                code += 1;
                p += 1;
            }
            // No code may be all ones
            if code >= (1u32 << si) {
                return Err(Error::InvalidHuffmanTable);
            }
            code <<= 1;
            si += 1;
        }

        // C.3: index by symbol
        let max_symbol = if is_dc { 11 } else { 255 };
        let mut dtbl = Self::default();
        for (&symbol, (&size, &code)) in htbl.huffval[..lastp]
            .iter()
            .zip(huffsize.iter().zip(huffcode.iter()))
        {
            let symbol = symbol as usize;
            if symbol > max_symbol || dtbl.ehufsi[symbol] != 0 {
                return Err(Error::InvalidHuffmanTable);
            }
            dtbl.ehufco[symbol] = code as u16;
            dtbl.ehufsi[symbol] = size;
        }

        Ok(dtbl)
    }

    /// (code, length) for a symbol; length 0 if the symbol has no code.
    #[inline]
    pub fn get_code(&self, symbol: u8) -> (u16, u8) {
        (self.ehufco[symbol as usize], self.ehufsi[symbol as usize])
    }
}

/// Symbol frequency accumulator for one table.
#[derive(Clone, Debug)]
pub struct FrequencyCounter {
    /// Count per symbol; slot 256 is reserved
    pub counts: [u64; NUM_SYMBOLS],
}

impl Default for FrequencyCounter {
    fn default() -> Self {
        Self {
            counts: [0; NUM_SYMBOLS],
        }
    }
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.counts.fill(0);
    }

    #[inline]
    pub fn count(&mut self, symbol: u8) {
        self.counts[symbol as usize] += 1;
    }

    /// True if no symbol has been counted.
    pub fn is_empty(&self) -> bool {
        self.counts[..256].iter().all(|&c| c == 0)
    }

    /// Build the optimal table for the counted symbols.
    pub fn generate_table(&self) -> Result<HuffTable> {
        generate_optimal_table(&self.counts)
    }
}

/// Build an optimal length-limited table from symbol counts (Section K.2).
///
/// Slot 256 is forced to count 1 so that no real symbol is assigned an
/// all-ones code. Symbols are placed in `huffval` ordered by their
/// unlimited code length, then by symbol value. A single used symbol gets a
/// 1-bit code.
pub fn generate_optimal_table(counts: &[u64; NUM_SYMBOLS]) -> Result<HuffTable> {
    let mut freq = *counts;
    freq[256] = 1;

    let mut codesize = [0usize; NUM_SYMBOLS];
    let mut others: [Option<usize>; NUM_SYMBOLS] = [None; NUM_SYMBOLS];

    loop {
        // Smallest nonzero count; ties go to the highest symbol
        let Some(c1) = smallest(&freq, None) else {
            break;
        };
        let Some(c2) = smallest(&freq, Some(c1)) else {
            break;
        };

        freq[c1] += freq[c2];
        freq[c2] = 0;

        codesize[c1] += 1;
        let mut node = c1;
        while let Some(next) = others[node] {
            node = next;
            codesize[node] += 1;
        }
        others[node] = Some(c2);

        codesize[c2] += 1;
        let mut node = c2;
        while let Some(next) = others[node] {
            node = next;
            codesize[node] += 1;
        }
    }

    let mut bits = [0usize; MAX_TREE_DEPTH + 1];
    for &size in codesize.iter().filter(|&&s| s > 0) {
        bits[size] += 1;
    }

    // Move overlong codes up the tree until nothing exceeds 16 bits
    for i in (MAX_CODE_LENGTH + 1..=MAX_TREE_DEPTH).rev() {
        while bits[i] > 0 {
            let mut j = i - 2;
            while j > 0 && bits[j] == 0 {
                j -= 1;
            }
            if j == 0 {
                return Err(Error::HuffmanCodeLengthOverflow);
            }
            bits[i] -= 2;
            bits[i - 1] += 1;
            bits[j + 1] += 2;
            bits[j] -= 1;
        }
    }

    // Drop the reserved symbol from the longest length in use
    if let Some(longest) = (1..=MAX_CODE_LENGTH).rev().find(|&i| bits[i] > 0) {
        bits[longest] -= 1;
    }

    let mut htbl = HuffTable::default();
    for len in 1..=MAX_CODE_LENGTH {
        htbl.bits[len] = bits[len] as u8;
    }

    let mut symbols: Vec<(usize, usize)> = (0..256)
        .filter(|&s| codesize[s] > 0)
        .map(|s| (codesize[s], s))
        .collect();
    symbols.sort_unstable();
    for (slot, &(_, symbol)) in htbl.huffval.iter_mut().zip(symbols.iter()) {
        *slot = symbol as u8;
    }

    Ok(htbl)
}

/// Index of the smallest nonzero entry, skipping `exclude`.
fn smallest(freq: &[u64; NUM_SYMBOLS], exclude: Option<usize>) -> Option<usize> {
    let mut best: Option<usize> = None;
    let mut value = u64::MAX;
    for (i, &f) in freq.iter().enumerate() {
        if f != 0 && f <= value && Some(i) != exclude {
            value = f;
            best = Some(i);
        }
    }
    best
}
