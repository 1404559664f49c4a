//! Forward DCT (Discrete Cosine Transform) for JPEG encoding.
//!
//! Floating-point implementation of the Arai, Agui & Nakajima (AAN)
//! scaled DCT, the same factorisation as libjpeg's `jfdctflt.c`:
//! 5 multiplies and 29 adds per 1-D pass, applied to rows then columns.
//!
//! The output is scaled: coefficient `(u, v)` comes out multiplied by
//! `8 * AAN_SCALE[u] * AAN_SCALE[v]`. That factor is folded into the
//! quantization divisors (see [`crate::quant::QuantTable::divisors`]) so the
//! transform itself never needs it.
//!
//! Reference: ITU-T T.81 Section A.3.3

use multiversion::multiversion;

use crate::consts::{DCTSIZE, DCTSIZE2};

/// One 8x8 block of level-shifted samples, row-major.
pub type SampleBlock = [f32; DCTSIZE2];

/// AAN output scale factors: `AAN_SCALE[0] = 1`,
/// `AAN_SCALE[k] = cos(k * PI / 16) * sqrt(2)` for k = 1..7.
pub const AAN_SCALE: [f64; DCTSIZE] = [
    1.0,
    1.387_039_845,
    1.306_562_965,
    1.175_875_602,
    1.0,
    0.785_694_958,
    0.541_196_100,
    0.275_899_379,
];

const C_0_707106781: f32 = 0.707_106_781;
const C_0_382683433: f32 = 0.382_683_433;
const C_0_541196100: f32 = 0.541_196_100;
const C_1_306562965: f32 = 1.306_562_965;

/// One 8-point AAN pass over `data[base + k * stride]` for k = 0..8.
#[inline(always)]
fn fdct_1d(data: &mut SampleBlock, base: usize, stride: usize) {
    let idx = |k: usize| base + k * stride;

    let tmp0 = data[idx(0)] + data[idx(7)];
    let tmp7 = data[idx(0)] - data[idx(7)];
    let tmp1 = data[idx(1)] + data[idx(6)];
    let tmp6 = data[idx(1)] - data[idx(6)];
    let tmp2 = data[idx(2)] + data[idx(5)];
    let tmp5 = data[idx(2)] - data[idx(5)];
    let tmp3 = data[idx(3)] + data[idx(4)];
    let tmp4 = data[idx(3)] - data[idx(4)];

    // Even part
    let tmp10 = tmp0 + tmp3;
    let tmp13 = tmp0 - tmp3;
    let tmp11 = tmp1 + tmp2;
    let tmp12 = tmp1 - tmp2;

    data[idx(0)] = tmp10 + tmp11;
    data[idx(4)] = tmp10 - tmp11;

    let z1 = (tmp12 + tmp13) * C_0_707106781;
    data[idx(2)] = tmp13 + z1;
    data[idx(6)] = tmp13 - z1;

    // Odd part
    let tmp10 = tmp4 + tmp5;
    let tmp11 = tmp5 + tmp6;
    let tmp12 = tmp6 + tmp7;

    // The rotator is modified from fig 4-8 to avoid extra negations.
    let z5 = (tmp10 - tmp12) * C_0_382683433;
    let z2 = C_0_541196100 * tmp10 + z5;
    let z4 = C_1_306562965 * tmp12 + z5;
    let z3 = tmp11 * C_0_707106781;

    let z11 = tmp7 + z3;
    let z13 = tmp7 - z3;

    data[idx(5)] = z13 + z2;
    data[idx(3)] = z13 - z2;
    data[idx(1)] = z11 + z4;
    data[idx(7)] = z11 - z4;
}

/// Perform the forward DCT on one 8x8 block in place.
///
/// Input: level-shifted samples (value - 128) in row-major order.
/// Output: AAN-scaled coefficients in row-major order.
#[multiversion(targets(
    "x86_64+avx2",
    "x86_64+sse4.1",
    "x86+avx2",
    "x86+sse4.1",
    "aarch64+neon",
))]
pub fn forward_dct_8x8(block: &mut SampleBlock) {
    // Pass 1: process rows
    for row in 0..DCTSIZE {
        fdct_1d(block, row * DCTSIZE, 1);
    }
    // Pass 2: process columns
    for col in 0..DCTSIZE {
        fdct_1d(block, col, DCTSIZE);
    }
}
