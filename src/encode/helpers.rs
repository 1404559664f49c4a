//! Helper functions for the encoder pipeline.
//!
//! Shared by the session controller and the unit tests of the lower-level
//! modules.

use crate::consts::{
    AC_CHROMINANCE_BITS, AC_CHROMINANCE_VALUES, AC_LUMINANCE_BITS, AC_LUMINANCE_VALUES,
    DC_CHROMINANCE_BITS, DC_CHROMINANCE_VALUES, DC_LUMINANCE_BITS, DC_LUMINANCE_VALUES,
};
use crate::error::Result;
use crate::huffman::HuffTable;
use crate::types::{ComponentInfo, Subsampling};

// ============================================================================
// Allocation Helpers
// ============================================================================

/// Helper to allocate a Vec with fallible allocation.
/// Returns Error::AllocationFailed if allocation fails.
#[inline]
pub(crate) fn try_alloc_vec<T: Clone>(value: T, len: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, value);
    Ok(v)
}

// ============================================================================
// Component Creation Helpers
// ============================================================================

/// Create component info for the given subsampling mode.
///
/// Returns 1 component for grayscale, 3 for color modes. Y uses table slot
/// 0, Cb and Cr share slot 1.
pub(crate) fn create_components(subsampling: Subsampling) -> Vec<ComponentInfo> {
    let (h_samp, v_samp) = subsampling.luma_factors();
    let luma = ComponentInfo {
        component_id: 1,
        h_samp_factor: h_samp,
        v_samp_factor: v_samp,
        quant_tbl_no: 0,
        dc_tbl_no: 0,
        ac_tbl_no: 0,
    };
    if subsampling == Subsampling::Gray {
        return vec![luma];
    }

    let chroma = |component_id| ComponentInfo {
        component_id,
        h_samp_factor: 1,
        v_samp_factor: 1,
        quant_tbl_no: 1,
        dc_tbl_no: 1,
        ac_tbl_no: 1,
    };
    vec![luma, chroma(2), chroma(3)]
}

// ============================================================================
// Standard Huffman Table Creation
// ============================================================================

/// Create standard DC luminance Huffman table.
pub(crate) fn create_std_dc_luma_table() -> HuffTable {
    HuffTable::from_spec(&DC_LUMINANCE_BITS, &DC_LUMINANCE_VALUES)
}

/// Create standard DC chrominance Huffman table.
pub(crate) fn create_std_dc_chroma_table() -> HuffTable {
    HuffTable::from_spec(&DC_CHROMINANCE_BITS, &DC_CHROMINANCE_VALUES)
}

/// Create standard AC luminance Huffman table.
pub(crate) fn create_std_ac_luma_table() -> HuffTable {
    HuffTable::from_spec(&AC_LUMINANCE_BITS, &AC_LUMINANCE_VALUES)
}

/// Create standard AC chrominance Huffman table.
pub(crate) fn create_std_ac_chroma_table() -> HuffTable {
    HuffTable::from_spec(&AC_CHROMINANCE_BITS, &AC_CHROMINANCE_VALUES)
}
