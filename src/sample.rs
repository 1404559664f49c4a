//! MCU-row image buffer: colour conversion, edge padding and chroma
//! subsampling.
//!
//! The buffer holds one MCU row (8 or 16 scanlines) of full-resolution
//! Y/Cb/Cr planes as `f32`, addressed through an explicit [`McuGeometry`]
//! (row stride = padded width). Subsampled chroma blocks are produced on
//! fetch with a box filter:
//! - 4:4:4 (H1V1) - direct copy
//! - 4:2:2 (H2V1) - mean of each horizontal pair
//! - 4:2:0 (H2V2) - mean of each 2x2 group
//!
//! Means are exact in `f32`; nothing is rounded to integers before the DCT.
//! Columns past the image width are filled by replicating the last pixel of
//! each row, and rows past the image height by replicating the last row.

use crate::color::{convert_row_to_gray, convert_row_to_ycbcr};
use crate::consts::{DCTSIZE, DCTSIZE2};
use crate::dct::{forward_dct_8x8, SampleBlock};
use crate::encode::helpers::try_alloc_vec;
use crate::error::Result;
use crate::quant::{quantize_block, QuantTable};
use crate::types::Subsampling;

/// Level shift applied before the DCT
const CENTER: f32 = 128.0;

/// Fixed layout of the MCU grid for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McuGeometry {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
    /// Subsampling mode (Gray for one-component output)
    pub subsampling: Subsampling,
    /// MCU width in pixels (8 or 16)
    pub mcu_w: usize,
    /// MCU height in pixels (8 or 16)
    pub mcu_h: usize,
    /// Number of MCUs per MCU row
    pub mcus_per_row: usize,
    /// Number of MCU rows
    pub mcu_rows: usize,
    /// Plane row stride: width padded to a whole number of MCUs
    pub stride: usize,
}

impl McuGeometry {
    /// Compute the MCU layout for an image.
    pub fn new(width: usize, height: usize, subsampling: Subsampling) -> Self {
        let (h, v) = subsampling.luma_factors();
        let mcu_w = DCTSIZE * h as usize;
        let mcu_h = DCTSIZE * v as usize;
        let mcus_per_row = width.div_ceil(mcu_w);
        let mcu_rows = height.div_ceil(mcu_h);
        Self {
            width,
            height,
            subsampling,
            mcu_w,
            mcu_h,
            mcus_per_row,
            mcu_rows,
            stride: mcus_per_row * mcu_w,
        }
    }

    /// Number of components in the frame.
    pub fn num_components(&self) -> usize {
        self.subsampling.num_components()
    }

    /// Number of blocks component `comp` contributes to each MCU.
    pub fn blocks_for_component(&self, comp: usize) -> usize {
        if comp == 0 {
            let (h, v) = self.subsampling.luma_factors();
            h as usize * v as usize
        } else {
            1
        }
    }

    /// Total blocks per MCU (1, 3, 4 or 6).
    pub fn blocks_per_mcu(&self) -> usize {
        (0..self.num_components())
            .map(|c| self.blocks_for_component(c))
            .sum()
    }
}

/// Sliding one-MCU-row window over the source image.
pub struct ImageBuffer {
    geometry: McuGeometry,
    /// Full-resolution planes, `stride * mcu_h` samples each
    planes: Vec<Vec<f32>>,
    /// Quantized coefficients (zigzag order) for every block of the row, MCU order
    coeffs: Vec<[i16; DCTSIZE2]>,
    /// Scanlines loaded into the current MCU row
    rows_loaded: usize,
}

impl ImageBuffer {
    /// Allocate the buffer for a geometry.
    pub fn new(geometry: McuGeometry) -> Result<Self> {
        let plane_len = geometry.stride * geometry.mcu_h;
        let mut planes = Vec::new();
        planes.try_reserve_exact(geometry.num_components())?;
        for _ in 0..geometry.num_components() {
            planes.push(try_alloc_vec(0.0f32, plane_len)?);
        }
        let coeffs = try_alloc_vec(
            [0i16; DCTSIZE2],
            geometry.blocks_per_mcu() * geometry.mcus_per_row,
        )?;
        Ok(Self {
            geometry,
            planes,
            coeffs,
            rows_loaded: 0,
        })
    }

    /// The geometry this buffer was built for.
    pub fn geometry(&self) -> &McuGeometry {
        &self.geometry
    }

    /// Scanlines loaded into the current MCU row.
    pub fn rows_loaded(&self) -> usize {
        self.rows_loaded
    }

    /// True once the MCU row holds `mcu_h` scanlines.
    pub fn is_full(&self) -> bool {
        self.rows_loaded == self.geometry.mcu_h
    }

    /// Start a new MCU row.
    pub fn reset(&mut self) {
        self.rows_loaded = 0;
    }

    /// Convert one source scanline into the next row of the planes.
    ///
    /// `src` must hold `width * channels` bytes; the caller checks this.
    pub fn load_scanline(&mut self, src: &[u8], channels: usize) {
        debug_assert!(!self.is_full());
        let g = self.geometry;
        let start = self.rows_loaded * g.stride;
        let end = start + g.width;

        if g.num_components() == 1 {
            convert_row_to_gray(src, channels, &mut self.planes[0][start..end]);
        } else {
            let [y, cb, cr] = &mut self.planes[..] else {
                unreachable!("color geometry always has three planes");
            };
            convert_row_to_ycbcr(
                src,
                channels,
                &mut y[start..end],
                &mut cb[start..end],
                &mut cr[start..end],
            );
        }

        // Replicate the last pixel across the padding columns
        for plane in self.planes.iter_mut() {
            let last = plane[end - 1];
            plane[end..start + g.stride].fill(last);
        }

        self.rows_loaded += 1;
    }

    /// Fill the rest of a partial MCU row by replicating the last loaded row.
    pub fn pad_rows(&mut self) {
        let g = self.geometry;
        if self.rows_loaded == 0 {
            return;
        }
        let last = (self.rows_loaded - 1) * g.stride;
        for plane in self.planes.iter_mut() {
            for row in self.rows_loaded..g.mcu_h {
                plane.copy_within(last..last + g.stride, row * g.stride);
            }
        }
        self.rows_loaded = g.mcu_h;
    }

    #[inline]
    fn sample(&self, comp: usize, x: usize, y: usize) -> f32 {
        self.planes[comp][y * self.geometry.stride + x]
    }

    /// Fetch one level-shifted 8x8 block.
    ///
    /// `block_index` selects among the component's blocks in this MCU
    /// (row-major for 2x2 luma).
    pub fn fetch_block(&self, mcu_col: usize, comp: usize, block_index: usize) -> SampleBlock {
        let g = &self.geometry;
        let mut block = [0.0f32; DCTSIZE2];
        let x0 = mcu_col * g.mcu_w;

        if comp == 0 || g.subsampling == Subsampling::H1V1 {
            let (h, _) = if comp == 0 {
                g.subsampling.luma_factors()
            } else {
                (1, 1)
            };
            let bx = x0 + (block_index % h as usize) * DCTSIZE;
            let by = (block_index / h as usize) * DCTSIZE;
            for y in 0..DCTSIZE {
                for x in 0..DCTSIZE {
                    block[y * DCTSIZE + x] = self.sample(comp, bx + x, by + y) - CENTER;
                }
            }
            return block;
        }

        match g.subsampling {
            Subsampling::H2V1 => {
                for y in 0..DCTSIZE {
                    for x in 0..DCTSIZE {
                        block[y * DCTSIZE + x] = self.blend_dual(comp, x0 + x * 2, y) - CENTER;
                    }
                }
            }
            Subsampling::H2V2 => {
                for y in 0..DCTSIZE {
                    for x in 0..DCTSIZE {
                        block[y * DCTSIZE + x] =
                            self.blend_quad(comp, x0 + x * 2, y * 2) - CENTER;
                    }
                }
            }
            Subsampling::Gray | Subsampling::H1V1 => unreachable!("handled above"),
        }
        block
    }

    /// Mean of a horizontal pair.
    #[inline]
    fn blend_dual(&self, comp: usize, x: usize, y: usize) -> f32 {
        (self.sample(comp, x, y) + self.sample(comp, x + 1, y)) * 0.5
    }

    /// Mean of a 2x2 group.
    #[inline]
    fn blend_quad(&self, comp: usize, x: usize, y: usize) -> f32 {
        (self.sample(comp, x, y)
            + self.sample(comp, x + 1, y)
            + self.sample(comp, x, y + 1)
            + self.sample(comp, x + 1, y + 1))
            * 0.25
    }

    /// Transform and quantize every block of the loaded MCU row.
    ///
    /// Coefficients are stored in MCU order: for each MCU, the luma blocks
    /// followed by Cb and Cr.
    pub fn transform_row(&mut self, luma: &QuantTable, chroma: &QuantTable) {
        let g = self.geometry;
        let per_mcu = g.blocks_per_mcu();
        for mcu_col in 0..g.mcus_per_row {
            let mut slot = mcu_col * per_mcu;
            for comp in 0..g.num_components() {
                let table = if comp == 0 { luma } else { chroma };
                for block_index in 0..g.blocks_for_component(comp) {
                    let mut block = self.fetch_block(mcu_col, comp, block_index);
                    forward_dct_8x8(&mut block);
                    self.coeffs[slot] = quantize_block(&block, table);
                    slot += 1;
                }
            }
        }
    }

    /// Quantized blocks of one MCU, in MCU order.
    pub fn mcu_coeffs(&self, mcu_col: usize) -> &[[i16; DCTSIZE2]] {
        let per_mcu = self.geometry.blocks_per_mcu();
        &self.coeffs[mcu_col * per_mcu..(mcu_col + 1) * per_mcu]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(subsampling: Subsampling, width: usize, rgb: [u8; 3]) -> ImageBuffer {
        let geometry = McuGeometry::new(width, 16, subsampling);
        let mut buf = ImageBuffer::new(geometry).unwrap();
        let line: Vec<u8> = (0..width).flat_map(|_| rgb).collect();
        while !buf.is_full() {
            buf.load_scanline(&line, 3);
        }
        buf
    }

    #[test]
    fn test_geometry() {
        let g = McuGeometry::new(10, 8, Subsampling::Gray);
        assert_eq!((g.mcu_w, g.mcu_h), (8, 8));
        assert_eq!(g.mcus_per_row, 2);
        assert_eq!(g.mcu_rows, 1);
        assert_eq!(g.stride, 16);
        assert_eq!(g.blocks_per_mcu(), 1);

        let g = McuGeometry::new(33, 17, Subsampling::H2V2);
        assert_eq!((g.mcu_w, g.mcu_h), (16, 16));
        assert_eq!(g.mcus_per_row, 3);
        assert_eq!(g.mcu_rows, 2);
        assert_eq!(g.blocks_per_mcu(), 6);

        assert_eq!(McuGeometry::new(8, 8, Subsampling::H1V1).blocks_per_mcu(), 3);
        assert_eq!(McuGeometry::new(8, 8, Subsampling::H2V1).blocks_per_mcu(), 4);
    }

    #[test]
    fn test_right_edge_replication() {
        let geometry = McuGeometry::new(10, 8, Subsampling::Gray);
        let mut buf = ImageBuffer::new(geometry).unwrap();
        let line: Vec<u8> = (0..10u8).map(|x| x * 10).collect();
        buf.load_scanline(&line, 1);
        buf.pad_rows();
        assert!(buf.is_full());

        // Second MCU covers x = 8..16; x >= 10 repeats the pixel at x = 9.
        let block = buf.fetch_block(1, 0, 0);
        assert_eq!(block[0], 80.0 - 128.0);
        assert_eq!(block[1], 90.0 - 128.0);
        for x in 2..8 {
            assert_eq!(block[x], 90.0 - 128.0);
        }
        // Every padded row equals the single loaded row.
        for y in 1..8 {
            assert_eq!(block[y * 8..y * 8 + 8], block[0..8]);
        }
    }

    #[test]
    fn test_bottom_edge_replication() {
        let geometry = McuGeometry::new(8, 8, Subsampling::Gray);
        let mut buf = ImageBuffer::new(geometry).unwrap();
        for v in [10u8, 20, 30] {
            buf.load_scanline(&[v; 8], 1);
        }
        buf.pad_rows();
        let block = buf.fetch_block(0, 0, 0);
        assert_eq!(block[0], 10.0 - 128.0);
        assert_eq!(block[16], 30.0 - 128.0);
        assert_eq!(block[56], 30.0 - 128.0);
    }

    #[test]
    fn test_h2v2_block_layout() {
        let geometry = McuGeometry::new(16, 16, Subsampling::H2V2);
        let mut buf = ImageBuffer::new(geometry).unwrap();
        // Luma value encodes quadrant: top-left 0, top-right 64, bottom-left 128, bottom-right 192
        for y in 0..16 {
            let line: Vec<u8> = (0..16)
                .flat_map(|x| {
                    let v = ((y / 8) * 128 + (x / 8) * 64) as u8;
                    [v, v, v]
                })
                .collect();
            buf.load_scanline(&line, 3);
        }
        let expected = [0.0f32, 64.0, 128.0, 192.0];
        for (i, &e) in expected.iter().enumerate() {
            let block = buf.fetch_block(0, 0, i);
            assert!((block[27] - (e - 128.0)).abs() < 0.01, "block {}", i);
        }
    }

    #[test]
    fn test_chroma_box_filter() {
        let geometry = McuGeometry::new(16, 16, Subsampling::H2V2);
        let mut buf = ImageBuffer::new(geometry).unwrap();
        // Alternate red / blue columns: Cb averages over each pair.
        for _ in 0..16 {
            let line: Vec<u8> = (0..16)
                .flat_map(|x| if x % 2 == 0 { [255, 0, 0] } else { [0, 0, 255] })
                .collect();
            buf.load_scanline(&line, 3);
        }
        let (_, cb_r, _) = crate::color::rgb_to_ycbcr(255, 0, 0);
        let (_, cb_b, _) = crate::color::rgb_to_ycbcr(0, 0, 255);
        let block = buf.fetch_block(0, 1, 0);
        let expected = (cb_r + cb_b) * 0.5 - 128.0;
        assert!(block.iter().all(|&s| (s - expected).abs() < 1e-3));
    }

    #[test]
    fn test_solid_color_all_subsamplings() {
        for subsampling in [Subsampling::H1V1, Subsampling::H2V1, Subsampling::H2V2] {
            let buf = filled(subsampling, 16, [200, 100, 50]);
            let (y, cb, cr) = crate::color::rgb_to_ycbcr(200, 100, 50);
            for (comp, value) in [(0, y), (1, cb), (2, cr)] {
                let block = buf.fetch_block(0, comp, 0);
                assert!(
                    block.iter().all(|&s| (s - (value - 128.0)).abs() < 1e-3),
                    "{:?} comp {}",
                    subsampling,
                    comp
                );
            }
        }
    }

    #[test]
    fn test_transform_row_mcu_order() {
        let mut buf = filled(Subsampling::H2V2, 32, [128, 128, 128]);
        let (luma, chroma) = crate::quant::create_quant_tables(&Default::default());
        buf.transform_row(&luma, &chroma);
        assert_eq!(buf.mcu_coeffs(0).len(), 6);
        assert_eq!(buf.mcu_coeffs(1).len(), 6);
        // Mid-gray: every coefficient quantizes to zero
        for mcu in 0..2 {
            for block in buf.mcu_coeffs(mcu) {
                assert!(block.iter().all(|&c| c == 0));
            }
        }
    }
}
