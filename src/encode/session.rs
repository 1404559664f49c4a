//! Scanline-driven encoding session.
//!
//! [`EncodingSession`] owns every piece of per-image state: parameters,
//! quantization and Huffman tables, the MCU-row image buffer, DC predictors
//! and the bit writer. Its lifecycle:
//!
//! ```text
//! Uninitialized -> Initialized -> AcceptingScanlines -> [PassOneComplete ->] Finalized -> Deinitialized
//! ```
//!
//! Headers are written when the emitting pass begins, so `init` produces no
//! output. With `two_pass` set, the first pass only counts Huffman symbols;
//! `process_end_of_image` then builds optimal tables and replays the retained
//! scanlines through the same pipeline to emit the scan.
//!
//! A sink write failure moves the session to [`EncoderState::Aborted`]; every
//! call except [`deinit`](EncodingSession::deinit) then fails with
//! [`Error::SessionAborted`] without touching the sink.

use log::{debug, trace};

use crate::bitstream::{BitWriter, OutputSink};
#[cfg(test)]
use crate::consts::DCTSIZE2;
use crate::entropy::{count_block, encode_block};
use crate::error::{Error, Result};
use crate::huffman::{DerivedTable, FrequencyCounter, HuffTable};
use crate::marker::MarkerWriter;
use crate::quant::{create_quant_tables, QuantTable};
use crate::sample::{ImageBuffer, McuGeometry};
use crate::types::{ComponentInfo, EncodingParams, Subsampling};

use super::helpers::{
    create_components, create_std_ac_chroma_table, create_std_ac_luma_table,
    create_std_dc_chroma_table, create_std_dc_luma_table,
};

/// Largest width or height a baseline frame header can carry
const MAX_DIMENSION: u32 = 65535;

/// Lifecycle state of an [`EncodingSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    /// No session; `init` may be called
    Uninitialized,
    /// Parameters validated and buffers allocated; no scanline yet
    Initialized,
    /// At least one scanline has been accepted
    AcceptingScanlines,
    /// Statistics pass done; optimal tables are being built and the image replayed
    PassOneComplete,
    /// EOI written and flushed
    Finalized,
    /// Buffers released; `init` may be called again
    Deinitialized,
    /// A sink write failed; only `deinit` is accepted
    Aborted,
}

impl EncoderState {
    fn name(self) -> &'static str {
        match self {
            EncoderState::Uninitialized => "uninitialized",
            EncoderState::Initialized => "initialized",
            EncoderState::AcceptingScanlines => "accepting scanlines",
            EncoderState::PassOneComplete => "between passes",
            EncoderState::Finalized => "finalized",
            EncoderState::Deinitialized => "deinitialized",
            EncoderState::Aborted => "aborted",
        }
    }
}

/// What the current pass does with each quantized block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// Count Huffman symbols; emit nothing
    Statistics,
    /// Entropy-code into the bit writer
    Emit,
}

/// DC and AC Huffman tables for one component class.
struct ClassTables {
    dc: HuffTable,
    ac: HuffTable,
    dc_derived: DerivedTable,
    ac_derived: DerivedTable,
}

impl ClassTables {
    fn new(dc: HuffTable, ac: HuffTable) -> Result<Self> {
        let dc_derived = DerivedTable::from_huff_table(&dc, true)?;
        let ac_derived = DerivedTable::from_huff_table(&ac, false)?;
        Ok(Self {
            dc,
            ac,
            dc_derived,
            ac_derived,
        })
    }

    /// Annex K tables for luma (class 0) or chroma (class 1).
    fn standard(class: usize) -> Result<Self> {
        if class == 0 {
            Self::new(create_std_dc_luma_table(), create_std_ac_luma_table())
        } else {
            Self::new(create_std_dc_chroma_table(), create_std_ac_chroma_table())
        }
    }
}

/// Symbol statistics for one component class.
#[derive(Default)]
struct ClassCounters {
    dc: FrequencyCounter,
    ac: FrequencyCounter,
}

/// One frame component and its DC predictor.
struct Component {
    info: ComponentInfo,
    last_dc_val: i32,
}

/// Per-image state, alive between `init` and `deinit`.
struct Session {
    params: EncodingParams,
    width: u32,
    height: u32,
    channels: usize,
    components: Vec<Component>,
    luma_quant: QuantTable,
    chroma_quant: QuantTable,
    image: ImageBuffer,
    pass: Pass,
    /// Scanlines accepted in the current pass
    scanlines: u32,
    /// MCU rows finished in the current pass
    mcu_rows_done: usize,
    /// Source scanlines kept for the second pass
    retained: Vec<u8>,
    counters: [ClassCounters; 2],
    /// Tables for the emitting pass, indexed by class
    tables: Vec<ClassTables>,
    #[cfg(test)]
    coeff_log: [Vec<[i16; DCTSIZE2]>; 2],
}

impl Session {
    fn num_classes(&self) -> usize {
        if self.components.len() == 1 {
            1
        } else {
            2
        }
    }

    fn component_infos(&self) -> Vec<ComponentInfo> {
        self.components.iter().map(|c| c.info).collect()
    }

    fn load_scanline<S: OutputSink>(
        &mut self,
        writer: &mut BitWriter<S>,
        scanline: &[u8],
    ) -> Result<()> {
        self.image.load_scanline(scanline, self.channels);
        self.scanlines += 1;
        if self.image.is_full() {
            self.process_mcu_row(writer)?;
        }
        Ok(())
    }

    /// Transform the buffered MCU row and count or encode its blocks.
    fn process_mcu_row<S: OutputSink>(&mut self, writer: &mut BitWriter<S>) -> Result<()> {
        trace!(
            "MCU row {}/{} ({:?} pass)",
            self.mcu_rows_done + 1,
            self.image.geometry().mcu_rows,
            self.pass
        );

        self.image.transform_row(&self.luma_quant, &self.chroma_quant);

        for mcu_col in 0..self.image.geometry().mcus_per_row {
            let mut blocks = self.image.mcu_coeffs(mcu_col).iter();
            for comp in self.components.iter_mut() {
                let class = comp.info.quant_tbl_no as usize;
                for block in blocks.by_ref().take(comp.info.blocks_in_mcu()) {
                    #[cfg(test)]
                    self.coeff_log[self.pass as usize].push(*block);

                    match self.pass {
                        Pass::Statistics => {
                            let counters = &mut self.counters[class];
                            count_block(
                                block,
                                &mut comp.last_dc_val,
                                &mut counters.dc,
                                &mut counters.ac,
                            );
                        }
                        Pass::Emit => {
                            let tables = &self.tables[class];
                            encode_block(
                                writer,
                                block,
                                &mut comp.last_dc_val,
                                &tables.dc_derived,
                                &tables.ac_derived,
                            )?;
                        }
                    }
                }
            }
        }

        self.image.reset();
        self.mcu_rows_done += 1;
        Ok(())
    }

    /// Pad and process a partial last MCU row, if any.
    fn finish_partial_row<S: OutputSink>(&mut self, writer: &mut BitWriter<S>) -> Result<()> {
        if self.image.rows_loaded() > 0 {
            self.image.pad_rows();
            self.process_mcu_row(writer)?;
        }
        Ok(())
    }

    /// Write SOI through SOS.
    fn write_headers<S: OutputSink>(&self, writer: &mut BitWriter<S>) -> Result<()> {
        let infos = self.component_infos();
        let mut markers = MarkerWriter::new(Vec::with_capacity(1024));

        markers.write_soi()?;
        markers.write_jfif_app0(0, 1, 1)?;
        markers.write_dqt(0, &self.luma_quant.zigzag_values())?;
        if self.num_classes() == 2 {
            markers.write_dqt(1, &self.chroma_quant.zigzag_values())?;
        }
        markers.write_sof0(self.height as u16, self.width as u16, &infos)?;
        for (class, tables) in self.tables.iter().enumerate() {
            markers.write_dht(class as u8, false, &tables.dc)?;
            markers.write_dht(class as u8, true, &tables.ac)?;
        }
        markers.write_sos(&infos)?;

        writer.write_bytes(&markers.into_inner())?;
        Ok(())
    }

    /// Build optimal tables from the statistics pass.
    fn build_optimal_tables(&mut self) -> Result<()> {
        let mut tables = Vec::with_capacity(self.num_classes());
        for (class, counters) in self.counters[..self.num_classes()].iter().enumerate() {
            let dc = counters.dc.generate_table()?;
            let ac = counters.ac.generate_table()?;
            debug!(
                "class {} optimal tables: {} DC symbols, {} AC symbols",
                class,
                dc.num_symbols(),
                ac.num_symbols()
            );
            tables.push(ClassTables::new(dc, ac)?);
        }
        self.tables = tables;
        Ok(())
    }

    /// Switch to the emitting pass with fresh predictors and cursors.
    fn begin_emit_pass(&mut self) {
        self.pass = Pass::Emit;
        self.scanlines = 0;
        self.mcu_rows_done = 0;
        self.image.reset();
        for comp in self.components.iter_mut() {
            comp.last_dc_val = 0;
        }
    }

    /// Second pass over the retained scanlines.
    fn replay<S: OutputSink>(&mut self, writer: &mut BitWriter<S>) -> Result<()> {
        let retained = std::mem::take(&mut self.retained);
        let row_len = self.width as usize * self.channels;
        for scanline in retained.chunks_exact(row_len) {
            self.load_scanline(writer, scanline)?;
        }
        self.finish_partial_row(writer)
    }
}

/// Baseline JPEG encoder driven one scanline at a time.
///
/// # Example
///
/// ```
/// use seqjpeg::{EncodingParams, EncodingSession};
///
/// # fn main() -> Result<(), seqjpeg::Error> {
/// let mut session = EncodingSession::new(Vec::new());
/// session.init(16, 16, 3, EncodingParams::default())?;
/// let row = vec![200u8; 16 * 3];
/// for _ in 0..16 {
///     session.process_scanline(&row)?;
/// }
/// session.process_end_of_image()?;
/// let jpeg = session.into_sink();
/// assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
/// # Ok(())
/// # }
/// ```
pub struct EncodingSession<S: OutputSink> {
    writer: BitWriter<S>,
    state: EncoderState,
    params: EncodingParams,
    session: Option<Box<Session>>,
}

impl<S: OutputSink> EncodingSession<S> {
    /// Create an encoder writing to `sink`.
    pub fn new(sink: S) -> Self {
        Self {
            writer: BitWriter::new(sink),
            state: EncoderState::Uninitialized,
            params: EncodingParams::default(),
            session: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Parameters in effect for the current (or last) session.
    ///
    /// Single-channel input is recorded with [`Subsampling::Gray`].
    pub fn params(&self) -> &EncodingParams {
        &self.params
    }

    /// Bytes produced so far in this session.
    pub fn bytes_written(&self) -> u64 {
        self.writer.bytes_written()
    }

    /// Get a reference to the sink.
    pub fn sink(&self) -> &S {
        self.writer.sink()
    }

    /// Consume the encoder and return the sink.
    pub fn into_sink(self) -> S {
        self.writer.into_sink()
    }

    fn invalid_state(&self, operation: &'static str) -> Error {
        if self.state == EncoderState::Aborted {
            Error::SessionAborted
        } else {
            Error::InvalidState {
                operation,
                state: self.state.name(),
            }
        }
    }

    /// Start a session for a `width` x `height` image of `channels` bytes
    /// per pixel (1, 3 or 4).
    ///
    /// Validates everything and allocates all buffers; writes nothing.
    /// On failure the encoder stays in its previous state.
    pub fn init(
        &mut self,
        width: u32,
        height: u32,
        channels: u8,
        params: EncodingParams,
    ) -> Result<()> {
        if !matches!(
            self.state,
            EncoderState::Uninitialized | EncoderState::Deinitialized
        ) {
            return Err(self.invalid_state("init"));
        }

        params.check()?;
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::InvalidDimensions { width, height });
        }
        if !matches!(channels, 1 | 3 | 4) {
            return Err(Error::UnsupportedChannelCount(channels));
        }

        let mut params = params;
        if channels == 1 {
            params.subsampling = Subsampling::Gray;
        }

        let geometry = McuGeometry::new(width as usize, height as usize, params.subsampling);
        let image = ImageBuffer::new(geometry)?;

        let components: Vec<Component> = create_components(params.subsampling)
            .into_iter()
            .map(|info| Component {
                info,
                last_dc_val: 0,
            })
            .collect();
        let num_classes = if components.len() == 1 { 1 } else { 2 };

        let (luma_quant, chroma_quant) = create_quant_tables(&params);

        let (pass, retained, tables) = if params.two_pass {
            let mut retained = Vec::new();
            retained.try_reserve_exact(width as usize * height as usize * channels as usize)?;
            (Pass::Statistics, retained, Vec::new())
        } else {
            let tables = (0..num_classes)
                .map(ClassTables::standard)
                .collect::<Result<Vec<_>>>()?;
            (Pass::Emit, Vec::new(), tables)
        };

        debug!(
            "init {}x{} channels={} quality={} subsampling={} two_pass={} ({} MCU rows of {} MCUs)",
            width,
            height,
            channels,
            params.quality,
            params.subsampling.name(),
            params.two_pass,
            geometry.mcu_rows,
            geometry.mcus_per_row
        );

        self.writer.reset();
        self.params = params;
        self.session = Some(Box::new(Session {
            params,
            width,
            height,
            channels: channels as usize,
            components,
            luma_quant,
            chroma_quant,
            image,
            pass,
            scanlines: 0,
            mcu_rows_done: 0,
            retained,
            counters: Default::default(),
            tables,
            #[cfg(test)]
            coeff_log: Default::default(),
        }));
        self.state = EncoderState::Initialized;
        Ok(())
    }

    /// Submit the next scanline, `width * channels` bytes.
    pub fn process_scanline(&mut self, scanline: &[u8]) -> Result<()> {
        if !matches!(
            self.state,
            EncoderState::Initialized | EncoderState::AcceptingScanlines
        ) {
            return Err(self.invalid_state("process scanline"));
        }
        let Some(session) = self.session.as_deref_mut() else {
            return Err(self.invalid_state("process scanline"));
        };

        let expected = session.width as usize * session.channels;
        if scanline.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: scanline.len(),
            });
        }
        if session.scanlines == session.height {
            return Err(Error::TooManyScanlines {
                height: session.height,
            });
        }

        let writer = &mut self.writer;
        let result = (|| -> Result<()> {
            if self.state == EncoderState::Initialized && session.pass == Pass::Emit {
                session.write_headers(writer)?;
            }
            if session.params.two_pass {
                session.retained.extend_from_slice(scanline);
            }
            session.load_scanline(writer, scanline)
        })();

        match result {
            Ok(()) => {
                self.state = EncoderState::AcceptingScanlines;
                Ok(())
            }
            Err(e) => {
                self.state = EncoderState::Aborted;
                Err(e)
            }
        }
    }

    /// Finish the image: flush the last MCU row, run the second pass if
    /// enabled, pad the final byte with 1-bits and write EOI.
    ///
    /// Every scanline must have been submitted.
    pub fn process_end_of_image(&mut self) -> Result<()> {
        if self.state != EncoderState::AcceptingScanlines {
            return Err(self.invalid_state("finish"));
        }
        let Some(session) = self.session.as_deref_mut() else {
            return Err(self.invalid_state("finish"));
        };
        if session.scanlines != session.height {
            return Err(Error::IncompleteImage {
                expected: session.height,
                received: session.scanlines,
            });
        }

        let writer = &mut self.writer;
        let state = &mut self.state;
        let result = (|| -> Result<()> {
            session.finish_partial_row(writer)?;

            if session.pass == Pass::Statistics {
                *state = EncoderState::PassOneComplete;
                debug!(
                    "statistics pass complete after {} MCU rows",
                    session.mcu_rows_done
                );
                session.build_optimal_tables()?;
                session.begin_emit_pass();
                session.write_headers(writer)?;
                session.replay(writer)?;
            }

            writer.flush_bits()?;
            let mut markers = MarkerWriter::new(Vec::with_capacity(2));
            markers.write_eoi()?;
            writer.write_bytes(&markers.into_inner())?;
            writer.flush_to_sink()?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                debug!("finalized: {} bytes", self.writer.bytes_written());
                self.state = EncoderState::Finalized;
                Ok(())
            }
            Err(e) => {
                self.state = EncoderState::Aborted;
                Err(e)
            }
        }
    }

    /// Release all session buffers. Legal from any state; idempotent.
    pub fn deinit(&mut self) {
        self.session = None;
        self.writer.reset();
        self.state = EncoderState::Deinitialized;
    }

    /// Quantized blocks seen by each pass: `[statistics, emit]`.
    #[cfg(test)]
    fn coeff_log(&self) -> Option<&[Vec<[i16; DCTSIZE2]>; 2]> {
        self.session.as_deref().map(|s| &s.coeff_log)
    }
}
