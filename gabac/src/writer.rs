//! Binarization encode layer.
//!
//! Translates unsigned symbol values into bin sequences and feeds them
//! to the arithmetic coder, either through adaptive context models or
//! through the bypass path. One scheme corresponds to one pair of
//! `write_*_bypass` / `write_*_cabac` methods; the resolved
//! [`BinCoding`] is dispatched through a single `match`.

use crate::binary_arithmetic::BinaryArithmeticEncoder;
use crate::context_model::ContextTable;

/// A binarization scheme with its parameters resolved against the
/// stream configuration. Sign folding happens before values reach this
/// layer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum BinCoding {
    Binary {
        c_length: u8,
    },
    TruncatedUnary {
        c_max: u32,
    },
    ExpGolomb,
    TruncatedExpGolomb {
        c_max_teg: u32,
    },
    SplitUnitwise {
        output_symbol_size: u8,
        split_unit_size: u8,
    },
    DoubleTruncatedUnary {
        output_symbol_size: u8,
        split_unit_size: u8,
        c_max_dtu: u32,
    },
}

#[derive(Debug)]
pub(crate) struct Writer {
    encoder: BinaryArithmeticEncoder,
    contexts: ContextTable,
}

impl Writer {
    #[must_use]
    pub fn new(num_contexts: usize, context_init: Option<&[u8]>) -> Self {
        Self {
            encoder: BinaryArithmeticEncoder::new(),
            contexts: ContextTable::new(num_contexts, context_init),
        }
    }

    /// Writes one value through the bypass path.
    pub fn write_symbol_bypass(&mut self, value: u64, coding: &BinCoding) {
        match *coding {
            BinCoding::Binary { c_length } => self.write_bi_bypass(value, c_length),
            BinCoding::TruncatedUnary { c_max } => self.write_tu_bypass(value, c_max),
            BinCoding::ExpGolomb => self.write_eg_bypass(value),
            BinCoding::TruncatedExpGolomb { c_max_teg } => self.write_teg_bypass(value, c_max_teg),
            BinCoding::SplitUnitwise {
                output_symbol_size,
                split_unit_size,
            } => self.write_sutu_bypass(value, output_symbol_size, split_unit_size),
            BinCoding::DoubleTruncatedUnary {
                output_symbol_size,
                split_unit_size,
                c_max_dtu,
            } => self.write_dtu_bypass(value, output_symbol_size, split_unit_size, c_max_dtu),
        }
    }

    /// Writes one value through context models starting at `ctx_idx`.
    pub fn write_symbol(&mut self, value: u64, coding: &BinCoding, ctx_idx: usize) {
        match *coding {
            BinCoding::Binary { c_length } => self.write_bi_cabac(value, c_length, ctx_idx),
            BinCoding::TruncatedUnary { c_max } => self.write_tu_cabac(value, c_max, ctx_idx),
            BinCoding::ExpGolomb => self.write_eg_cabac(value, ctx_idx),
            BinCoding::TruncatedExpGolomb { c_max_teg } => {
                self.write_teg_cabac(value, c_max_teg, ctx_idx)
            }
            BinCoding::SplitUnitwise {
                output_symbol_size,
                split_unit_size,
            } => self.write_sutu_cabac(value, output_symbol_size, split_unit_size, ctx_idx),
            BinCoding::DoubleTruncatedUnary {
                output_symbol_size,
                split_unit_size,
                c_max_dtu,
            } => self.write_dtu_cabac(value, output_symbol_size, split_unit_size, c_max_dtu, ctx_idx),
        }
    }

    /// Terminates the arithmetic stream and returns the coded payload.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.encoder.into_bytes()
    }

    fn write_bi_bypass(&mut self, value: u64, c_length: u8) {
        debug_assert!(c_length == 32 || value < 1u64 << c_length);
        self.encoder.encode_bins_ep(value as u32, c_length);
    }

    fn write_bi_cabac(&mut self, value: u64, c_length: u8, ctx_idx: usize) {
        let mut ctx = ctx_idx;
        for i in (0..c_length).rev() {
            let bin = ((value >> i) & 1) as u8;
            self.encoder.encode_bin(bin, &mut self.contexts[ctx]);
            ctx += 1;
        }
    }

    fn write_tu_bypass(&mut self, value: u64, c_max: u32) {
        debug_assert!(value <= c_max as u64);
        for _ in 0..value {
            self.encoder.encode_bin_ep(1);
        }
        if (c_max as u64) > value {
            self.encoder.encode_bin_ep(0);
        }
    }

    fn write_tu_cabac(&mut self, value: u64, c_max: u32, ctx_idx: usize) {
        debug_assert!(value <= c_max as u64);
        let mut ctx = ctx_idx;
        for _ in 0..value {
            self.encoder.encode_bin(1, &mut self.contexts[ctx]);
            ctx += 1;
        }
        if (c_max as u64) > value {
            self.encoder.encode_bin(0, &mut self.contexts[ctx]);
        }
    }

    fn write_eg_bypass(&mut self, value: u64) {
        debug_assert!(value < u32::MAX as u64);
        let value_plus1 = (value + 1) as u32;
        let num_lead_zeros = (31 - value_plus1.leading_zeros()) as u8;

        // unary prefix
        self.write_bi_bypass(1, num_lead_zeros + 1);
        if num_lead_zeros > 0 {
            // suffix: value + 1 without its leading one bit
            self.write_bi_bypass(
                (value_plus1 & ((1 << num_lead_zeros) - 1)) as u64,
                num_lead_zeros,
            );
        }
    }

    fn write_eg_cabac(&mut self, value: u64, ctx_idx: usize) {
        debug_assert!(value < u32::MAX as u64);
        let value_plus1 = (value + 1) as u32;
        let num_lead_zeros = (31 - value_plus1.leading_zeros()) as u8;

        self.write_bi_cabac(1, num_lead_zeros + 1, ctx_idx);
        if num_lead_zeros > 0 {
            self.write_bi_bypass(
                (value_plus1 & ((1 << num_lead_zeros) - 1)) as u64,
                num_lead_zeros,
            );
        }
    }

    fn write_teg_bypass(&mut self, value: u64, c_max_teg: u32) {
        self.write_tu_bypass(value.min(c_max_teg as u64), c_max_teg);
        if value >= c_max_teg as u64 {
            self.write_eg_bypass(value - c_max_teg as u64);
        }
    }

    fn write_teg_cabac(&mut self, value: u64, c_max_teg: u32, ctx_idx: usize) {
        self.write_tu_cabac(value.min(c_max_teg as u64), c_max_teg, ctx_idx);
        if value >= c_max_teg as u64 {
            self.write_eg_cabac(value - c_max_teg as u64, ctx_idx + c_max_teg as usize);
        }
    }

    fn write_sutu_bypass(&mut self, value: u64, output_symbol_size: u8, split_unit_size: u8) {
        let mut i = 0;
        let mut j = output_symbol_size;
        while i < output_symbol_size {
            let unit_size = if i == 0 && output_symbol_size % split_unit_size != 0 {
                output_symbol_size % split_unit_size
            } else {
                split_unit_size
            };
            let unit_max = ((1u64 << unit_size) - 1) as u32;
            j -= unit_size;
            let unit_value = (value >> j) & unit_max as u64;

            self.write_tu_bypass(unit_value, unit_max);
            i += split_unit_size;
        }
    }

    fn write_sutu_cabac(
        &mut self,
        value: u64,
        output_symbol_size: u8,
        split_unit_size: u8,
        ctx_idx: usize,
    ) {
        let mut ctx = ctx_idx;
        let mut i = 0;
        let mut j = output_symbol_size;
        while i < output_symbol_size {
            let unit_size = if i == 0 && output_symbol_size % split_unit_size != 0 {
                output_symbol_size % split_unit_size
            } else {
                split_unit_size
            };
            let unit_max = ((1u64 << unit_size) - 1) as u32;
            j -= unit_size;
            let unit_value = (value >> j) & unit_max as u64;

            self.write_tu_cabac(unit_value, unit_max, ctx);
            ctx += unit_max as usize;
            i += split_unit_size;
        }
    }

    fn write_dtu_bypass(
        &mut self,
        value: u64,
        output_symbol_size: u8,
        split_unit_size: u8,
        c_max_dtu: u32,
    ) {
        self.write_tu_bypass(value.min(c_max_dtu as u64), c_max_dtu);
        if value >= c_max_dtu as u64 {
            self.write_sutu_bypass(value - c_max_dtu as u64, output_symbol_size, split_unit_size);
        }
    }

    fn write_dtu_cabac(
        &mut self,
        value: u64,
        output_symbol_size: u8,
        split_unit_size: u8,
        c_max_dtu: u32,
        ctx_idx: usize,
    ) {
        self.write_tu_cabac(value.min(c_max_dtu as u64), c_max_dtu, ctx_idx);
        if value >= c_max_dtu as u64 {
            self.write_sutu_cabac(
                value - c_max_dtu as u64,
                output_symbol_size,
                split_unit_size,
                ctx_idx + c_max_dtu as usize,
            );
        }
    }
}
