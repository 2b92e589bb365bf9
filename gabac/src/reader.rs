//! Binarization decode layer; the exact mirror of [`crate::writer`].

use crate::binary_arithmetic::BinaryArithmeticDecoder;
use crate::context_model::ContextTable;
use crate::writer::BinCoding;

#[derive(Debug)]
pub(crate) struct Reader<'a> {
    decoder: BinaryArithmeticDecoder<'a>,
    contexts: ContextTable,
}

impl<'a> Reader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8], num_contexts: usize, context_init: Option<&[u8]>) -> Self {
        Self {
            decoder: BinaryArithmeticDecoder::new(data),
            contexts: ContextTable::new(num_contexts, context_init),
        }
    }

    /// Reads one value through the bypass path.
    #[must_use]
    pub fn read_symbol_bypass(&mut self, coding: &BinCoding) -> u64 {
        match *coding {
            BinCoding::Binary { c_length } => self.read_bi_bypass(c_length),
            BinCoding::TruncatedUnary { c_max } => self.read_tu_bypass(c_max),
            BinCoding::ExpGolomb => self.read_eg_bypass(),
            BinCoding::TruncatedExpGolomb { c_max_teg } => self.read_teg_bypass(c_max_teg),
            BinCoding::SplitUnitwise {
                output_symbol_size,
                split_unit_size,
            } => self.read_sutu_bypass(output_symbol_size, split_unit_size),
            BinCoding::DoubleTruncatedUnary {
                output_symbol_size,
                split_unit_size,
                c_max_dtu,
            } => self.read_dtu_bypass(output_symbol_size, split_unit_size, c_max_dtu),
        }
    }

    /// Reads one value through context models starting at `ctx_idx`.
    #[must_use]
    pub fn read_symbol(&mut self, coding: &BinCoding, ctx_idx: usize) -> u64 {
        match *coding {
            BinCoding::Binary { c_length } => self.read_bi_cabac(c_length, ctx_idx),
            BinCoding::TruncatedUnary { c_max } => self.read_tu_cabac(c_max, ctx_idx),
            BinCoding::ExpGolomb => self.read_eg_cabac(ctx_idx),
            BinCoding::TruncatedExpGolomb { c_max_teg } => self.read_teg_cabac(c_max_teg, ctx_idx),
            BinCoding::SplitUnitwise {
                output_symbol_size,
                split_unit_size,
            } => self.read_sutu_cabac(output_symbol_size, split_unit_size, ctx_idx),
            BinCoding::DoubleTruncatedUnary {
                output_symbol_size,
                split_unit_size,
                c_max_dtu,
            } => self.read_dtu_cabac(output_symbol_size, split_unit_size, c_max_dtu, ctx_idx),
        }
    }

    /// Consumes the terminating bin and reports the number of payload
    /// bytes read.
    pub fn close(mut self) -> usize {
        self.decoder.close()
    }

    fn read_bi_bypass(&mut self, c_length: u8) -> u64 {
        self.decoder.decode_bins_ep(c_length) as u64
    }

    fn read_bi_cabac(&mut self, c_length: u8, ctx_idx: usize) -> u64 {
        let mut bins: u64 = 0;
        let mut ctx = ctx_idx;
        for _ in 0..c_length {
            bins = (bins << 1) | self.decoder.decode_bin(&mut self.contexts[ctx]) as u64;
            ctx += 1;
        }
        bins
    }

    fn read_tu_bypass(&mut self, c_max: u32) -> u64 {
        let mut value: u64 = 0;
        while value < c_max as u64 {
            if self.decoder.decode_bin_ep() == 0 {
                break;
            }
            value += 1;
        }
        value
    }

    fn read_tu_cabac(&mut self, c_max: u32, ctx_idx: usize) -> u64 {
        let mut value: u64 = 0;
        let mut ctx = ctx_idx;
        while value < c_max as u64 {
            if self.decoder.decode_bin(&mut self.contexts[ctx]) == 0 {
                break;
            }
            value += 1;
            ctx += 1;
        }
        value
    }

    fn read_eg_bypass(&mut self) -> u64 {
        let mut num_lead_zeros: u8 = 0;
        // a malformed payload could otherwise produce an endless prefix
        while num_lead_zeros < 32 && self.decoder.decode_bins_ep(1) == 0 {
            num_lead_zeros += 1;
        }

        if num_lead_zeros == 0 {
            return 0;
        }
        let bins = (1u64 << num_lead_zeros) | self.decoder.decode_bins_ep(num_lead_zeros) as u64;
        bins - 1
    }

    fn read_eg_cabac(&mut self, ctx_idx: usize) -> u64 {
        let mut num_lead_zeros: u8 = 0;
        let mut ctx = ctx_idx;
        while num_lead_zeros < 32 && self.decoder.decode_bin(&mut self.contexts[ctx]) == 0 {
            num_lead_zeros += 1;
            ctx += 1;
        }

        if num_lead_zeros == 0 {
            return 0;
        }
        let bins = (1u64 << num_lead_zeros) | self.decoder.decode_bins_ep(num_lead_zeros) as u64;
        bins - 1
    }

    fn read_teg_bypass(&mut self, c_max_teg: u32) -> u64 {
        let mut value = self.read_tu_bypass(c_max_teg);
        if value == c_max_teg as u64 {
            value += self.read_eg_bypass();
        }
        value
    }

    fn read_teg_cabac(&mut self, c_max_teg: u32, ctx_idx: usize) -> u64 {
        let mut value = self.read_tu_cabac(c_max_teg, ctx_idx);
        if value == c_max_teg as u64 {
            value += self.read_eg_cabac(ctx_idx + c_max_teg as usize);
        }
        value
    }

    fn read_sutu_bypass(&mut self, output_symbol_size: u8, split_unit_size: u8) -> u64 {
        let mut value: u64 = 0;
        let mut i = 0;
        while i < output_symbol_size {
            let unit_size = if i == 0 && output_symbol_size % split_unit_size != 0 {
                output_symbol_size % split_unit_size
            } else {
                split_unit_size
            };
            let unit_max = ((1u64 << unit_size) - 1) as u32;
            let unit_value = self.read_tu_bypass(unit_max);

            value = (value << split_unit_size) | unit_value;
            i += split_unit_size;
        }
        value
    }

    fn read_sutu_cabac(
        &mut self,
        output_symbol_size: u8,
        split_unit_size: u8,
        ctx_idx: usize,
    ) -> u64 {
        let mut value: u64 = 0;
        let mut ctx = ctx_idx;
        let mut i = 0;
        while i < output_symbol_size {
            let unit_size = if i == 0 && output_symbol_size % split_unit_size != 0 {
                output_symbol_size % split_unit_size
            } else {
                split_unit_size
            };
            let unit_max = ((1u64 << unit_size) - 1) as u32;
            let unit_value = self.read_tu_cabac(unit_max, ctx);
            ctx += unit_max as usize;

            value = (value << split_unit_size) | unit_value;
            i += split_unit_size;
        }
        value
    }

    fn read_dtu_bypass(
        &mut self,
        output_symbol_size: u8,
        split_unit_size: u8,
        c_max_dtu: u32,
    ) -> u64 {
        let mut value = self.read_tu_bypass(c_max_dtu);
        if value >= c_max_dtu as u64 {
            value += self.read_sutu_bypass(output_symbol_size, split_unit_size);
        }
        value
    }

    fn read_dtu_cabac(
        &mut self,
        output_symbol_size: u8,
        split_unit_size: u8,
        c_max_dtu: u32,
        ctx_idx: usize,
    ) -> u64 {
        let mut value = self.read_tu_cabac(c_max_dtu, ctx_idx);
        if value >= c_max_dtu as u64 {
            value += self.read_sutu_cabac(
                output_symbol_size,
                split_unit_size,
                ctx_idx + c_max_dtu as usize,
            );
        }
        value
    }
}
