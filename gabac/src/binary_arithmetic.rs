//! Binary arithmetic range coder (M-coder).
//!
//! Ported from the CABAC coder used by the MPEG-G reference entropy
//! stage: `low`/`range` arithmetic with lazy carry propagation through
//! buffered `0xFF` bytes on the encoder, and a byte-wise look-ahead
//! window on the decoder. The decoder assumes a well-formed payload;
//! corrupted input decodes to wrong symbols but never reads out of
//! bounds.

use crate::bit_stream::{BitInputStream, BitOutputStream};
use crate::context_model::ContextModel;
use crate::tables::{LPS_RANGE, RENORM_SHIFT};

const RANGE_AT_START: u32 = 510;
const BITS_LEFT_AT_START: i32 = 23;

#[derive(Debug)]
pub(crate) struct BinaryArithmeticEncoder {
    bit_stream: BitOutputStream,
    low: u64,
    range: u32,
    buffered_byte: u32,
    num_buffered_bytes: u32,
    bits_left: i32,
}

impl BinaryArithmeticEncoder {
    #[must_use]
    pub fn new() -> Self {
        let mut encoder = Self {
            bit_stream: BitOutputStream::new(),
            low: 0,
            range: 0,
            buffered_byte: 0,
            num_buffered_bytes: 0,
            bits_left: 0,
        };
        encoder.start();
        encoder
    }

    fn start(&mut self) {
        self.low = 0;
        self.range = RANGE_AT_START;
        self.buffered_byte = 0xFF;
        self.num_buffered_bytes = 0;
        self.bits_left = BITS_LEFT_AT_START;
    }

    /// Encodes one context-coded bin.
    pub fn encode_bin(&mut self, bin: u8, context_model: &mut ContextModel) {
        debug_assert!(bin <= 1);

        let lps = LPS_RANGE[context_model.state() as usize][((self.range >> 6) & 3) as usize] as u32;
        self.range -= lps;

        if bin != context_model.mps() {
            let num_bits = RENORM_SHIFT[(lps >> 3) as usize] as i32;
            self.low = (self.low + self.range as u64) << num_bits;
            self.range = lps << num_bits;
            if context_model.state() == 0 {
                context_model.toggle_mps();
            }
            context_model.update_lps();
            self.bits_left -= num_bits;
        } else {
            context_model.update_mps();
            if self.range >= 256 {
                return;
            }
            self.low <<= 1;
            self.range <<= 1;
            self.bits_left -= 1;
        }

        debug_assert!((256..0x10000).contains(&self.range));
        self.test_and_write_out();
    }

    /// Encodes one bypass bin (fixed 1/2 probability).
    pub fn encode_bin_ep(&mut self, bin: u8) {
        debug_assert!(bin <= 1);

        self.low <<= 1;
        if bin != 0 {
            self.low += self.range as u64;
        }
        self.bits_left -= 1;
        self.test_and_write_out();
    }

    /// Encodes `num_bins` bypass bins taken from `bins`, most
    /// significant bin first.
    pub fn encode_bins_ep(&mut self, bins: u32, num_bins: u8) {
        debug_assert!(num_bins <= 32);
        debug_assert!(num_bins == 32 || (bins as u64) < (1u64 << num_bins));

        let mut bins = bins;
        let mut num_bins = num_bins as i32;
        while num_bins > 8 {
            num_bins -= 8;
            let pattern = bins >> num_bins;
            self.low <<= 8;
            self.low += self.range as u64 * pattern as u64;
            bins -= pattern << num_bins;
            self.bits_left -= 8;
            self.test_and_write_out();
        }

        self.low <<= num_bins;
        self.low += self.range as u64 * bins as u64;
        self.bits_left -= num_bins;
        self.test_and_write_out();
    }

    /// Encodes the reserved terminate bin. A terminate bin of 1 forces
    /// the deterministic renormalization path used to end the stream.
    pub fn encode_bin_trm(&mut self, bin: u8) {
        self.range -= 2;
        if bin != 0 {
            self.low += self.range as u64;
            self.low <<= 7;
            self.range = 2 << 7;
            self.bits_left -= 7;
        } else if self.range >= 256 {
            return;
        } else {
            self.low <<= 1;
            self.range <<= 1;
            self.bits_left -= 1;
        }
        self.test_and_write_out();
    }

    /// Terminates the stream: codes a terminate bin of 1, resolves all
    /// pending carries, writes the stop bit and zero-aligns the output.
    pub fn flush(&mut self) {
        self.encode_bin_trm(1);
        self.finish();
        self.bit_stream.write(1, 1);
        self.bit_stream.align_to_byte();
        self.start();
    }

    /// Consumes the encoder, returning the coded payload. Implies a
    /// [`Self::flush`].
    #[must_use]
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.flush();
        self.bit_stream.into_bytes()
    }

    fn finish(&mut self) {
        if (self.low >> (32 - self.bits_left)) != 0 {
            self.bit_stream.write_byte((self.buffered_byte + 1) as u8);
            while self.num_buffered_bytes > 1 {
                self.bit_stream.write_byte(0x00);
                self.num_buffered_bytes -= 1;
            }
            self.low -= 1u64 << (32 - self.bits_left);
        } else {
            if self.num_buffered_bytes > 0 {
                self.bit_stream.write_byte(self.buffered_byte as u8);
            }
            while self.num_buffered_bytes > 1 {
                self.bit_stream.write_byte(0xFF);
                self.num_buffered_bytes -= 1;
            }
        }
        self.bit_stream
            .write(self.low >> 8, (24 - self.bits_left) as u8);
    }

    #[inline]
    fn test_and_write_out(&mut self) {
        if self.bits_left < 12 {
            self.write_out();
        }
    }

    fn write_out(&mut self) {
        let lead_byte = (self.low >> (24 - self.bits_left)) as u32;
        self.bits_left += 8;
        self.low &= u64::from(u32::MAX) >> self.bits_left;

        if lead_byte == 0xFF {
            self.num_buffered_bytes += 1;
        } else if self.num_buffered_bytes > 0 {
            // resolve the carry through the run of buffered 0xFF bytes
            let carry = lead_byte >> 8;
            self.bit_stream
                .write_byte((self.buffered_byte + carry) as u8);
            let settled = ((0xFF + carry) & 0xFF) as u8;
            while self.num_buffered_bytes > 1 {
                self.bit_stream.write_byte(settled);
                self.num_buffered_bytes -= 1;
            }
            self.buffered_byte = lead_byte & 0xFF;
        } else {
            self.num_buffered_bytes = 1;
            self.buffered_byte = lead_byte;
        }
    }
}

#[derive(Debug)]
pub(crate) struct BinaryArithmeticDecoder<'a> {
    bit_stream: BitInputStream<'a>,
    range: u32,
    value: u32,
    bits_needed: i32,
}

impl<'a> BinaryArithmeticDecoder<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        let mut bit_stream = BitInputStream::new(data);
        let value = ((bit_stream.read_byte() as u32) << 8) | bit_stream.read_byte() as u32;

        Self {
            bit_stream,
            range: RANGE_AT_START,
            value,
            bits_needed: -8,
        }
    }

    /// Decodes one context-coded bin.
    pub fn decode_bin(&mut self, context_model: &mut ContextModel) -> u8 {
        let lps = LPS_RANGE[context_model.state() as usize][((self.range >> 6) & 3) as usize] as u32;
        self.range -= lps;
        let scaled_range = self.range << 7;

        let bin;
        if self.value < scaled_range {
            bin = context_model.mps();
            context_model.update_mps();
            if scaled_range >= (256 << 7) {
                return bin;
            }
            self.range = scaled_range >> 6;
            self.value <<= 1;
            self.bits_needed += 1;
            if self.bits_needed == 0 {
                self.bits_needed = -8;
                self.value |= self.bit_stream.read_byte() as u32;
            }
        } else {
            let num_bits = RENORM_SHIFT[(lps >> 3) as usize] as i32;
            self.value = (self.value - scaled_range) << num_bits;
            self.range = lps << num_bits;
            bin = 1 - context_model.mps();
            if context_model.state() == 0 {
                context_model.toggle_mps();
            }
            context_model.update_lps();
            self.bits_needed += num_bits;
            if self.bits_needed >= 0 {
                self.value |= (self.bit_stream.read_byte() as u32) << self.bits_needed;
                self.bits_needed -= 8;
            }
        }

        debug_assert!((256..0x10000).contains(&self.range));
        bin
    }

    /// Decodes one bypass bin.
    pub fn decode_bin_ep(&mut self) -> u8 {
        self.value <<= 1;
        self.bits_needed += 1;
        if self.bits_needed >= 0 {
            self.bits_needed = -8;
            self.value |= self.bit_stream.read_byte() as u32;
        }

        let scaled_range = self.range << 7;
        if self.value >= scaled_range {
            self.value -= scaled_range;
            1
        } else {
            0
        }
    }

    /// Decodes `num_bins` bypass bins, most significant bin first.
    pub fn decode_bins_ep(&mut self, num_bins: u8) -> u32 {
        debug_assert!(num_bins <= 32);

        let mut bins: u32 = 0;
        let mut num_bins = num_bins as i32;

        while num_bins > 8 {
            self.value =
                (self.value << 8) | ((self.bit_stream.read_byte() as u32) << (8 + self.bits_needed));
            let mut scaled_range = self.range << 15;
            for _ in 0..8 {
                bins <<= 1;
                scaled_range >>= 1;
                if self.value >= scaled_range {
                    bins |= 1;
                    self.value -= scaled_range;
                }
            }
            num_bins -= 8;
        }

        self.bits_needed += num_bins;
        self.value <<= num_bins;
        if self.bits_needed >= 0 {
            self.value |= (self.bit_stream.read_byte() as u32) << self.bits_needed;
            self.bits_needed -= 8;
        }

        let mut scaled_range = self.range << (num_bins + 7);
        for _ in 0..num_bins {
            bins <<= 1;
            scaled_range >>= 1;
            if self.value >= scaled_range {
                bins |= 1;
                self.value -= scaled_range;
            }
        }

        bins
    }

    /// Decodes a terminate bin; 1 signals the end of the stream.
    pub fn decode_bin_trm(&mut self) -> u8 {
        self.range -= 2;
        let scaled_range = self.range << 7;

        if self.value >= scaled_range {
            1
        } else {
            if scaled_range < (256 << 7) {
                self.range = scaled_range >> 6;
                self.value <<= 1;
                self.bits_needed += 1;
                if self.bits_needed == 0 {
                    self.bits_needed = -8;
                    self.value |= self.bit_stream.read_byte() as u32;
                }
            }
            0
        }
    }

    /// Consumes the terminating bin and reports the number of payload
    /// bytes read.
    pub fn close(&mut self) -> usize {
        let terminated = self.decode_bin_trm();
        debug_assert_eq!(terminated, 1, "stream not terminated");
        self.bit_stream.bytes_read()
    }
}

#[cfg(test)]
mod tests {
    use crate::binary_arithmetic::{BinaryArithmeticDecoder, BinaryArithmeticEncoder};
    use crate::context_model::ContextTable;

    fn skewed_bins(len: usize) -> Vec<u8> {
        (0..len).map(|i| u8::from(i % 7 == 0)).collect()
    }

    #[test]
    fn should_round_trip_context_coded_bins() {
        let bins = skewed_bins(4000);

        let mut contexts = ContextTable::new(2, None);
        let mut encoder = BinaryArithmeticEncoder::new();
        for (i, &bin) in bins.iter().enumerate() {
            encoder.encode_bin(bin, &mut contexts[i % 2]);
        }
        let payload = encoder.into_bytes();

        let mut contexts = ContextTable::new(2, None);
        let mut decoder = BinaryArithmeticDecoder::new(&payload);
        let decoded: Vec<u8> = (0..bins.len())
            .map(|i| decoder.decode_bin(&mut contexts[i % 2]))
            .collect();
        decoder.close();

        assert_eq!(decoded, bins);
    }

    #[test]
    fn should_round_trip_bypass_bins() {
        let bins = skewed_bins(300);

        let mut encoder = BinaryArithmeticEncoder::new();
        for &bin in &bins {
            encoder.encode_bin_ep(bin);
        }
        let payload = encoder.into_bytes();

        let mut decoder = BinaryArithmeticDecoder::new(&payload);
        let decoded: Vec<u8> = (0..bins.len()).map(|_| decoder.decode_bin_ep()).collect();
        decoder.close();

        assert_eq!(decoded, bins);
    }

    #[test]
    fn should_round_trip_multi_bit_bypass_patterns() {
        let values: Vec<(u32, u8)> = vec![
            (0, 1),
            (1, 1),
            (0xAB, 8),
            (0x1234, 16),
            (0xFFFF_FFFF, 32),
            (0, 32),
            (0x0055_AA33, 24),
        ];

        let mut encoder = BinaryArithmeticEncoder::new();
        for &(value, bits) in &values {
            encoder.encode_bins_ep(value, bits);
        }
        let payload = encoder.into_bytes();

        let mut decoder = BinaryArithmeticDecoder::new(&payload);
        for &(value, bits) in &values {
            assert_eq!(decoder.decode_bins_ep(bits), value);
        }
        decoder.close();
    }

    #[test]
    fn terminate_bin_marks_the_end_of_stream() {
        let mut contexts = ContextTable::new(1, None);
        let mut encoder = BinaryArithmeticEncoder::new();
        for bin in [1, 1, 0, 1] {
            encoder.encode_bin(bin, &mut contexts[0]);
        }
        let payload = encoder.into_bytes();

        let mut contexts = ContextTable::new(1, None);
        let mut decoder = BinaryArithmeticDecoder::new(&payload);
        for expected in [1, 1, 0, 1] {
            assert_eq!(decoder.decode_bin(&mut contexts[0]), expected);
        }
        assert_eq!(decoder.decode_bin_trm(), 1);
    }

    #[test]
    fn should_resolve_carries_across_buffered_bytes() {
        // long runs of identical bypass bins exercise the 0xFF
        // buffering and carry path
        let mut encoder = BinaryArithmeticEncoder::new();
        for _ in 0..2000 {
            encoder.encode_bin_ep(1);
        }
        encoder.encode_bin_ep(0);
        let payload = encoder.into_bytes();

        let mut decoder = BinaryArithmeticDecoder::new(&payload);
        for _ in 0..2000 {
            assert_eq!(decoder.decode_bin_ep(), 1);
        }
        assert_eq!(decoder.decode_bin_ep(), 0);
        decoder.close();
    }

    #[test]
    fn empty_stream_still_terminates() {
        let encoder = BinaryArithmeticEncoder::new();
        let payload = encoder.into_bytes();
        assert!(!payload.is_empty());

        let mut decoder = BinaryArithmeticDecoder::new(&payload);
        assert_eq!(decoder.decode_bin_trm(), 1);
    }
}
