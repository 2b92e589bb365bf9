//! Encoding configuration: binarization, context selection, transform
//! chain.
//!
//! A configuration is immutable per stream and must be byte-identical
//! on the encoding and the decoding side; there is no in-band signaling
//! and no resynchronization. All parameter validation happens here, at
//! construction time; the coding hot paths assume a valid
//! configuration.

use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::context_selector::StateVars;
use crate::writer::BinCoding;

/// Hard upper bound on the context table size of one stream.
pub const MAX_NUM_CONTEXTS: u64 = 1 << 24;

/// The binarization scheme of one coded stream, with its parameters.
///
/// Signed schemes fold the sign-extended symbol through the
/// `0, -1, 1, -2, 2, ...` mapping and code the folded value with the
/// corresponding unsigned scheme.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id")]
pub enum Binarization {
    /// Fixed-width binary, MSB first; the width is the coding subsymbol
    /// size.
    #[serde(rename = "BI")]
    Binary,
    /// Truncated unary: `v` one-bins, then a zero-bin unless
    /// `v == c_max`.
    #[serde(rename = "TU")]
    TruncatedUnary { c_max: u32 },
    /// Exponential Golomb.
    #[serde(rename = "EG")]
    ExponentialGolomb,
    /// Sign-folded exponential Golomb.
    #[serde(rename = "SEG")]
    SignedExponentialGolomb,
    /// Truncated unary up to `c_max_teg`, exponential Golomb above it.
    #[serde(rename = "TEG")]
    TruncatedExpGolomb { c_max_teg: u32 },
    /// Sign-folded truncated exponential Golomb.
    #[serde(rename = "STEG")]
    SignedTruncatedExpGolomb { c_max_teg: u32 },
    /// The symbol split into `split_unit_size`-bit units, each coded
    /// with truncated unary against the unit maximum.
    #[serde(rename = "SUTU")]
    SplitUnitwiseTruncatedUnary { split_unit_size: u8 },
    /// Sign-folded split-unitwise truncated unary.
    #[serde(rename = "SSUTU")]
    SignedSplitUnitwiseTruncatedUnary { split_unit_size: u8 },
    /// Truncated unary up to `c_max_dtu`, split-unitwise truncated
    /// unary for the remainder.
    #[serde(rename = "DTU")]
    DoubleTruncatedUnary { split_unit_size: u8, c_max_dtu: u32 },
    /// Sign-folded double truncated unary.
    #[serde(rename = "SDTU")]
    SignedDoubleTruncatedUnary { split_unit_size: u8, c_max_dtu: u32 },
}

impl Binarization {
    /// Whether the scheme codes sign-folded values.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            Binarization::SignedExponentialGolomb
                | Binarization::SignedTruncatedExpGolomb { .. }
                | Binarization::SignedSplitUnitwiseTruncatedUnary { .. }
                | Binarization::SignedDoubleTruncatedUnary { .. }
        )
    }

    fn split_unit_size(&self) -> Option<u8> {
        match *self {
            Binarization::SplitUnitwiseTruncatedUnary { split_unit_size }
            | Binarization::SignedSplitUnitwiseTruncatedUnary { split_unit_size }
            | Binarization::DoubleTruncatedUnary {
                split_unit_size, ..
            }
            | Binarization::SignedDoubleTruncatedUnary {
                split_unit_size, ..
            } => Some(split_unit_size),
            _ => None,
        }
    }
}

/// Context selection of one coded stream: bypass, or adaptive with
/// coding order 0, 1 or 2.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ContextSelection {
    Bypass,
    AdaptiveOrder0,
    AdaptiveOrder1,
    AdaptiveOrder2,
}

impl ContextSelection {
    #[must_use]
    pub fn is_bypass(&self) -> bool {
        *self == ContextSelection::Bypass
    }

    /// The number of previous subsymbols feeding context selection.
    #[must_use]
    pub fn coding_order(&self) -> u8 {
        match self {
            ContextSelection::Bypass | ContextSelection::AdaptiveOrder0 => 0,
            ContextSelection::AdaptiveOrder1 => 1,
            ContextSelection::AdaptiveOrder2 => 2,
        }
    }
}

/// The sequence transform applied to the input block before entropy
/// coding. Each transform is lossless and produces a fixed number of
/// output streams, each entropy-coded with its own
/// [`StreamConfiguration`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id")]
pub enum SequenceTransform {
    /// Pass the input through as a single stream.
    None,
    /// Split into deduplicated values and equality flags.
    Equality,
    /// Split into deduplicated values and guard-chained run length
    /// tokens.
    Rle { guard: u64 },
}

impl SequenceTransform {
    /// The number of streams this transform produces.
    #[must_use]
    pub fn num_streams(&self) -> usize {
        match self {
            SequenceTransform::None => 1,
            SequenceTransform::Equality | SequenceTransform::Rle { .. } => 2,
        }
    }

    /// Word sizes of the transformed streams, given the input word
    /// size. Flag and length streams are single-byte.
    #[must_use]
    pub fn stream_word_sizes(&self, word_size: u8) -> Vec<u8> {
        match self {
            SequenceTransform::None => vec![word_size],
            SequenceTransform::Equality | SequenceTransform::Rle { .. } => vec![word_size, 1],
        }
    }
}

/// Entropy coding parameters of one transformed stream.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StreamConfiguration {
    /// Replace each symbol by its difference to the previous one
    /// (wrapping in the stream word size) before binarization.
    pub diff_coding: bool,
    /// Symbol width in bits. Symbols must fit this width.
    pub output_symbol_size: u8,
    /// Width of the context modeling subsymbols; divides
    /// `output_symbol_size`.
    pub coding_subsym_size: u8,
    pub binarization: Binarization,
    pub context_selection: ContextSelection,
    /// Packed 7-bit initial context states, one per context model. All
    /// contexts start in the neutral state when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_init: Option<Vec<u8>>,
}

impl StreamConfiguration {
    /// Creates a configuration coding whole words of `word_size` bytes
    /// as single subsymbols, without diff coding.
    ///
    /// # Examples
    /// ```
    /// use gabac::config::{Binarization, ContextSelection, StreamConfiguration};
    ///
    /// let conf = StreamConfiguration::for_word_size(
    ///     1,
    ///     Binarization::Binary,
    ///     ContextSelection::Bypass,
    /// );
    /// assert_eq!(conf.output_symbol_size, 8);
    /// assert_eq!(conf.coding_subsym_size, 8);
    /// ```
    #[must_use]
    pub fn for_word_size(
        word_size: u8,
        binarization: Binarization,
        context_selection: ContextSelection,
    ) -> Self {
        Self {
            diff_coding: false,
            output_symbol_size: word_size * 8,
            coding_subsym_size: (word_size * 8).min(32),
            binarization,
            context_selection,
            context_init: None,
        }
    }

    /// Validates this stream configuration against the word size of
    /// the stream it codes.
    pub fn validate(&self, stream_word_size: u8) -> ConfigResult<()> {
        if self.output_symbol_size == 0 || self.output_symbol_size > stream_word_size * 8 {
            return Err(ConfigurationError::InvalidSymbolSize(
                self.output_symbol_size,
                stream_word_size,
            ));
        }
        if self.coding_subsym_size == 0
            || self.coding_subsym_size > 32
            || self.output_symbol_size % self.coding_subsym_size != 0
        {
            return Err(ConfigurationError::InvalidSubsymbolSize(
                self.coding_subsym_size,
                self.output_symbol_size,
            ));
        }

        match self.binarization {
            Binarization::TruncatedUnary { c_max } => {
                if c_max == 0 {
                    return Err(ConfigurationError::InvalidBinarizationParameter(
                        "TU requires c_max >= 1",
                    ));
                }
            }
            Binarization::TruncatedExpGolomb { c_max_teg }
            | Binarization::SignedTruncatedExpGolomb { c_max_teg } => {
                if c_max_teg == 0 || c_max_teg > 255 {
                    return Err(ConfigurationError::InvalidBinarizationParameter(
                        "TEG requires c_max_teg in [1, 255]",
                    ));
                }
            }
            Binarization::DoubleTruncatedUnary { c_max_dtu, .. }
            | Binarization::SignedDoubleTruncatedUnary { c_max_dtu, .. } => {
                if c_max_dtu == 0 {
                    return Err(ConfigurationError::InvalidBinarizationParameter(
                        "DTU requires c_max_dtu >= 1",
                    ));
                }
            }
            _ => {}
        }

        if let Some(split_unit_size) = self.binarization.split_unit_size() {
            if split_unit_size == 0 || split_unit_size > self.coding_subsym_size {
                return Err(ConfigurationError::InvalidBinarizationParameter(
                    "split_unit_size must be in [1, coding_subsym_size]",
                ));
            }
            if self.coding_subsym_size != self.output_symbol_size {
                return Err(ConfigurationError::InvalidBinarizationParameter(
                    "split-unitwise schemes require coding_subsym_size == output_symbol_size",
                ));
            }
        }

        let state_vars = StateVars::new(self);
        if state_vars.num_ctx_total > MAX_NUM_CONTEXTS {
            return Err(ConfigurationError::ContextTableTooLarge(
                state_vars.num_ctx_total,
            ));
        }

        if let Some(init) = &self.context_init {
            if init.len() as u64 != state_vars.num_ctx_total {
                return Err(ConfigurationError::InvalidContextInit(
                    state_vars.num_ctx_total,
                    init.len(),
                ));
            }
            if let Some(&value) = init.iter().find(|&&value| value > 127) {
                return Err(ConfigurationError::InvalidContextInitValue(value));
            }
        }

        Ok(())
    }

    pub(crate) fn bin_coding(&self) -> BinCoding {
        match self.binarization {
            Binarization::Binary => BinCoding::Binary {
                c_length: self.coding_subsym_size,
            },
            Binarization::TruncatedUnary { c_max } => BinCoding::TruncatedUnary { c_max },
            Binarization::ExponentialGolomb | Binarization::SignedExponentialGolomb => {
                BinCoding::ExpGolomb
            }
            Binarization::TruncatedExpGolomb { c_max_teg }
            | Binarization::SignedTruncatedExpGolomb { c_max_teg } => {
                BinCoding::TruncatedExpGolomb { c_max_teg }
            }
            Binarization::SplitUnitwiseTruncatedUnary { split_unit_size }
            | Binarization::SignedSplitUnitwiseTruncatedUnary { split_unit_size } => {
                BinCoding::SplitUnitwise {
                    output_symbol_size: self.output_symbol_size,
                    split_unit_size,
                }
            }
            Binarization::DoubleTruncatedUnary {
                split_unit_size,
                c_max_dtu,
            }
            | Binarization::SignedDoubleTruncatedUnary {
                split_unit_size,
                c_max_dtu,
            } => BinCoding::DoubleTruncatedUnary {
                output_symbol_size: self.output_symbol_size,
                split_unit_size,
                c_max_dtu,
            },
        }
    }
}

/// The complete, immutable description of how one symbol sequence is
/// coded: input word size, the sequence transform, and one
/// [`StreamConfiguration`] per transformed stream.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EncodingConfiguration {
    pub word_size: u8,
    pub transform: SequenceTransform,
    pub stream_configs: Vec<StreamConfiguration>,
}

impl EncodingConfiguration {
    /// Creates and validates a configuration.
    pub fn new(
        word_size: u8,
        transform: SequenceTransform,
        stream_configs: Vec<StreamConfiguration>,
    ) -> ConfigResult<Self> {
        let config = Self {
            word_size,
            transform,
            stream_configs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates every parameter. Deserialized configurations must be
    /// validated before use; the coding paths do not re-check.
    pub fn validate(&self) -> ConfigResult<()> {
        if !matches!(self.word_size, 1 | 2 | 4 | 8) {
            return Err(ConfigurationError::InvalidWordSize(self.word_size));
        }

        if let SequenceTransform::Rle { guard } = self.transform {
            if guard == 0 || guard > 255 {
                return Err(ConfigurationError::InvalidGuard(guard));
            }
        }

        let word_sizes = self.transform.stream_word_sizes(self.word_size);
        if self.stream_configs.len() != word_sizes.len() {
            return Err(ConfigurationError::StreamCountMismatch(
                word_sizes.len(),
                self.stream_configs.len(),
            ));
        }

        for (stream_config, &stream_word_size) in self.stream_configs.iter().zip(&word_sizes) {
            stream_config.validate(stream_word_size)?;
        }

        Ok(())
    }

    /// Parses a configuration from its JSON representation and
    /// validates it.
    ///
    /// # Examples
    /// ```
    /// use gabac::config::EncodingConfiguration;
    ///
    /// let json = r#"{
    ///     "word_size": 1,
    ///     "transform": { "id": "Rle", "guard": 3 },
    ///     "stream_configs": [
    ///         {
    ///             "diff_coding": false,
    ///             "output_symbol_size": 8,
    ///             "coding_subsym_size": 8,
    ///             "binarization": { "id": "BI" },
    ///             "context_selection": "AdaptiveOrder1"
    ///         },
    ///         {
    ///             "diff_coding": false,
    ///             "output_symbol_size": 8,
    ///             "coding_subsym_size": 8,
    ///             "binarization": { "id": "TU", "c_max": 3 },
    ///             "context_selection": "AdaptiveOrder0"
    ///         }
    ///     ]
    /// }"#;
    /// let config = EncodingConfiguration::from_json(json).unwrap();
    /// assert_eq!(config.word_size, 1);
    /// ```
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("configuration is always serializable")
    }
}

/// Error raised for an invalid [`EncodingConfiguration`].
#[derive(Debug)]
pub enum ConfigurationError {
    /// Word size is not 1, 2, 4 or 8 bytes.
    InvalidWordSize(u8),
    /// Symbol size in bits is zero or exceeds the stream word size.
    InvalidSymbolSize(u8, u8),
    /// Subsymbol size is zero, above 32, or does not divide the symbol
    /// size.
    InvalidSubsymbolSize(u8, u8),
    /// A binarization parameter is outside its domain.
    InvalidBinarizationParameter(&'static str),
    /// The RLE guard is outside `[1, 255]`.
    InvalidGuard(u64),
    /// The number of stream configurations does not match the
    /// transform.
    StreamCountMismatch(usize, usize),
    /// The derived context table would exceed [`MAX_NUM_CONTEXTS`].
    ContextTableTooLarge(u64),
    /// The context initialization vector has the wrong length.
    InvalidContextInit(u64, usize),
    /// A context initialization value exceeds 7 bits.
    InvalidContextInitValue(u8),
    /// The JSON representation could not be parsed.
    InvalidJson(serde_json::Error),
}

impl From<serde_json::Error> for ConfigurationError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidJson(e)
    }
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::InvalidWordSize(word_size) => {
                write!(f, "Invalid word size: {}", word_size)
            }
            ConfigurationError::InvalidSymbolSize(symbol_size, word_size) => write!(
                f,
                "Invalid output symbol size {} for a {}-byte stream",
                symbol_size, word_size
            ),
            ConfigurationError::InvalidSubsymbolSize(subsym_size, symbol_size) => write!(
                f,
                "Invalid coding subsymbol size {} for symbol size {}",
                subsym_size, symbol_size
            ),
            ConfigurationError::InvalidBinarizationParameter(msg) => {
                write!(f, "Invalid binarization parameter: {}", msg)
            }
            ConfigurationError::InvalidGuard(guard) => {
                write!(f, "Invalid RLE guard: {} (expected 1..=255)", guard)
            }
            ConfigurationError::StreamCountMismatch(expected, actual) => write!(
                f,
                "Transform produces {} streams, but {} stream configurations given",
                expected, actual
            ),
            ConfigurationError::ContextTableTooLarge(num) => {
                write!(f, "Context table too large: {} models", num)
            }
            ConfigurationError::InvalidContextInit(expected, actual) => write!(
                f,
                "Context initialization vector has {} entries, expected {}",
                actual, expected
            ),
            ConfigurationError::InvalidContextInitValue(value) => {
                write!(f, "Context initialization value out of range: {}", value)
            }
            ConfigurationError::InvalidJson(e) => write!(f, "JSON parsing error: {}", e),
        }
    }
}

impl Error for ConfigurationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigurationError::InvalidJson(e) => Some(e),
            _ => None,
        }
    }
}

/// The result of validating or parsing a configuration.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

#[cfg(test)]
mod tests {
    use crate::config::{
        Binarization, ConfigurationError, ContextSelection, EncodingConfiguration,
        SequenceTransform, StreamConfiguration,
    };

    fn simple_config(binarization: Binarization) -> EncodingConfiguration {
        EncodingConfiguration {
            word_size: 1,
            transform: SequenceTransform::None,
            stream_configs: vec![StreamConfiguration::for_word_size(
                1,
                binarization,
                ContextSelection::AdaptiveOrder0,
            )],
        }
    }

    #[test]
    fn should_accept_a_simple_configuration() {
        assert!(simple_config(Binarization::Binary).validate().is_ok());
    }

    #[test]
    fn should_reject_invalid_word_size() {
        let mut config = simple_config(Binarization::Binary);
        config.word_size = 3;

        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidWordSize(3))
        ));
    }

    #[test]
    fn should_reject_zero_rle_guard() {
        let config = EncodingConfiguration {
            word_size: 1,
            transform: SequenceTransform::Rle { guard: 0 },
            stream_configs: vec![
                StreamConfiguration::for_word_size(
                    1,
                    Binarization::Binary,
                    ContextSelection::Bypass,
                ),
                StreamConfiguration::for_word_size(
                    1,
                    Binarization::Binary,
                    ContextSelection::Bypass,
                ),
            ],
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidGuard(0))
        ));
    }

    #[test]
    fn should_reject_wrong_stream_count() {
        let config = EncodingConfiguration {
            word_size: 1,
            transform: SequenceTransform::Rle { guard: 3 },
            stream_configs: vec![StreamConfiguration::for_word_size(
                1,
                Binarization::Binary,
                ContextSelection::Bypass,
            )],
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::StreamCountMismatch(2, 1))
        ));
    }

    #[test]
    fn should_reject_zero_tu_c_max() {
        let config = simple_config(Binarization::TruncatedUnary { c_max: 0 });

        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidBinarizationParameter(_))
        ));
    }

    #[test]
    fn should_reject_subsymbol_size_not_dividing_symbol_size() {
        let mut config = simple_config(Binarization::Binary);
        config.stream_configs[0].coding_subsym_size = 3;

        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidSubsymbolSize(3, 8))
        ));
    }

    #[test]
    fn should_reject_oversized_context_table() {
        let mut config = simple_config(Binarization::TruncatedUnary { c_max: 255 });
        config.word_size = 4;
        config.stream_configs[0].output_symbol_size = 32;
        config.stream_configs[0].coding_subsym_size = 32;
        config.stream_configs[0].context_selection = ContextSelection::AdaptiveOrder2;

        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::ContextTableTooLarge(_))
        ));
    }

    #[test]
    fn should_reject_wrong_context_init_length() {
        let mut config = simple_config(Binarization::TruncatedUnary { c_max: 4 });
        config.stream_configs[0].context_init = Some(vec![0; 3]);

        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidContextInit(4, 3))
        ));
    }

    #[test]
    fn should_reject_context_init_value_above_7_bits() {
        let mut config = simple_config(Binarization::TruncatedUnary { c_max: 4 });
        config.stream_configs[0].context_init = Some(vec![0, 0, 128, 0]);

        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidContextInitValue(128))
        ));
    }

    #[test]
    fn should_reject_split_unit_schemes_with_subsymbol_split() {
        let mut config = simple_config(Binarization::SplitUnitwiseTruncatedUnary {
            split_unit_size: 2,
        });
        config.word_size = 2;
        config.stream_configs[0].output_symbol_size = 16;
        config.stream_configs[0].coding_subsym_size = 8;

        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidBinarizationParameter(_))
        ));
    }

    #[test]
    fn should_round_trip_through_json() {
        let config = EncodingConfiguration {
            word_size: 2,
            transform: SequenceTransform::Rle { guard: 7 },
            stream_configs: vec![
                StreamConfiguration {
                    diff_coding: true,
                    output_symbol_size: 16,
                    coding_subsym_size: 8,
                    binarization: Binarization::SignedExponentialGolomb,
                    context_selection: ContextSelection::AdaptiveOrder1,
                    context_init: None,
                },
                StreamConfiguration::for_word_size(
                    1,
                    Binarization::TruncatedUnary { c_max: 7 },
                    ContextSelection::AdaptiveOrder0,
                ),
            ],
        };

        let json = config.to_json();
        let parsed = EncodingConfiguration::from_json(&json).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn from_json_validates_the_parsed_configuration() {
        let json = r#"{
            "word_size": 3,
            "transform": { "id": "None" },
            "stream_configs": [{
                "diff_coding": false,
                "output_symbol_size": 8,
                "coding_subsym_size": 8,
                "binarization": { "id": "BI" },
                "context_selection": "Bypass"
            }]
        }"#;

        assert!(matches!(
            EncodingConfiguration::from_json(json),
            Err(ConfigurationError::InvalidWordSize(3))
        ));
    }
}
