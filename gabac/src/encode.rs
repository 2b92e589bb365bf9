//! Encode drivers: per-stream entropy coding and the full
//! transform-chain orchestration.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;

use log::{debug, trace};

use crate::config::{ConfigurationError, EncodingConfiguration, SequenceTransform, StreamConfiguration};
use crate::context_selector::{ContextSelector, StateVars, Subsymbol};
use crate::data_block::DataBlock;
use crate::stream::write_stream;
use crate::transform::{transform_diff_coding, transform_equality_coding, transform_rle_coding};
use crate::writer::Writer;

/// Error occurring while encoding a symbol sequence.
#[derive(Debug)]
pub enum EncodeError {
    /// The configuration failed validation.
    Configuration(ConfigurationError),
    /// The input block's word size does not match the configuration.
    WordSizeMismatch(u8, u8),
    /// I/O error on the output sink.
    IoError(std::io::Error),
}

impl From<ConfigurationError> for EncodeError {
    fn from(e: ConfigurationError) -> Self {
        Self::Configuration(e)
    }
}

impl From<std::io::Error> for EncodeError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::Configuration(e) => write!(f, "Configuration error: {}", e),
            EncodeError::WordSizeMismatch(expected, actual) => write!(
                f,
                "Input word size {} does not match configured word size {}",
                actual, expected
            ),
            EncodeError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl Error for EncodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EncodeError::Configuration(e) => Some(e),
            EncodeError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

/// The result of encoding a symbol sequence.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Sign-extends `value` from `bits` to 64 bits.
#[inline]
#[must_use]
pub(crate) fn sign_extend(value: u64, bits: u8) -> i64 {
    let shift = 64 - bits as u32;
    ((value << shift) as i64) >> shift
}

/// Folds a signed value onto the non-negative integers through the
/// `0, -1, 1, -2, 2, ...` mapping.
#[inline]
#[must_use]
pub(crate) fn fold_signed(value: i64) -> u64 {
    (value as u64).wrapping_shl(1) ^ ((value >> 63) as u64)
}

/// Inverse of [`fold_signed`].
#[inline]
#[must_use]
pub(crate) fn unfold_signed(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Entropy-codes one transformed stream into a standalone arithmetic
/// payload. The symbol count is not part of the payload; the caller
/// keeps track of it.
pub fn encode_stream(conf: &StreamConfiguration, symbols: &DataBlock) -> EncodeResult<Vec<u8>> {
    conf.validate(symbols.word_size())?;

    if symbols.is_empty() {
        return Ok(Vec::new());
    }

    let state_vars = StateVars::new(conf);
    let coding = conf.bin_coding();
    let signed = conf.binarization.is_signed();
    let bypass = conf.context_selection.is_bypass();
    let coding_order = conf.context_selection.coding_order();
    let css = conf.coding_subsym_size;
    let subsym_mask = (1u64 << css) - 1;

    trace!(
        "Encoding {} symbols, {} subsymbols of {} bits, {} contexts",
        symbols.len(),
        state_vars.num_subsyms,
        css,
        state_vars.num_ctx_total
    );

    let mut writer = Writer::new(state_vars.num_ctx_total as usize, conf.context_init.as_deref());
    let selector = ContextSelector::new(&state_vars);
    let mut subsymbols = vec![Subsymbol::default(); state_vars.num_subsyms as usize];

    for index in 0..symbols.len() {
        let symbol = symbols.get(index);
        let coded = if signed {
            fold_signed(sign_extend(symbol, conf.output_symbol_size))
        } else {
            symbol
        };
        debug_assert!(
            conf.output_symbol_size == 64 || coded < (1u64 << conf.output_symbol_size),
            "symbol exceeds the configured symbol size"
        );

        let mut shift = conf.output_symbol_size;
        for (subsym_idx, subsymbol) in subsymbols.iter_mut().enumerate() {
            shift -= css;
            let subsym_value = (coded >> shift) & subsym_mask;

            if bypass {
                writer.write_symbol_bypass(subsym_value, &coding);
            } else {
                let ctx_idx = if coding_order == 0 {
                    selector.context_idx_order0(subsym_idx as u32)
                } else {
                    selector.context_idx_order_gt0(subsym_idx as u32, subsymbol, coding_order)
                };
                writer.write_symbol(subsym_value, &coding, ctx_idx);
                subsymbol.push_prv(coding_order, subsym_value);
            }
        }
    }

    Ok(writer.finish())
}

/// Encodes a symbol sequence under the given configuration: applies
/// the transform chain, entropy-codes every transformed stream and
/// writes the framed payloads to `writer`.
///
/// # Examples
/// ```
/// use gabac::config::{
///     Binarization, ContextSelection, EncodingConfiguration, SequenceTransform,
///     StreamConfiguration,
/// };
/// use gabac::data_block::DataBlock;
///
/// let config = EncodingConfiguration::new(
///     1,
///     SequenceTransform::None,
///     vec![StreamConfiguration::for_word_size(
///         1,
///         Binarization::Binary,
///         ContextSelection::AdaptiveOrder0,
///     )],
/// )
/// .unwrap();
///
/// let block = DataBlock::from_symbols(&[1, 2, 3, 2, 1], 1);
/// let mut compressed = Vec::new();
/// gabac::encode::encode(&config, block, &mut compressed).unwrap();
/// assert!(!compressed.is_empty());
/// ```
pub fn encode<W: Write>(
    config: &EncodingConfiguration,
    symbols: DataBlock,
    writer: &mut W,
) -> EncodeResult<()> {
    config.validate()?;
    if symbols.word_size() != config.word_size {
        return Err(EncodeError::WordSizeMismatch(
            config.word_size,
            symbols.word_size(),
        ));
    }

    let num_symbols = symbols.len();
    let mut streams = apply_sequence_transform(&config.transform, symbols);
    debug!(
        "Encoding {} symbols as {} transformed streams",
        num_symbols,
        streams.len()
    );

    for (block, conf) in streams.iter_mut().zip(&config.stream_configs) {
        if conf.diff_coding {
            transform_diff_coding(block);
        }

        let payload = encode_stream(conf, block)?;
        trace!(
            "Stream of {} symbols coded into {} payload bytes",
            block.len(),
            payload.len()
        );
        write_stream(writer, block.len() as u64, &payload)?;
    }

    Ok(())
}

fn apply_sequence_transform(
    transform: &SequenceTransform,
    mut symbols: DataBlock,
) -> Vec<DataBlock> {
    match *transform {
        SequenceTransform::None => vec![symbols],
        SequenceTransform::Equality => {
            let mut flags = DataBlock::new(1);
            transform_equality_coding(&mut symbols, &mut flags);
            vec![symbols, flags]
        }
        SequenceTransform::Rle { guard } => {
            let mut lengths = DataBlock::new(1);
            transform_rle_coding(guard, &mut symbols, &mut lengths);
            vec![symbols, lengths]
        }
    }
}
