//! Decode drivers; the exact mirror of [`crate::encode`].
//!
//! Symbol counts come from the stream framing, not from the arithmetic
//! payload itself. A decoder configured differently from the encoder
//! desynchronizes silently; validation catches malformed
//! configurations, but cross-side agreement is the caller's contract.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Read;

use log::{debug, trace};

use crate::config::{ConfigurationError, EncodingConfiguration, SequenceTransform, StreamConfiguration};
use crate::context_selector::{ContextSelector, StateVars, Subsymbol};
use crate::data_block::DataBlock;
use crate::encode::unfold_signed;
use crate::reader::Reader;
use crate::stream::read_stream;
use crate::transform::{
    inverse_transform_diff_coding, inverse_transform_equality_coding, inverse_transform_rle_coding,
};

// decoding counts come from the payload; cap the upfront reservation
const MAX_PREALLOCATED_SYMBOLS: usize = 1 << 20;

/// Error occurring while decoding a compressed payload.
#[derive(Debug)]
pub enum DecodeError {
    /// The configuration failed validation.
    Configuration(ConfigurationError),
    /// I/O error on the input source, including truncated payloads.
    IoError(std::io::Error),
}

impl From<ConfigurationError> for DecodeError {
    fn from(e: ConfigurationError) -> Self {
        Self::Configuration(e)
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Configuration(e) => write!(f, "Configuration error: {}", e),
            DecodeError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DecodeError::Configuration(e) => Some(e),
            DecodeError::IoError(e) => Some(e),
        }
    }
}

/// The result of decoding a compressed payload.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Entropy-decodes one transformed stream. `num_symbols` is the
/// externally tracked symbol count; `word_size` the word size of the
/// reconstructed block.
pub fn decode_stream(
    conf: &StreamConfiguration,
    payload: &[u8],
    num_symbols: usize,
    word_size: u8,
) -> DecodeResult<DataBlock> {
    conf.validate(word_size)?;

    if num_symbols == 0 {
        return Ok(DataBlock::new(word_size));
    }

    let state_vars = StateVars::new(conf);
    let coding = conf.bin_coding();
    let signed = conf.binarization.is_signed();
    let bypass = conf.context_selection.is_bypass();
    let coding_order = conf.context_selection.coding_order();
    let css = conf.coding_subsym_size;

    trace!(
        "Decoding {} symbols, {} subsymbols of {} bits, {} contexts",
        num_symbols,
        state_vars.num_subsyms,
        css,
        state_vars.num_ctx_total
    );

    let mut reader = Reader::new(
        payload,
        state_vars.num_ctx_total as usize,
        conf.context_init.as_deref(),
    );
    let selector = ContextSelector::new(&state_vars);
    let mut subsymbols = vec![Subsymbol::default(); state_vars.num_subsyms as usize];

    let mut block = DataBlock::with_capacity(word_size, num_symbols.min(MAX_PREALLOCATED_SYMBOLS));
    for _ in 0..num_symbols {
        let mut coded: u64 = 0;

        for (subsym_idx, subsymbol) in subsymbols.iter_mut().enumerate() {
            let subsym_value = if bypass {
                reader.read_symbol_bypass(&coding)
            } else {
                let ctx_idx = if coding_order == 0 {
                    selector.context_idx_order0(subsym_idx as u32)
                } else {
                    selector.context_idx_order_gt0(subsym_idx as u32, subsymbol, coding_order)
                };
                let value = reader.read_symbol(&coding, ctx_idx);
                subsymbol.push_prv(coding_order, value);
                value
            };

            coded = (coded << css) | subsym_value;
        }

        let symbol = if signed {
            unfold_signed(coded) as u64
        } else {
            coded
        };
        block.push(symbol);
    }

    let payload_used = reader.close();
    trace!("Consumed {} of {} payload bytes", payload_used, payload.len());

    Ok(block)
}

/// Decodes a compressed payload produced by [`crate::encode::encode`]
/// under the identical configuration: reads the framed streams,
/// entropy-decodes them and applies the inverse transform chain in
/// reverse order.
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
/// gabac::encode::encode(&config, block.clone(), &mut compressed).unwrap();
///
/// let decoded = gabac::decode::decode(&config, &mut compressed.as_slice()).unwrap();
/// assert_eq!(decoded, block);
/// ```
pub fn decode<R: Read>(config: &EncodingConfiguration, reader: &mut R) -> DecodeResult<DataBlock> {
    config.validate()?;

    let word_sizes = config.transform.stream_word_sizes(config.word_size);
    let mut streams = Vec::with_capacity(word_sizes.len());

    for (conf, &word_size) in config.stream_configs.iter().zip(&word_sizes) {
        let (num_symbols, payload) = read_stream(reader)?;
        let mut block = decode_stream(conf, &payload, num_symbols as usize, word_size)?;

        if conf.diff_coding {
            inverse_transform_diff_coding(&mut block);
        }
        streams.push(block);
    }

    debug!("Decoded {} transformed streams", streams.len());

    let block = match config.transform {
        SequenceTransform::None => streams.pop().expect("one stream is always present"),
        SequenceTransform::Equality => {
            let mut flags = streams.pop().expect("flag stream is present");
            let mut values = streams.pop().expect("value stream is present");
            inverse_transform_equality_coding(&mut values, &mut flags);
            values
        }
        SequenceTransform::Rle { guard } => {
            let mut lengths = streams.pop().expect("length stream is present");
            let mut values = streams.pop().expect("value stream is present");
            inverse_transform_rle_coding(guard, &mut values, &mut lengths);
            values
        }
    };

    Ok(block)
}
