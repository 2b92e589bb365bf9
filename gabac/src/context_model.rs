use derive_more::{Deref, DerefMut, Index, IndexMut};

use crate::tables::{NEXT_STATE_LPS, NEXT_STATE_MPS};

/// A single adaptive binary probability state.
///
/// The 6-bit probability state index and the most-probable-symbol bit are
/// packed as `state * 2 + mps`, which is also the layout of the
/// externally supplied 7-bit context initialization values. State
/// transitions happen exclusively through the two constant transition
/// tables.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct ContextModel(u8);

impl ContextModel {
    const MAX_PACKED_STATE: u8 = 127;

    /// A fresh context with the weakest probability estimate.
    pub const NEUTRAL: ContextModel = ContextModel(0);

    /// Creates a context model from a packed initial state, clamping it
    /// into the table bounds.
    #[must_use]
    pub fn new(packed_state: u8) -> Self {
        Self(packed_state.min(Self::MAX_PACKED_STATE))
    }

    /// The probability state index, in `[0, 63]`.
    #[inline]
    #[must_use]
    pub fn state(&self) -> u8 {
        self.0 >> 1
    }

    /// The most probable symbol, 0 or 1.
    #[inline]
    #[must_use]
    pub fn mps(&self) -> u8 {
        self.0 & 1
    }

    #[inline]
    pub fn update_lps(&mut self) {
        self.0 = NEXT_STATE_LPS[self.0 as usize];
    }

    #[inline]
    pub fn update_mps(&mut self) {
        self.0 = NEXT_STATE_MPS[self.0 as usize];
    }

    #[inline]
    pub fn toggle_mps(&mut self) {
        self.0 ^= 1;
    }
}

/// An ordered table of context models for one coded stream.
///
/// The table size is a deterministic function of the stream
/// configuration and must be computed identically on the encoding and
/// the decoding side.
#[derive(Clone, Debug, Deref, DerefMut, Index, IndexMut)]
pub(crate) struct ContextTable(Vec<ContextModel>);

impl ContextTable {
    /// Builds a table of `num_contexts` models, taking initial states
    /// from `init` if present and the neutral state otherwise.
    #[must_use]
    pub fn new(num_contexts: usize, init: Option<&[u8]>) -> Self {
        let models = match init {
            Some(values) => {
                debug_assert_eq!(values.len(), num_contexts);
                values.iter().map(|&value| ContextModel::new(value)).collect()
            }
            None => vec![ContextModel::NEUTRAL; num_contexts],
        };

        Self(models)
    }
}
