//! Context table sizing and per-bin context index selection.
//!
//! The derived state variables are a pure function of the stream
//! configuration. Encoder and decoder compute them independently; any
//! divergence desynchronizes the arithmetic coder without recovery, so
//! everything here is deterministic integer arithmetic.

use crate::config::{Binarization, ContextSelection, StreamConfiguration};

/// Per-subsymbol coding state carried across symbols: the previous
/// subsymbol values consumed by the order-1 and order-2 context
/// selection.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct Subsymbol {
    pub prv_values: [u64; 2],
}

impl Subsymbol {
    pub fn push_prv(&mut self, coding_order: u8, value: u64) {
        if coding_order == 2 {
            self.prv_values[1] = self.prv_values[0];
        }
        if coding_order >= 1 {
            self.prv_values[0] = value;
        }
    }
}

/// Derived sizing of the context model table for one coded stream.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct StateVars {
    pub num_subsyms: u32,
    pub num_alpha_subsym: u64,
    pub num_ctx_subsym: u64,
    pub coding_order_ctx_offset: [u64; 3],
    pub coding_size_ctx_offset: u64,
    pub num_ctx_total: u64,
}

#[must_use]
fn floor_log2(value: u64) -> u64 {
    debug_assert!(value > 0);
    63 - value.leading_zeros() as u64
}

#[must_use]
fn sutu_num_ctx(output_symbol_size: u8, split_unit_size: u8) -> u64 {
    let oss = output_symbol_size as u64;
    let sus = split_unit_size as u64;
    (oss / sus) * ((1u64 << sus) - 1) + ((1u64 << (oss % sus)) - 1)
}

impl StateVars {
    /// Computes the state variables for a validated stream
    /// configuration.
    #[must_use]
    pub fn new(conf: &StreamConfiguration) -> Self {
        let num_subsyms = (conf.output_symbol_size / conf.coding_subsym_size) as u32;
        let num_alpha_subsym = if conf.coding_subsym_size == 64 {
            u64::MAX
        } else {
            1u64 << conf.coding_subsym_size
        };

        if conf.context_selection == ContextSelection::Bypass {
            return Self {
                num_subsyms,
                num_alpha_subsym,
                num_ctx_subsym: 0,
                coding_order_ctx_offset: [0; 3],
                coding_size_ctx_offset: 0,
                num_ctx_total: 0,
            };
        }

        let eg_prefix_ctx = floor_log2(num_alpha_subsym + 1) + 1;
        let num_ctx_subsym = match conf.binarization {
            Binarization::Binary => conf.coding_subsym_size as u64,
            Binarization::TruncatedUnary { c_max } => c_max as u64,
            Binarization::ExponentialGolomb => eg_prefix_ctx,
            Binarization::SignedExponentialGolomb => eg_prefix_ctx + 1,
            Binarization::TruncatedExpGolomb { c_max_teg } => c_max_teg as u64 + eg_prefix_ctx,
            Binarization::SignedTruncatedExpGolomb { c_max_teg } => {
                c_max_teg as u64 + eg_prefix_ctx + 1
            }
            Binarization::SplitUnitwiseTruncatedUnary { split_unit_size } => {
                sutu_num_ctx(conf.output_symbol_size, split_unit_size)
            }
            Binarization::SignedSplitUnitwiseTruncatedUnary { split_unit_size } => {
                sutu_num_ctx(conf.output_symbol_size, split_unit_size) + 1
            }
            Binarization::DoubleTruncatedUnary {
                split_unit_size,
                c_max_dtu,
            } => c_max_dtu as u64 + sutu_num_ctx(conf.output_symbol_size, split_unit_size),
            Binarization::SignedDoubleTruncatedUnary {
                split_unit_size,
                c_max_dtu,
            } => c_max_dtu as u64 + sutu_num_ctx(conf.output_symbol_size, split_unit_size) + 1,
        };

        let coding_order = conf.context_selection.coding_order();
        let mut coding_order_ctx_offset = [0u64; 3];
        if coding_order >= 1 {
            coding_order_ctx_offset[1] = num_ctx_subsym;
        }
        if coding_order == 2 {
            coding_order_ctx_offset[2] = num_ctx_subsym.saturating_mul(num_alpha_subsym);
        }

        // saturating so that oversized tables survive long enough to be
        // rejected by configuration validation
        let coding_size_ctx_offset = if coding_order == 0 {
            num_ctx_subsym
        } else {
            coding_order_ctx_offset[coding_order as usize].saturating_mul(num_alpha_subsym)
        };

        let num_ctx_total = (num_subsyms as u64).saturating_mul(coding_size_ctx_offset);

        Self {
            num_subsyms,
            num_alpha_subsym,
            num_ctx_subsym,
            coding_order_ctx_offset,
            coding_size_ctx_offset,
            num_ctx_total,
        }
    }
}

/// Computes the context table index for one subsymbol.
#[derive(Clone, Debug)]
pub(crate) struct ContextSelector {
    coding_size_ctx_offset: u64,
    coding_order_ctx_offset: [u64; 3],
}

impl ContextSelector {
    #[must_use]
    pub fn new(state_vars: &StateVars) -> Self {
        Self {
            coding_size_ctx_offset: state_vars.coding_size_ctx_offset,
            coding_order_ctx_offset: state_vars.coding_order_ctx_offset,
        }
    }

    #[inline]
    #[must_use]
    pub fn context_idx_order0(&self, subsym_idx: u32) -> usize {
        (subsym_idx as u64 * self.coding_size_ctx_offset) as usize
    }

    #[inline]
    #[must_use]
    pub fn context_idx_order_gt0(
        &self,
        subsym_idx: u32,
        subsymbol: &Subsymbol,
        coding_order: u8,
    ) -> usize {
        let mut ctx_idx = subsym_idx as u64 * self.coding_size_ctx_offset;
        for order in 1..=coding_order as usize {
            ctx_idx += subsymbol.prv_values[order - 1] * self.coding_order_ctx_offset[order];
        }
        ctx_idx as usize
    }
}
