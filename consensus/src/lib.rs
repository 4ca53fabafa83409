//! # UTXO sets and diffs over a blockDAG
//!
//! The UTXO state as of some block is either materialized ([`utxo::full_set::FullUtxoSet`]) or
//! expressed as a diff on top of a materialized base ([`utxo::diff_set::DiffUtxoSet`]).
//! Since many tips can coexist in a DAG, per-block diffs are kept in the
//! [`utxo::diff_store::UtxoDiffStore`], each leading towards the state of the block's diff child.
//!
//! ## Invariants
//!
//! - A diff set is meaningful only relative to its base. Two diff sets are comparable only if
//!   they share the very same base instance (checked by reference identity).
//! - Melding a diff into its base requires every removed outpoint to exist in the base.
//!   A violation means the diff and base were derived inconsistently, and nothing is written.
//! - Algebra operations either fully succeed or leave their receiver untouched.

pub mod errors;
pub mod model;
pub mod utxo;
