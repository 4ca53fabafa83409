extern crate self as utxodag_core;

pub mod log;

pub use ::log::{debug, error, info, trace, warn};
