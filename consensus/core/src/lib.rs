pub mod codec;
pub mod config;
pub mod hashing;
pub mod subnets;
pub mod tx;
pub mod utxo;
