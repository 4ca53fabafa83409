pub mod consensus {
    //!
    //! A module for constants which directly impact consensus.
    //!

    /// Blue score marking an output which was not yet accepted by any block
    pub const UNACCEPTED_BLUE_SCORE: u64 = u64::MAX;

    /// Diff store records of blocks whose blue score is further than this from the
    /// virtual blue score are evicted from memory (they stay persisted)
    pub const MAX_BLUE_SCORE_DIFFERENCE_TO_KEEP_LOADED: u64 = 100;
}

pub mod codec {
    //!
    //! Hard limits applied when decoding records. Encoders never produce data exceeding them.
    //!

    /// Maximum length of a script public key
    pub const MAX_SCRIPT_PUBLIC_KEY_LEN: u64 = 10_000;

    /// Maximum length of an input signature script
    pub const MAX_SIGNATURE_SCRIPT_LEN: u64 = 10_000;

    /// Maximum length of a transaction payload
    pub const MAX_PAYLOAD_LEN: u64 = 1 << 20;

    /// Maximum number of items in a decoded collection (UTXO collections, tx inputs/outputs)
    pub const MAX_COLLECTION_LEN: u64 = 1 << 24;
}

pub mod perf {
    //!
    //! A module for performance critical constants.
    //!

    /// The default byte bound of the UTXO set cache
    pub const DEFAULT_UTXO_CACHE_MAX_BYTES: usize = 500_000_000;
}

/// Estimated memory overhead of a UTXO entry excluding its script bytes: the
/// outpoint key (36 bytes), amount and blue score (8 bytes each), coinbase flag
/// and script version
pub const UTXO_ENTRY_FIXED_SIZE: usize = 36 + 8 + 8 + 1 + 2;
