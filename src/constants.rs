/// Constants used by the on-disk record format and store operations.
pub mod store {
    /// Width of the little-endian `i32` length prefix in front of every block.
    pub const LEN_PREFIX_BYTES: u64 = 4;
    /// Default hand-off capacity between streaming reader stages.
    pub const DEFAULT_STREAM_CAPACITY: usize = 1;

    /// Operation name attached to write failures.
    pub const OP_WRITE: &str = "write record store";
    /// Operation name attached to open/index failures.
    pub const OP_OPEN: &str = "open record store";
    /// Operation name attached to group read failures.
    pub const OP_READ_GROUP: &str = "read record group";
    /// Operation name attached to close failures.
    pub const OP_CLOSE: &str = "close record store";
    /// Operation name attached to streaming read failures.
    pub const OP_STREAM: &str = "stream record store";

    /// Label used when the store handle mutex is poisoned.
    pub const HANDLE_LOCK_LABEL: &str = "record store handle";
}

/// Constants used by sampler runtime behavior.
pub mod sampler {
    /// Fixed seed for the train/test permutation.
    ///
    /// Changing this reshuffles every existing split.
    pub const PARTITION_SEED: u64 = 1337;
    /// Default number of rejected group draws before reporting insufficient data.
    pub const DEFAULT_DRAW_RETRY_LIMIT: usize = 4096;
    /// Smallest `min` accepted by batch construction (query plus anchor).
    pub const MIN_TEXTS_PER_UNIT: usize = 2;

    /// Label used when the batch sampler RNG mutex is poisoned.
    pub const RNG_LOCK_LABEL: &str = "batch sampler rng";
}
