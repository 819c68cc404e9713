//! Fixed-size batching of record collections.
//!
//! Splitting happens on borrowed slices, so batching a collection costs
//! nothing beyond the iterator itself. Submitting everything in one
//! round-trip is an explicit mode rather than a magic batch size.

use std::num::NonZeroUsize;

/// How a record collection is split for store submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSize {
    /// Submit the whole collection as a single batch.
    All,
    /// Submit at most this many records per batch.
    Limit(NonZeroUsize),
}

impl BatchSize {
    /// The default batch size used when none is configured.
    pub const DEFAULT: usize = 100;

    /// Interpret a configured value: `0` means unbatched.
    pub fn from_config(batch_size: u32) -> Self {
        match NonZeroUsize::new(batch_size as usize) {
            Some(n) => Self::Limit(n),
            None => Self::All,
        }
    }

    /// Records per batch when applied to a collection of `len` records.
    pub fn limit_for(self, len: usize) -> usize {
        match self {
            // `chunks` panics on zero; an empty input still needs a positive size.
            Self::All => len.max(1),
            Self::Limit(n) => n.get(),
        }
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self::Limit(NonZeroUsize::new(Self::DEFAULT).expect("default batch size is non-zero"))
    }
}

/// Lazily yield contiguous slices of `records`, each of the configured
/// size except possibly the last. Order is preserved; concatenating the
/// slices reproduces the input exactly. An empty collection yields no
/// batches.
pub fn batches<T>(records: &[T], size: BatchSize) -> std::slice::Chunks<'_, T> {
    records.chunks(size.limit_for(records.len()))
}
