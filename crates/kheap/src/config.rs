//! Compile-time tunables.
//!
//! These mirror the knobs of the allocator this crate is descended from
//! (`CHUNK`, a placement search bound, a fixed class count) but are `const`
//! instead of runtime fields, matching this lineage's preference for
//! build-time policy constants over configuration structs.

/// Minimum heap-extension quantum, in bytes. Every `extend()` call requests
/// at least this many bytes even if the triggering allocation is smaller.
pub const CHUNK: usize = 256;

/// Max free blocks scanned per placement before settling for the best
/// candidate found so far. Source values observed were 1, 7, and 10; this
/// crate defaults to 7.
pub const SEARCH_BOUND: usize = 7;

/// Number of segregated size classes.
pub const NUM_CLASSES: usize = 20;

/// `2^MIN_BLOCK_EXP` is the smallest power of two at or above
/// [`crate::block::MIN_BLOCK_SIZE`]; class 0 covers
/// `(2^(MIN_BLOCK_EXP-1), 2^MIN_BLOCK_EXP]`.
pub const MIN_BLOCK_EXP: u32 = 5; // 32
