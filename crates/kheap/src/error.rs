//! Error types, in the style of the donor kernel's `memory::vmm::{MapError,
//! UnmapError}`: small hand-rolled enums, no `thiserror`/`anyhow` (neither
//! appears in the donor's own dependency graph).

use core::fmt;

/// Reasons a core operation can fail.
///
/// The public glue (`Allocator::alloc`/`realloc`/`calloc`) still returns a
/// bare null pointer at its outermost edge to match the specified
/// contract; the richer variant is available through the `*_checked`
/// entry points for callers that want to distinguish failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The heap primitive's `extend` could not grow the region far enough.
    HeapExhausted,
    /// `calloc`'s `nmemb * size` product overflowed `usize`.
    Overflow,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::HeapExhausted => write!(f, "heap exhausted"),
            AllocError::Overflow => write!(f, "size computation overflowed"),
        }
    }
}

/// A single invariant violation found by [`crate::Allocator::checkheap`].
///
/// Carries enough context to name the defect in a diagnostic: which
/// invariant from the data model was broken, the offending block's
/// payload address, and what was expected versus observed.
#[derive(Debug, Clone, Copy)]
pub enum CheckError {
    /// Invariant 1: header word did not match footer word.
    HeaderFooterMismatch { block: usize, header: u64, footer: u64 },
    /// Invariant 2: block size below the minimum or not 8-aligned.
    BadSize { block: usize, size: usize },
    /// Invariant 2/7: a block or link pointed outside `[lo, hi]`.
    OutOfBounds { block: usize },
    /// Invariant 4: two adjacent free blocks escaped coalescing.
    UncoalescedNeighbors { first: usize, second: usize },
    /// Invariant 5: allocation bit and free-index membership disagree.
    FreeIndexMismatch { block: usize, in_index: bool, alloc_bit: bool },
    /// Invariant 5/7: a free-index link does not land on a real block
    /// boundary reachable from the prologue by address-order stepping.
    UnwalkableFreeBlock { block: usize },
    /// Invariant 6: a free block's class chain does not match its size.
    WrongClass { block: usize, expected: usize, found: usize },
    /// Invariant 7 (doubly-linked consistency): `next.prev != block`.
    BrokenLink { block: usize, neighbor: usize },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::HeaderFooterMismatch { block, header, footer } => write!(
                f,
                "block {:#x}: header {:#x} != footer {:#x}",
                block, header, footer
            ),
            CheckError::BadSize { block, size } => {
                write!(f, "block {:#x}: illegal size {}", block, size)
            }
            CheckError::OutOfBounds { block } => {
                write!(f, "block {:#x}: address outside heap bounds", block)
            }
            CheckError::UncoalescedNeighbors { first, second } => write!(
                f,
                "adjacent free blocks at {:#x} and {:#x} were not coalesced",
                first, second
            ),
            CheckError::FreeIndexMismatch { block, in_index, alloc_bit } => write!(
                f,
                "block {:#x}: free-index membership {} disagrees with alloc bit {}",
                block, in_index, alloc_bit
            ),
            CheckError::UnwalkableFreeBlock { block } => write!(
                f,
                "block {:#x}: listed in free index but not reachable by the address-order walk",
                block
            ),
            CheckError::WrongClass { block, expected, found } => write!(
                f,
                "block {:#x}: listed in class {} but size maps to class {}",
                block, found, expected
            ),
            CheckError::BrokenLink { block, neighbor } => write!(
                f,
                "block {:#x}: neighbor {:#x} does not link back",
                block, neighbor
            ),
        }
    }
}
