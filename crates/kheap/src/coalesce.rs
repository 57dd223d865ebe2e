//! The coalescer: merges a newly-freed block with free immediate
//! neighbors by consulting boundary tags.
//!
//! Sentinels (prologue and epilogue) are always read back as allocated, so
//! the four cases below need no special-case branch for "at the edge of
//! the heap" -- the branch-free property the distilled contract calls out
//! as the whole point of carrying sentinels.

use crate::block::{self};
use crate::freelist::FreeIndex;

/// `p`'s alloc bit must already be 0 and its header/footer size already
/// set to the block's current (unmerged) size. Returns the canonical
/// pointer of the merged block, which is in the free index exactly once
/// and has no free neighbor on return.
pub unsafe fn coalesce(index: &mut FreeIndex, heap_base: *mut u8, p: *mut u8) -> *mut u8 {
    unsafe {
        let prev = block::prev_block(p);
        let size = block::size_of_block(p);
        let next = block::next_block(p, size);

        let prev_free = !block::is_alloc(prev);
        let next_free = !block::is_alloc(next);

        match (prev_free, next_free) {
            (false, false) => {
                log::trace!("coalesce: block {:p} (size {}) has no free neighbor", p, size);
                index.insert(p, heap_base);
                p
            }
            (false, true) => {
                index.remove(next, heap_base);
                let next_size = block::size_of_block(next);
                let merged = size + next_size;
                log::trace!(
                    "coalesce: block {:p} (size {}) merges with free next {:p} (size {}) -> {}",
                    p, size, next, next_size, merged
                );
                block::write_tags(p, merged, false);
                index.insert(p, heap_base);
                p
            }
            (true, false) => {
                index.remove(prev, heap_base);
                let prev_size = block::size_of_block(prev);
                let merged = prev_size + size;
                log::trace!(
                    "coalesce: block {:p} (size {}) merges with free prev {:p} (size {}) -> {}",
                    p, size, prev, prev_size, merged
                );
                block::write_tags(prev, merged, false);
                index.insert(prev, heap_base);
                prev
            }
            (true, true) => {
                index.remove(prev, heap_base);
                index.remove(next, heap_base);
                let prev_size = block::size_of_block(prev);
                let next_size = block::size_of_block(next);
                let merged = prev_size + size + next_size;
                log::debug!(
                    "coalesce: block {:p} (size {}) merges with both free prev {:p} (size {}) and next {:p} (size {}) -> {}",
                    p, size, prev, prev_size, next, next_size, merged
                );
                block::write_tags(prev, merged, false);
                index.insert(prev, heap_base);
                prev
            }
        }
    }
}
