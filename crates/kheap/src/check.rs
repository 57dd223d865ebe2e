//! The heap checker: walks the heap in address order verifying
//! invariants 1-7 of the data model, then walks every free-index chain,
//! checking each listed block individually against that walk.

use crate::allocator::Allocator;
use crate::block;
use crate::config::NUM_CLASSES;
use crate::error::CheckError;
use crate::extend::HeapProvider;
use crate::freelist::FreeIndex;

/// Verifies every invariant listed in the data model. On the first
/// violation found, logs a diagnostic through the `log` facade (a no-op
/// if no logger is installed) naming the offending block, and returns the
/// corresponding [`CheckError`]. `verbose` additionally logs a trace line
/// per block visited.
pub fn checkheap<P: HeapProvider>(alloc: &Allocator<P>, verbose: bool) -> Result<(), CheckError> {
    let heap_base = alloc.heap_base();
    if heap_base.is_null() {
        return Ok(());
    }

    let mut free_count_walk = 0usize;
    let mut prev_free = false;
    let mut prev_block = heap_base;
    let mut p = heap_base;

    loop {
        let size = unsafe { block::size_of_block(p) };
        let alloc_bit = unsafe { block::is_alloc(p) };

        if verbose {
            log::trace!("checkheap: block {:p} size={} alloc={}", p, size, alloc_bit);
        }

        if size == 0 {
            if !alloc_bit {
                log::error!("checkheap: epilogue at {:p} is not marked allocated", p);
                return Err(CheckError::BadSize { block: p as usize, size });
            }
            break;
        }

        if size % 8 != 0 || size < block::MIN_BLOCK_SIZE {
            log::error!("checkheap: block {:p} has illegal size {}", p, size);
            return Err(CheckError::BadSize { block: p as usize, size });
        }

        let header = unsafe { *block::header_of(p) };
        let footer = unsafe { *block::footer_of(p, size) };
        if header != footer {
            log::error!(
                "checkheap: block {:p} header {:#x} != footer {:#x}",
                p, header, footer
            );
            return Err(CheckError::HeaderFooterMismatch { block: p as usize, header, footer });
        }

        if !alloc.within_bounds(p) {
            log::error!("checkheap: block {:p} outside heap bounds", p);
            return Err(CheckError::OutOfBounds { block: p as usize });
        }

        if !alloc_bit && prev_free {
            log::error!(
                "checkheap: adjacent free blocks at {:p} and {:p} escaped coalescing",
                prev_block, p
            );
            return Err(CheckError::UncoalescedNeighbors {
                first: prev_block as usize,
                second: p as usize,
            });
        }

        prev_free = !alloc_bit;
        prev_block = p;
        p = unsafe { block::next_block(p, size) };
    }

    let epilogue_hdr = alloc.epilogue_hdr();
    let mut free_count_index = 0usize;
    for class in 0..NUM_CLASSES {
        for q in alloc.index().iter_class(class, heap_base) {
            if unsafe { block::is_alloc(q) } {
                log::error!("checkheap: block {:p} in free index but marked allocated", q);
                return Err(CheckError::FreeIndexMismatch { block: q as usize, in_index: true, alloc_bit: true });
            }
            if !alloc.within_bounds(q) {
                log::error!("checkheap: free-index block {:p} outside heap bounds", q);
                return Err(CheckError::OutOfBounds { block: q as usize });
            }

            // Invariant 7(c): `q` must land exactly on a block boundary
            // reached by stepping from the prologue in address order, not
            // merely fall inside `[lo, hi]`. Catches a corrupted link that
            // points in-bounds but off a real block.
            if !unsafe { discoverable_by_walk(heap_base, epilogue_hdr, q) } {
                log::error!(
                    "checkheap: free-index block {:p} is not on a block boundary reachable from the prologue",
                    q
                );
                return Err(CheckError::UnwalkableFreeBlock { block: q as usize });
            }

            let size = unsafe { block::size_of_block(q) };
            let expected = FreeIndex::class_of(size);
            if expected != class {
                log::error!(
                    "checkheap: block {:p} size {} belongs in class {} but found in class {}",
                    q, size, expected, class
                );
                return Err(CheckError::WrongClass { block: q as usize, expected, found: class });
            }

            let next = crate::freelist::next_link_of(q);
            if !next.is_null() {
                let next_ptr = crate::freelist::offset_to_ptr(next, heap_base);
                let back = crate::freelist::prev_link_of(next_ptr);
                if back != crate::freelist::ptr_to_offset(q, heap_base) {
                    log::error!(
                        "checkheap: block {:p}'s next {:p} does not link back to it",
                        q, next_ptr
                    );
                    return Err(CheckError::BrokenLink { block: q as usize, neighbor: next_ptr as usize });
                }
            }

            free_count_index += 1;
        }
    }

    // Reverse direction of invariant 5: every free block seen during the
    // address-order walk must itself be individually discoverable inside
    // some free-index chain, not just counted.
    p = heap_base;
    loop {
        let size = unsafe { block::size_of_block(p) };
        if size == 0 {
            break;
        }
        if !unsafe { block::is_alloc(p) } {
            free_count_walk += 1;
            let class = FreeIndex::class_of(size);
            if !alloc.index().iter_class(class, heap_base).any(|q| q == p) {
                log::error!(
                    "checkheap: free block {:p} is not linked into free-index class {}",
                    p, class
                );
                return Err(CheckError::FreeIndexMismatch { block: p as usize, in_index: false, alloc_bit: false });
            }
        }
        p = unsafe { block::next_block(p, size) };
    }

    if verbose {
        log::debug!(
            "checkheap: ok ({} free blocks, {} indexed)",
            free_count_walk, free_count_index
        );
    }
    Ok(())
}

/// Walks from `heap_base` stepping block-to-block in address order,
/// stopping as soon as `target` is matched (`true`) or the walk would pass
/// `target`'s address, reach the epilogue, or run past `epilogue_hdr`
/// without finding it (`false`). Bounds the walk so a corrupted free-index
/// link can never drive it past the live heap region.
unsafe fn discoverable_by_walk(heap_base: *mut u8, epilogue_hdr: *mut u8, target: *mut u8) -> bool {
    let mut p = heap_base;
    loop {
        if p == target {
            return true;
        }
        if (p as usize) > (epilogue_hdr as usize) {
            return false;
        }
        let size = unsafe { block::size_of_block(p) };
        if size == 0 {
            return false;
        }
        p = unsafe { block::next_block(p, size) };
    }
}
