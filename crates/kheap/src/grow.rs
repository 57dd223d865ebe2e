//! The extension engine: grows the heap via the [`HeapProvider`] seam when
//! placement fails.

use crate::block;
use crate::coalesce::coalesce;
use crate::config::CHUNK;
use crate::extend::HeapProvider;
use crate::freelist::FreeIndex;

/// Grows the heap by `max(request, CHUNK)` bytes (rounded to 8), reusing
/// the current epilogue word as the header of the new free block, writes
/// a fresh epilogue past it, and hands the new block to the coalescer
/// (which merges it with a trailing free block if one borders the old
/// epilogue). Returns the coalesced block's payload pointer, or `None` if
/// the underlying provider could not grow the region.
pub unsafe fn extend_heap<P: HeapProvider>(
    provider: &mut P,
    index: &mut FreeIndex,
    heap_base: *mut u8,
    epilogue_hdr: &mut *mut u8,
    request: usize,
) -> Option<*mut u8> {
    unsafe {
        let n = block::align8(request.max(CHUNK));
        let old_epilogue_hdr = *epilogue_hdr;
        let q = provider.extend(n)?;
        debug_assert_eq!(
            q,
            old_epilogue_hdr.add(block::HEADER_SIZE),
            "HeapProvider::extend must return memory immediately following the prior region"
        );

        let new_block = q;
        block::write_tags(new_block, n, false);

        let new_epilogue_hdr = block::next_block(new_block, n).sub(block::HEADER_SIZE);
        block::write_epilogue(new_epilogue_hdr);
        *epilogue_hdr = new_epilogue_hdr;

        Some(coalesce(index, heap_base, new_block))
    }
}
