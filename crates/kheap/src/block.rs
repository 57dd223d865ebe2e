//! Boundary-tag block helpers.
//!
//! Every block is a `header | payload | footer` triple addressed by its
//! **payload pointer** `p`: the header word lives at `p - HEADER_SIZE`, the
//! footer word at `p + size - HEADER_SIZE - FOOTER_SIZE`. Both words pack
//! the whole-block size (including header and footer) with the allocation
//! bit in the low bit. Duplicating size in the footer gives O(1)
//! previous-block lookup during coalescing, at the cost of the extra word.
//!
//! This is a pure-function layer: it knows nothing about the free index,
//! only about walking and tagging bytes already on the heap.

use core::mem::size_of;

pub const HEADER_SIZE: usize = size_of::<u64>();
pub const FOOTER_SIZE: usize = size_of::<u64>();
pub const OVERHEAD: usize = HEADER_SIZE + FOOTER_SIZE;

/// Size of a free block's link fields: a doubly-linked (prev, next) pair of
/// 4-byte [`crate::offset::Offset`]s.
pub const LINK_FIELDS_SIZE: usize = 8;

/// Smallest legal block size: header + two link words + footer, already a
/// multiple of 8.
pub const MIN_BLOCK_SIZE: usize = HEADER_SIZE + LINK_FIELDS_SIZE + FOOTER_SIZE;

pub(crate) const ALLOC_BIT: u64 = 0x1;
pub(crate) const SIZE_MASK: u64 = !0x7; // never `!0x3` -- see design notes on the source defect this avoids.

#[inline]
fn pack(size: usize, alloc: bool) -> u64 {
    debug_assert_eq!(size & 0x7, 0, "block size must be 8-byte aligned");
    size as u64 | if alloc { ALLOC_BIT } else { 0 }
}

/// Address of the header word for the block whose payload starts at `p`.
#[inline]
pub unsafe fn header_of(p: *mut u8) -> *mut u64 {
    unsafe { p.sub(HEADER_SIZE) as *mut u64 }
}

/// Address of the footer word for the block whose payload starts at `p`
/// and whose whole-block size is `size`.
#[inline]
pub unsafe fn footer_of(p: *mut u8, size: usize) -> *mut u64 {
    unsafe { p.add(size - OVERHEAD) as *mut u64 }
}

/// Reads the whole-block size encoded in `p`'s header.
#[inline]
pub unsafe fn size_of_block(p: *mut u8) -> usize {
    unsafe { (*header_of(p) & SIZE_MASK) as usize }
}

/// Reads the allocation bit encoded in `p`'s header.
#[inline]
pub unsafe fn is_alloc(p: *mut u8) -> bool {
    unsafe { (*header_of(p) & ALLOC_BIT) != 0 }
}

/// Writes `size | alloc` into the header word of the block at `p`.
#[inline]
pub unsafe fn write_header(p: *mut u8, size: usize, alloc: bool) {
    unsafe {
        *header_of(p) = pack(size, alloc);
    }
}

/// Writes `size | alloc` into the footer word of the block at `p`.
#[inline]
pub unsafe fn write_footer(p: *mut u8, size: usize, alloc: bool) {
    unsafe {
        *footer_of(p, size) = pack(size, alloc);
    }
}

/// Writes both header and footer in one call; the common case at every
/// placement, split, coalesce, and extension site.
#[inline]
pub unsafe fn write_tags(p: *mut u8, size: usize, alloc: bool) {
    unsafe {
        write_header(p, size, alloc);
        write_footer(p, size, alloc);
    }
}

/// Payload pointer of the block immediately following `p` in address order.
///
/// Valid for any `size`, sentinel or not: a block's footer boundary plus
/// its neighbor's header boundary cancel out, so `next = p + size` holds
/// uniformly.
#[inline]
pub unsafe fn next_block(p: *mut u8, size: usize) -> *mut u8 {
    unsafe { p.add(size) }
}

/// Payload pointer of the block immediately preceding `p` in address order.
///
/// Reads the previous block's footer, which sits directly before this
/// block's header.
#[inline]
pub unsafe fn prev_block(p: *mut u8) -> *mut u8 {
    unsafe {
        let prev_footer = p.sub(OVERHEAD) as *mut u64;
        let prev_size = (*prev_footer & SIZE_MASK) as usize;
        p.sub(prev_size)
    }
}

/// Rounds `n` up to the next multiple of 8.
#[inline]
pub const fn align8(n: usize) -> usize {
    (n + 7) & !7
}

/// Computes the block size for a caller request of `n` payload bytes:
/// header + footer + payload, rounded up to 8 and floored at
/// [`MIN_BLOCK_SIZE`].
#[inline]
pub const fn block_size_for(n: usize) -> usize {
    let raw = align8(n + OVERHEAD);
    if raw < MIN_BLOCK_SIZE { MIN_BLOCK_SIZE } else { raw }
}

/// Usable payload bytes of a block of the given whole-block `size`.
#[inline]
pub const fn payload_of(size: usize) -> usize {
    size - OVERHEAD
}

/// Offset of the two-word (prev, next) free-link area within a free
/// block's payload: offset 0.
pub const LINK_PREV_OFFSET: usize = 0;
pub const LINK_NEXT_OFFSET: usize = 4;

/// Writes a zero-size, allocated header word directly at `hdr` -- the
/// epilogue sentinel has no payload pointer of its own, only a header
/// address.
#[inline]
pub unsafe fn write_epilogue(hdr: *mut u8) {
    unsafe {
        *(hdr as *mut u64) = ALLOC_BIT;
    }
}

/// Zeroes a freshly-freed block's link-field area so stale prev/next
/// bytes from a previous life as an allocated payload never leak into a
/// `checkheap` diagnostic. Every block is at least [`MIN_BLOCK_SIZE`]
/// bytes, so the two 4-byte link words always fit within the payload.
#[inline]
pub unsafe fn clear_link_fields(p: *mut u8) {
    unsafe {
        *(p as *mut u64) = 0;
    }
}
