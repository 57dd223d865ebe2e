//! The public operations: thin glue over the block layout, free index,
//! placement engine, coalescer, and extension engine. `Allocator<P>` owns
//! all allocator state for one heap backed by a [`HeapProvider`] `P`.

use core::ptr;

use crate::block;
use crate::coalesce;
use crate::error::AllocError;
use crate::extend::HeapProvider;
use crate::freelist::FreeIndex;
use crate::grow;
use crate::place;

/// All allocator state for a single heap. `heap_base` doubles as the
/// anchor free-list offsets are relative to and as the prologue's payload
/// pointer; both are set once by [`Allocator::init`] and held for the
/// process lifetime (matching the single-threaded resource model: this
/// type carries no internal synchronization of its own -- see
/// [`crate::locked::Locked`] for the `#[global_allocator]`-grade wrapper).
pub struct Allocator<P> {
    provider: P,
    index: FreeIndex,
    heap_base: *mut u8,
    epilogue_hdr: *mut u8,
}

// SAFETY: `Allocator<P>` is sent wholesale between cores inside a
// `Locked<Allocator<P>>`; the lock -- not this impl -- is what makes
// concurrent access safe. The raw pointers here only ever address this
// allocator's own heap region.
unsafe impl<P: Send> Send for Allocator<P> {}

impl<P> Allocator<P> {
    /// Constructs an uninitialized allocator over `provider`. Call
    /// [`init`](Allocator::init) before any other operation.
    pub const fn new(provider: P) -> Self {
        Self {
            provider,
            index: FreeIndex::new(),
            heap_base: ptr::null_mut(),
            epilogue_hdr: ptr::null_mut(),
        }
    }

    pub(crate) fn index(&self) -> &FreeIndex {
        &self.index
    }

    /// Exposed for the monotonic-growth property check (SPEC_FULL §8, P7),
    /// which needs to read back how much the underlying provider has
    /// actually handed out.
    pub(crate) fn provider(&self) -> &P {
        &self.provider
    }

    pub(crate) fn heap_base(&self) -> *mut u8 {
        self.heap_base
    }

    pub(crate) fn epilogue_hdr(&self) -> *mut u8 {
        self.epilogue_hdr
    }

    pub(crate) fn within_bounds(&self, p: *mut u8) -> bool {
        !self.heap_base.is_null()
            && (p as usize) >= (self.heap_base as usize)
            && (p as usize) <= (self.epilogue_hdr as usize)
    }
}

impl<P: HeapProvider> Allocator<P> {
    /// Idempotent reset of allocator state: reserves the prologue,
    /// writes the initial epilogue, clears the size-class table, and
    /// requests a first extension of [`crate::config::CHUNK`] bytes.
    pub fn init(&mut self) -> Result<(), AllocError> {
        self.index.reset();

        let reserve = block::HEADER_SIZE + block::MIN_BLOCK_SIZE + block::HEADER_SIZE;
        let base = self.provider.extend(reserve).ok_or(AllocError::HeapExhausted)?;

        // One padding word, then the prologue block itself.
        let prologue = unsafe { base.add(block::HEADER_SIZE * 2) };
        unsafe {
            block::write_tags(prologue, block::MIN_BLOCK_SIZE, true);
        }
        self.heap_base = prologue;

        let epilogue_hdr = unsafe { block::next_block(prologue, block::MIN_BLOCK_SIZE).sub(block::HEADER_SIZE) };
        unsafe { block::write_epilogue(epilogue_hdr) };
        self.epilogue_hdr = epilogue_hdr;

        unsafe {
            grow::extend_heap(
                &mut self.provider,
                &mut self.index,
                self.heap_base,
                &mut self.epilogue_hdr,
                crate::config::CHUNK,
            )
            .ok_or(AllocError::HeapExhausted)?;
        }
        Ok(())
    }

    /// Core of `alloc`: assumes `n > 0`. Callers that need the
    /// zero-returns-null convention should go through
    /// [`alloc`](Allocator::alloc) instead.
    pub fn alloc_checked(&mut self, n: usize) -> Result<*mut u8, AllocError> {
        debug_assert!(!self.heap_base.is_null(), "Allocator::init must run first");
        let s = block::block_size_for(n);

        if let Some(p) = place::find_fit(&self.index, self.heap_base, s) {
            unsafe { self.place_block(p, s) };
            return Ok(p);
        }

        unsafe {
            grow::extend_heap(&mut self.provider, &mut self.index, self.heap_base, &mut self.epilogue_hdr, s)
                .ok_or(AllocError::HeapExhausted)?;
        }
        let p = place::find_fit(&self.index, self.heap_base, s)
            .expect("a freshly coalesced extension of >= s bytes must satisfy the request");
        unsafe { self.place_block(p, s) };
        Ok(p)
    }

    /// `alloc(n)`: `n == 0` returns null; otherwise delegates to
    /// [`alloc_checked`](Allocator::alloc_checked), converting failure to
    /// null.
    pub fn alloc(&mut self, n: usize) -> *mut u8 {
        if n == 0 {
            return ptr::null_mut();
        }
        self.alloc_checked(n).unwrap_or(ptr::null_mut())
    }

    /// Removes `p` from the free index, splits off a free tail if the
    /// remainder would itself be a legal block, otherwise consumes `p`
    /// whole.
    unsafe fn place_block(&mut self, p: *mut u8, s: usize) {
        unsafe {
            let c = block::size_of_block(p);
            self.index.remove(p, self.heap_base);

            if c - s > block::MIN_BLOCK_SIZE {
                block::write_tags(p, s, true);

                let tail = block::next_block(p, s);
                let tail_size = c - s;
                block::write_tags(tail, tail_size, false);
                coalesce::coalesce(&mut self.index, self.heap_base, tail);
            } else {
                block::write_tags(p, c, true);
            }
        }
    }

    /// Core of `free`: assumes `p` is non-null and was returned by this
    /// allocator and not already freed.
    pub unsafe fn free_raw(&mut self, p: *mut u8) {
        unsafe {
            let size = block::size_of_block(p);
            block::write_tags(p, size, false);
            block::clear_link_fields(p);
            coalesce::coalesce(&mut self.index, self.heap_base, p);
        }
    }

    /// `free(p)`: null is a no-op.
    pub fn free(&mut self, p: *mut u8) {
        if p.is_null() {
            return;
        }
        unsafe { self.free_raw(p) };
    }

    /// Core of `realloc`: assumes `p` is non-null and `n > 0`. Tries
    /// shrink-in-place, then growth-in-place against a free right
    /// neighbor, then falls back to allocate-copy-free. The copy length
    /// is always computed from payload sizes (never block sizes) and is
    /// therefore never at risk of the underflow this lineage's `realloc`
    /// is on record for (see `DESIGN.md`).
    pub fn realloc_checked(&mut self, p: *mut u8, n: usize) -> Result<*mut u8, AllocError> {
        unsafe {
            let old_size = block::size_of_block(p);
            let old_payload = block::payload_of(old_size);
            let new_block_size = block::block_size_for(n);

            if new_block_size <= old_size {
                let remainder = old_size - new_block_size;
                if remainder > block::MIN_BLOCK_SIZE {
                    block::write_tags(p, new_block_size, true);
                    let tail = block::next_block(p, new_block_size);
                    block::write_tags(tail, remainder, false);
                    coalesce::coalesce(&mut self.index, self.heap_base, tail);
                }
                return Ok(p);
            }

            let next = block::next_block(p, old_size);
            if !block::is_alloc(next) {
                let next_size = block::size_of_block(next);
                let combined = old_size + next_size;
                if combined >= new_block_size {
                    self.index.remove(next, self.heap_base);
                    let remainder = combined - new_block_size;
                    if remainder > block::MIN_BLOCK_SIZE {
                        block::write_tags(p, new_block_size, true);
                        let tail = block::next_block(p, new_block_size);
                        block::write_tags(tail, remainder, false);
                        coalesce::coalesce(&mut self.index, self.heap_base, tail);
                    } else {
                        block::write_tags(p, combined, true);
                    }
                    return Ok(p);
                }
            }

            let new_p = self.alloc_checked(n)?;
            let new_payload = block::payload_of(block::size_of_block(new_p));
            let copy_len = old_payload.min(new_payload);
            ptr::copy_nonoverlapping(p, new_p, copy_len);
            self.free_raw(p);
            Ok(new_p)
        }
    }

    /// `realloc(p, n)`: null `p` behaves as `alloc(n)`; `n == 0` frees `p`
    /// and returns null.
    pub fn realloc(&mut self, p: *mut u8, n: usize) -> *mut u8 {
        if p.is_null() {
            return self.alloc(n);
        }
        if n == 0 {
            self.free(p);
            return ptr::null_mut();
        }
        self.realloc_checked(p, n).unwrap_or(ptr::null_mut())
    }

    /// Core of `calloc`: checks the `nmemb * size` product for overflow
    /// before attempting any allocation, routes a zero product through the
    /// same null-returning convention as `alloc(0)` instead of consuming a
    /// real block, and checks allocation failure before zeroing -- all
    /// three are checks this lineage's own `calloc` is on record for
    /// skipping (see `DESIGN.md`).
    pub fn calloc_checked(&mut self, nmemb: usize, size: usize) -> Result<*mut u8, AllocError> {
        let total = nmemb.checked_mul(size).ok_or(AllocError::Overflow)?;
        if total == 0 {
            return Ok(ptr::null_mut());
        }
        let p = self.alloc_checked(total)?;
        unsafe { ptr::write_bytes(p, 0, total) };
        Ok(p)
    }

    /// `calloc(nmemb, size)`: overflow or allocation failure both surface
    /// as null.
    pub fn calloc(&mut self, nmemb: usize, size: usize) -> *mut u8 {
        self.calloc_checked(nmemb, size).unwrap_or(ptr::null_mut())
    }
}
