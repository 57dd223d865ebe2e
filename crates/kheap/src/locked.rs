//! `Locked<T>`: a ticket spinlock guarding the single-threaded core so
//! this crate can be dropped in as a `#[global_allocator]`.
//!
//! Adapted from the donor kernel's `sync::spinlock` ticket lock (two
//! `AtomicU32` counters, an RAII guard). The donor's IRQ-disable/restore
//! dance around `cli`/`sti` is dropped here: this crate does not assume
//! it runs in ring 0 or on any particular architecture, only that
//! `GlobalAlloc` may be called from concurrent call sites (see
//! `DESIGN.md` for this trim).

use core::alloc::{GlobalAlloc, Layout};
use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU32, Ordering};

use crate::allocator::Allocator;
use crate::block;
use crate::extend::HeapProvider;

pub struct Locked<T> {
    next_ticket: AtomicU32,
    now_serving: AtomicU32,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for Locked<T> {}
unsafe impl<T: Send> Sync for Locked<T> {}

impl<T> Locked<T> {
    pub const fn new(value: T) -> Self {
        Self {
            next_ticket: AtomicU32::new(0),
            now_serving: AtomicU32::new(0),
            data: UnsafeCell::new(value),
        }
    }

    /// Acquires the lock, spinning with [`core::hint::spin_loop`] while
    /// held by another caller. FIFO: callers are served in arrival order.
    pub fn lock(&self) -> LockedGuard<'_, T> {
        let my_ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        while self.now_serving.load(Ordering::Acquire) != my_ticket {
            core::hint::spin_loop();
        }
        LockedGuard { lock: self }
    }
}

pub struct LockedGuard<'a, T> {
    lock: &'a Locked<T>,
}

impl<T> Deref for LockedGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for LockedGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for LockedGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.now_serving.fetch_add(1, Ordering::Release);
    }
}

/// Translates `Layout` into this crate's `usize`-sized block requests and
/// back; the only place in the crate `Layout` is seen. The core
/// operations (`Allocator::alloc`/`free`/etc.) work in plain byte counts.
///
/// Alignments beyond 8 bytes are not honored by the core layout (every
/// payload is 8-byte aligned by construction, never more); callers
/// requesting a stricter alignment than 8 will not get it from this
/// allocator.
unsafe impl<P: HeapProvider> GlobalAlloc for Locked<Allocator<P>> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = layout.align();
        self.lock().alloc(layout.size())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        self.lock().free(ptr)
    }

    unsafe fn realloc(&self, ptr: *mut u8, _layout: Layout, new_size: usize) -> *mut u8 {
        self.lock().realloc(ptr, new_size)
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        self.lock().calloc(1, layout.size())
    }
}

/// `align8` is re-exported through this module's import for callers
/// building their own `Layout` translation on top of `Locked`.
pub use block::align8;
