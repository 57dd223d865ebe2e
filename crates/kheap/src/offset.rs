//! A typed arena reference, the way the donor kernel gives physical and
//! virtual addresses their own newtypes instead of passing bare `usize`s.
//!
//! Free-list links are stored on-heap as 32-bit offsets from `heap_base`
//! rather than native pointers, so a doubly-linked free block only spends
//! 8 bytes of its payload on list pointers even on a 64-bit target.
//! `Offset(0)` always means "no link" — the prologue block sits at offset 0
//! but is never a free-list node, so the value is never ambiguous.

use core::fmt;

#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Offset(u32);

impl Offset {
    pub const NULL: Offset = Offset(0);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        Offset(raw)
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Offset(null)")
        } else {
            write!(f, "Offset({:#x})", self.0)
        }
    }
}
