//! The placement engine: bounded best-fit over the segregated free index.
//!
//! Pure best-fit minimizes internal fragmentation but costs O(n) per
//! placement; pure first-fit is O(1) amortized but leaves large splinter
//! blocks behind. Scanning a short prefix of candidates captures most of
//! best-fit's quality at close to first-fit's cost.

use crate::config::{NUM_CLASSES, SEARCH_BOUND};
use crate::freelist::FreeIndex;

/// Finds a free block of size `>= s`, starting at the smallest class that
/// could hold `s` and widening outward. Within a class, collects
/// candidates until both a fit has been found and `SEARCH_BOUND` blocks
/// have been examined, then keeps the smallest of those seen. Returns the
/// payload pointer of the chosen block, or `None` if nothing fits.
pub fn find_fit(index: &FreeIndex, heap_base: *mut u8, s: usize) -> Option<*mut u8> {
    let start_class = FreeIndex::class_of(s);

    for class in start_class..NUM_CLASSES {
        let mut best: Option<(*mut u8, usize)> = None;
        let mut examined = 0usize;

        for p in index.iter_class(class, heap_base) {
            let size = unsafe { crate::block::size_of_block(p) };
            examined += 1;
            if size >= s {
                let better = match best {
                    Some((_, best_size)) => size < best_size,
                    None => true,
                };
                if better {
                    best = Some((p, size));
                }
            }
            if best.is_some() && examined >= SEARCH_BOUND {
                break;
            }
        }

        if let Some((p, size)) = best {
            log::trace!(
                "place: class {} satisfied request of {} with block {:p} (size {}, examined {})",
                class, s, p, size, examined
            );
            return Some(p);
        }
    }

    log::debug!("place: no fit for request of {} bytes across {} classes", s, NUM_CLASSES - start_class);
    None
}
