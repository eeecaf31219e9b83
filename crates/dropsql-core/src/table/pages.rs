//! Mapping of logical page numbers onto the descriptor's pointer array.
//!
//! ```text
//! pages [0, 10)                 pointers[0..10] address data pages directly
//! pages [10, 10+P)              pointers[10] -> index block -> data page
//! pages [10+P, 10+P+P^2)        pointers[11] -> index -> index -> data page
//! pages [10+P+P^2, ..+P^3)      pointers[12] -> index -> index -> index -> data page
//! ```
//! where `P = POINTERS_PER_BLOCK`.

use crate::error::RecordError;
use crate::types::{DIRECT_POINTERS, INDIRECT_LEVELS, POINTERS_PER_BLOCK};

const P: u64 = POINTERS_PER_BLOCK as u64;

/// Route from the descriptor to one data page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePath {
    /// Index into the descriptor's pointer array.
    pub root: usize,
    slots: [usize; INDIRECT_LEVELS],
    depth: usize,
}

impl PagePath {
    /// Pointer slots to follow through index blocks, outermost first.
    pub fn slots(&self) -> &[usize] {
        &self.slots[..self.depth]
    }

    /// Number of index blocks between the descriptor and the data page.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Resolve a logical page number into its indirection path.
pub fn locate(page: u64) -> Result<PagePath, RecordError> {
    if page < DIRECT_POINTERS as u64 {
        return Ok(PagePath {
            root: page as usize,
            slots: [0; INDIRECT_LEVELS],
            depth: 0,
        });
    }

    let mut rest = page - DIRECT_POINTERS as u64;
    let mut span = P;
    for level in 1..=INDIRECT_LEVELS {
        if rest < span {
            let mut slots = [0; INDIRECT_LEVELS];
            let mut remainder = rest;
            for i in (0..level).rev() {
                slots[i] = (remainder % P) as usize;
                remainder /= P;
            }
            return Ok(PagePath {
                root: DIRECT_POINTERS + level - 1,
                slots,
                depth: level,
            });
        }
        rest -= span;
        span *= P;
    }

    Err(RecordError::PageOutOfRange { page })
}
