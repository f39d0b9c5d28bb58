//! Per-block lookup tables (spec.md sec 4.G): [`ActiveListEntry`] owns a
//! flat arena of [`TableEntry`] plus a LUT of bucket heads keyed by the
//! low (index) bits of a candidate RHS row.

use std::collections::HashSet;

use mrhs_core::{Block, BitVector};
use tracing::debug;

use crate::error::SolveError;
use crate::system::MrhsSystem;

/// One compatible RHS candidate for a block, pre-bucketed by its index
/// bits. `pivot_part` is the entry's high (pivot) bits in isolation — the
/// piece that pins down this block's own pivot variables once chosen.
///
/// `sm_row` from spec.md sec 4.G ("non-owning pointer to the pivot-part
/// row of M") is realized here as `pivot_part`, a value copied by hand
/// rather than a pointer into the echelonized matrix (see DESIGN.md,
/// "Non-owning pointers inside TableEntry").
#[derive(Clone, Copy, Debug)]
pub struct TableEntry {
    pub value: Block,
    pub pivot_part: Block,
    /// Block index from which this entry's pivot-part is distinguishable
    /// from the other entries in its bucket; consulted only when the
    /// `first-pruning` feature is enabled. See DESIGN.md for why this is
    /// a conservative placeholder rather than a derived pruning bound.
    pub first: usize,
    pub(crate) next: Option<u32>,
}

/// Per-block search state: the static lookup table built by [`prepare`]
/// plus the mutable cursor/val the engine advances while walking it.
#[derive(Clone, Debug)]
pub struct ActiveListEntry {
    pub width: usize,
    pub pivots: usize,
    /// First variable row owned by this block's pivots, i.e. `sum(p_j)`
    /// for `j` < this block's index.
    pub row_offset: usize,
    pub mask: Block,
    lut: Vec<Option<u32>>,
    entries: Vec<TableEntry>,
    /// The RHS value currently assigned to this block in the walk.
    pub val: Block,
    /// Cursor into the current LUT bucket; `None` means exhausted.
    pub cursor: Option<u32>,
}

impl ActiveListEntry {
    pub fn bucket_head(&self, idx: usize) -> Option<u32> {
        self.lut[idx]
    }

    pub fn entry(&self, id: u32) -> &TableEntry {
        &self.entries[id as usize]
    }

    pub fn lut_len(&self) -> usize {
        self.lut.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Reads this block's chosen `val`'s pivot bits off into `x`, using the
    /// column permutation established by echelonization (pivot `k` of this
    /// block sits at bit `width - 1 - k`, owning variable row `row_offset +
    /// k`).
    pub fn assign_into(&self, x: &mut BitVector) {
        for k in 0..self.pivots {
            let bit_pos = self.width - 1 - k;
            x.set(self.row_offset + k, self.val.bit(bit_pos));
        }
    }

    pub fn clear_from(&self, x: &mut BitVector) {
        for k in 0..self.pivots {
            x.set(self.row_offset + k, false);
        }
    }
}

fn next_of(ale: &ActiveListEntry, id: u32) -> Option<u32> {
    ale.entries[id as usize].next
}

/// Advances `ale.cursor` to the next entry in the current bucket's chain.
pub fn advance(ale: &mut ActiveListEntry) {
    ale.cursor = ale.cursor.and_then(|id| next_of(ale, id));
}

/// The `first-pruning`-gated search check: `true` means `entry` could be
/// skipped at `depth` without losing any solution, per spec.md sec 4.G's
/// `first` field ("the first block where this row's pivot-part becomes
/// distinguishable"). Only compiled in under the `first-pruning` feature
/// (see DESIGN.md Open Question 3).
///
/// `prepare` always sets `first` to the conservative sentinel `sys.nblocks()`,
/// which is `> depth` for every reachable depth, so this is a real but
/// currently-always-false check: enabling the feature exercises this code
/// path without pruning anything, until a correct, paper-derived condition
/// replaces the sentinel.
#[cfg(feature = "first-pruning")]
pub fn prunable(entry: &TableEntry, depth: usize) -> bool {
    entry.first <= depth
}

/// Builds one [`ActiveListEntry`] per block from an echelonized system.
/// Bucket-sorts each block's `S_i` rows by their index-part bits,
/// deduplicating exact repeats defensively (spec.md sec 4.G / sec 7
/// `DuplicateRHS`).
pub fn prepare(sys: &MrhsSystem) -> Result<Vec<ActiveListEntry>, SolveError> {
    let pivots = sys.pivots().ok_or(SolveError::NotEchelonized)?;
    let mut row_offset = 0usize;
    let mut ales = Vec::with_capacity(sys.nblocks());

    for (i, block) in sys.blocks().iter().enumerate() {
        let p = pivots[i];
        let l = block.m.ncols();
        let index_bits = l - p;
        let mask = Block::low_mask(index_bits);
        let lut_len = 1usize << index_bits;
        let mut lut: Vec<Option<u32>> = vec![None; lut_len];
        let mut entries = Vec::with_capacity(block.s.nrows());
        let mut seen = HashSet::with_capacity(block.s.nrows());

        for row_idx in 0..block.s.nrows() {
            let value = block.s.row(row_idx).masked(l);
            if !seen.insert(value.0) {
                debug!(block = i, row = row_idx, "prepare: dropping duplicate RHS row");
                continue;
            }
            let idx = (value.0 & mask.0) as usize;
            let pivot_part = Block(value.0 & !mask.0);
            let id = entries.len() as u32;
            let head = lut[idx];
            entries.push(TableEntry {
                value,
                pivot_part,
                first: sys.nblocks(),
                next: head,
            });
            lut[idx] = Some(id);
        }

        ales.push(ActiveListEntry {
            width: l,
            pivots: p,
            row_offset,
            mask,
            lut,
            entries,
            val: Block::ZERO,
            cursor: None,
        });
        row_offset += p;
    }
    Ok(ales)
}

/// Releases the tables. A plain drop suffices in safe Rust; kept as a named
/// entry point mirroring the teacher idiom of an explicit release step.
pub fn free_ales(ales: Vec<ActiveListEntry>) {
    drop(ales);
}
