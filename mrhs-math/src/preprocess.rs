//! Gaussian echelonization across blocks and the linear/empty cleanup passes
//! that ride on top of it (spec.md sec 4.F).

use mrhs_core::{BitVector, ShapeError};
use tracing::{debug, instrument};

use crate::system::{BlockPair, MrhsSystem};

/// Row operations applied during [`echelonize`], as a dense `n x n` matrix:
/// row `i` records how the *original* row `i` was transformed into the
/// echelonized system's row `i`.
///
/// Represented as `Vec<BitVector>` rather than `mrhs_core::BitMatrix`
/// because `A` is `n x n` and `n` is unbounded, while `BitMatrix` caps
/// column width at the machine word (see DESIGN.md, "Cross-referencing M
/// and S columns").
pub type TransformMatrix = Vec<BitVector>;

fn identity_transform(n: usize) -> TransformMatrix {
    (0..n)
        .map(|i| {
            let mut row = BitVector::zeros(n);
            row.set(i, true);
            row
        })
        .collect()
}

fn swap_rows_everywhere(sys: &mut MrhsSystem, a: usize, b: usize, track: &mut Option<&mut TransformMatrix>) {
    if a == b {
        return;
    }
    for block in sys.blocks_mut() {
        let ra = block.m.row(a);
        let rb = block.m.row(b);
        block.m.set_row(a, rb);
        block.m.set_row(b, ra);
    }
    if let Some(t) = track.as_deref_mut() {
        t.swap(a, b);
    }
}

fn xor_row_everywhere(sys: &mut MrhsSystem, dst: usize, src: usize, track: &mut Option<&mut TransformMatrix>) {
    for block in sys.blocks_mut() {
        let s = block.m.row(src);
        let d = block.m.row(dst);
        block.m.set_row(dst, d ^ s);
    }
    if let Some(t) = track.as_deref_mut() {
        let src_row = t[src].clone();
        t[dst].xor_assign(&src_row);
    }
}

/// Gaussian echelonization of the joint `M` side, with column swaps to the
/// MSB side of each block propagated to the matching `S` side.
///
/// Returns the total pivot count `P`. Sets [`MrhsSystem::pivots`] to the
/// per-block pivot counts. `track`, if given, accumulates the row
/// operations performed into an `n x n` transform matrix (starting from the
/// identity).
#[instrument(skip(sys, track))]
pub fn echelonize(sys: &mut MrhsSystem, mut track: Option<&mut TransformMatrix>) -> Result<usize, ShapeError> {
    let n = sys.n();
    if let Some(t) = track.as_deref_mut() {
        *t = identity_transform(n);
    }

    let mut pivot_row = 0usize;
    let mut pivots = vec![0usize; sys.nblocks()];

    for b in 0..sys.nblocks() {
        let l = sys.block(b).m.ncols();
        let mut taken = 0usize;
        let mut scan_col = 0usize;

        while scan_col < l.saturating_sub(taken) {
            let found = (pivot_row..n).find(|&r| sys.block(b).m.get_bit(r, scan_col));
            match found {
                Some(row) => {
                    swap_rows_everywhere(sys, row, pivot_row, &mut track);
                    for r2 in 0..n {
                        if r2 != pivot_row && sys.block(b).m.get_bit(r2, scan_col) {
                            xor_row_everywhere(sys, r2, pivot_row, &mut track);
                        }
                    }
                    let target_col = l - 1 - taken;
                    if scan_col != target_col {
                        sys.block_mut(b).m.swap_columns(scan_col, target_col)?;
                        sys.block_mut(b).s.swap_columns(scan_col, target_col)?;
                    }
                    taken += 1;
                    pivot_row += 1;
                    // re-examine scan_col: its content changed via the swap above.
                }
                None => {
                    scan_col += 1;
                }
            }
        }
        pivots[b] = taken;
    }

    let total = pivot_row;
    debug!(total_pivots = total, "echelonize finished");
    sys.set_pivots(pivots);
    Ok(total)
}

/// Substitutes `x_row_v = c . x XOR rhs` throughout every block: wherever a
/// column has a `1` at row `row_v`, that bit is cleared, `c`'s rows are
/// XORed into the column, and `rhs` is XORed into every row of the matching
/// `S_i` column. Returns the number of columns touched.
///
/// The "add c" step is skipped when `c` has no set bits (spec.md sec 4.F.2's
/// "no-op if c is identically zero") — `row_v` is still cleared and `rhs`
/// is still propagated, since a constant substitution is not itself a no-op.
#[instrument(skip(sys, c))]
pub fn linear_substitution(sys: &mut MrhsSystem, row_v: usize, c: &BitVector, rhs: bool) -> usize {
    let n = sys.n();
    debug_assert_eq!(c.len(), n);
    let c_is_zero = c.popcount() == 0;
    let mut count = 0usize;

    for block in sys.blocks_mut() {
        let l = block.m.ncols();
        for col in 0..l {
            if !block.m.get_bit(row_v, col) {
                continue;
            }
            block.m.set_bit(row_v, col, false);
            if !c_is_zero {
                for r in 0..n {
                    if c.get(r) {
                        let cur = block.m.get_bit(r, col);
                        block.m.set_bit(r, col, !cur);
                    }
                }
            }
            if rhs {
                for srow in 0..block.s.nrows() {
                    let cur = block.s.get_bit(srow, col);
                    block.s.set_bit(srow, col, !cur);
                }
            }
            count += 1;
        }
    }
    count
}

/// For every block with exactly one allowed RHS (`k_i == 1`), extracts each
/// column as a linear equation and folds it into the rest of the system via
/// [`linear_substitution`]. The block itself is left in place (now reduced
/// towards all-zero); [`remove_empty`] drops it in a later pass.
#[instrument(skip(sys))]
pub fn remove_linear(sys: &mut MrhsSystem) -> usize {
    let n = sys.n();
    let linear_blocks: Vec<usize> = (0..sys.nblocks())
        .filter(|&i| sys.block(i).s.nrows() == 1)
        .collect();

    let mut total = 0;
    for i in linear_blocks {
        let l = sys.block(i).m.ncols();
        for col in 0..l {
            let column = match sys.block(i).m.get_column(col) {
                Ok(c) => c,
                Err(_) => continue,
            };
            if column.popcount() == 0 {
                continue;
            }
            let row_v = match (0..n).rev().find(|&r| column.get(r)) {
                Some(r) => r,
                None => continue,
            };
            let mut c = column;
            c.set(row_v, false);
            let rhs = sys.block(i).s.get_bit(0, col);
            total += linear_substitution(sys, row_v, &c, rhs);
        }
    }
    debug!(substitutions = total, "remove_linear finished");
    total
}

/// Drops blocks whose `M_i` is entirely zero, then compacts every surviving
/// block's rows down to the system-wide union of active rows. Returns the
/// number of blocks dropped; `sys.n()` becomes the popcount of that union.
#[instrument(skip(sys))]
pub fn remove_empty(sys: &mut MrhsSystem) -> Result<usize, ShapeError> {
    let n = sys.n();
    let mut active = BitVector::zeros(n);
    let mut keep = Vec::new();

    for (i, block) in sys.blocks().iter().enumerate() {
        let block_active = block.m.get_active_rows();
        if block_active.popcount() > 0 {
            active.or_assign(&block_active);
            keep.push(i);
        }
    }

    let removed = sys.nblocks() - keep.len();
    let mut new_blocks = Vec::with_capacity(keep.len());
    for i in keep {
        let block = &sys.blocks()[i];
        new_blocks.push(BlockPair {
            m: block.m.remove_rows(&active)?,
            s: block.s.clone(),
        });
    }
    *sys.blocks_mut() = new_blocks;
    sys.set_n(active.popcount());
    debug!(removed, new_n = sys.n(), "remove_empty finished");
    Ok(removed)
}
