//! Rows-of-[`Block`] matrix with at most [`WORD_BITS`] columns.

use crate::bitvec::BitVector;
use crate::block::{Block, WORD_BITS};
use crate::error::ShapeError;

/// A dense `nrows x ncols` matrix over GF(2), `ncols <= 64`, each row packed
/// into a single [`Block`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BitMatrix {
    ncols: usize,
    rows: Vec<Block>,
}

impl BitMatrix {
    pub fn create(nrows: usize, ncols: usize) -> Result<Self, ShapeError> {
        if ncols > WORD_BITS {
            return Err(ShapeError::BlockTooWide {
                ncols,
                max: WORD_BITS,
            });
        }
        Ok(BitMatrix {
            ncols,
            rows: vec![Block::ZERO; nrows],
        })
    }

    pub fn from_rows(ncols: usize, rows: Vec<Block>) -> Result<Self, ShapeError> {
        if ncols > WORD_BITS {
            return Err(ShapeError::BlockTooWide {
                ncols,
                max: WORD_BITS,
            });
        }
        let masked = rows.into_iter().map(|r| r.masked(ncols)).collect();
        Ok(BitMatrix {
            ncols,
            rows: masked,
        })
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn row(&self, i: usize) -> Block {
        self.rows[i]
    }

    pub fn rows(&self) -> &[Block] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Block] {
        &mut self.rows
    }

    pub fn set_row(&mut self, i: usize, value: Block) {
        self.rows[i] = value.masked(self.ncols);
    }

    #[inline]
    pub fn get_bit(&self, row: usize, col: usize) -> bool {
        debug_assert!(col < self.ncols);
        self.rows[row].bit(col)
    }

    #[inline]
    pub fn set_bit(&mut self, row: usize, col: usize, value: bool) {
        debug_assert!(col < self.ncols);
        self.rows[row] = self.rows[row].with_bit_set(col, value);
    }

    /// XOR `col`'s source column into `dst` across every row: row\[dst\] ^= row\[col\].
    pub fn add_column(&mut self, dst: usize, src: usize) -> Result<(), ShapeError> {
        self.check_col(dst)?;
        self.check_col(src)?;
        for r in self.rows.iter_mut() {
            let bit = r.bit(src);
            *r = r.with_bit_set(dst, r.bit(dst) ^ bit);
        }
        Ok(())
    }

    pub fn swap_columns(&mut self, a: usize, b: usize) -> Result<(), ShapeError> {
        self.check_col(a)?;
        self.check_col(b)?;
        if a == b {
            return Ok(());
        }
        for r in self.rows.iter_mut() {
            let ba = r.bit(a);
            let bb = r.bit(b);
            *r = r.with_bit_set(a, bb).with_bit_set(b, ba);
        }
        Ok(())
    }

    /// Column `col` read out as one bit per row, MSB-first row 0 at index 0.
    pub fn get_column(&self, col: usize) -> Result<BitVector, ShapeError> {
        self.check_col(col)?;
        let mut bv = BitVector::zeros(self.rows.len());
        for (i, r) in self.rows.iter().enumerate() {
            bv.set(i, r.bit(col));
        }
        Ok(bv)
    }

    /// Mask of rows that have at least one set bit.
    pub fn get_active_rows(&self) -> BitVector {
        let mut bv = BitVector::zeros(self.rows.len());
        for (i, r) in self.rows.iter().enumerate() {
            bv.set(i, !r.is_zero());
        }
        bv
    }

    /// Keep only the rows whose corresponding `mask` bit is 1, renumbering.
    pub fn remove_rows(&self, mask: &BitVector) -> Result<Self, ShapeError> {
        if mask.len() != self.rows.len() {
            return Err(ShapeError::MaskLengthMismatch {
                mask_len: mask.len(),
                nrows: self.rows.len(),
            });
        }
        let rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(i, _)| mask.get(*i))
            .map(|(_, r)| *r)
            .collect();
        Ok(BitMatrix {
            ncols: self.ncols,
            rows,
        })
    }

    /// If `v` is not already a row, overwrite a pseudo-randomly chosen row
    /// with it. `pick` selects which row index to overwrite when absent.
    pub fn ensure_block_in(&mut self, v: Block, pick: impl FnOnce(usize) -> usize) {
        let v = v.masked(self.ncols);
        if self.rows.iter().any(|&r| r == v) {
            return;
        }
        if self.rows.is_empty() {
            return;
        }
        let idx = pick(self.rows.len());
        self.rows[idx] = v;
    }

    pub fn rows_are_unique(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.rows.len());
        self.rows.iter().all(|r| seen.insert(r.0))
    }

    fn check_col(&self, col: usize) -> Result<(), ShapeError> {
        if col >= self.ncols {
            Err(ShapeError::ColumnOutOfRange {
                col,
                ncols: self.ncols,
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(feature = "rand")]
mod random {
    use super::*;
    use rand::Rng;

    impl BitMatrix {
        /// Every bit independently uniform.
        pub fn random(nrows: usize, ncols: usize, rng: &mut impl Rng) -> Result<Self, ShapeError> {
            let mut bm = BitMatrix::create(nrows, ncols)?;
            for r in bm.rows.iter_mut() {
                *r = Block(rng.gen::<u64>()).masked(ncols);
            }
            Ok(bm)
        }

        /// Each row a uniform draw, redrawn on collision until all `nrows`
        /// rows are pairwise distinct. Precondition: `nrows <= 2^ncols`.
        pub fn random_unique(
            nrows: usize,
            ncols: usize,
            rng: &mut impl Rng,
        ) -> Result<Self, ShapeError> {
            let capacity = 1u128 << ncols.min(100);
            if (nrows as u128) > capacity {
                return Err(ShapeError::TooManyUniqueRows { nrows, ncols });
            }
            let mut bm = BitMatrix::create(nrows, ncols)?;
            let mut seen = std::collections::HashSet::with_capacity(nrows);
            for r in bm.rows.iter_mut() {
                loop {
                    let candidate = Block(rng.gen::<u64>()).masked(ncols);
                    if seen.insert(candidate.0) {
                        *r = candidate;
                        break;
                    }
                }
            }
            Ok(bm)
        }

        /// Each of the `ncols` columns has exactly one `1`, in an
        /// independently chosen row.
        pub fn random_sparse_cols(
            nrows: usize,
            ncols: usize,
            rng: &mut impl Rng,
        ) -> Result<Self, ShapeError> {
            let mut bm = BitMatrix::create(nrows, ncols)?;
            if nrows == 0 {
                return Ok(bm);
            }
            for col in 0..ncols {
                let row = rng.gen_range(0..nrows);
                bm.set_bit(row, col, true);
            }
            Ok(bm)
        }

        /// AND-gate structure: fixed rows parameterizing an AND-of-two-inputs
        /// gate whose output lands in row `output_row`.
        ///
        /// Precondition `ncols == 3` and `output_row < nrows` (needs at
        /// least rows 0, 1 and `output_row` to exist) is a shape error, not
        /// a panic, per the "shape errors are absorbed" policy.
        pub fn random_and_cols(nrows: usize, ncols: usize, output_row: usize) -> Result<Self, ShapeError> {
            if ncols != 3 {
                return Err(ShapeError::BlockTooWide { ncols, max: 3 });
            }
            if output_row >= nrows || nrows < 2 {
                return Err(ShapeError::RowOutOfRange {
                    row: output_row,
                    nrows,
                });
            }
            let mut bm = BitMatrix::create(nrows, ncols)?;
            // identity on the two inputs, the output row selects the third column.
            bm.set_bit(0, 0, true);
            bm.set_bit(1, 1, true);
            bm.set_bit(output_row, 2, true);
            Ok(bm)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn create_rejects_overwide_columns() {
        assert!(matches!(
            BitMatrix::create(1, 100),
            Err(ShapeError::BlockTooWide { .. })
        ));
    }

    #[test]
    fn swap_columns_is_its_own_inverse() {
        let mut bm = BitMatrix::from_rows(3, vec![Block(0b001), Block(0b010), Block(0b100)]).unwrap();
        bm.swap_columns(0, 2).unwrap();
        assert!(bm.get_column(0).unwrap() == BitVector::from_bits([false, false, true]));
        bm.swap_columns(0, 2).unwrap();
        assert!(bm.get_bit(0, 0));
    }

    #[test]
    fn add_column_xors_into_destination() {
        let mut bm = BitMatrix::from_rows(2, vec![Block(0b01), Block(0b11)]).unwrap();
        bm.add_column(1, 0).unwrap();
        assert!(bm.get_bit(0, 1));
        assert!(!bm.get_bit(1, 1));
    }

    #[test]
    fn get_active_rows_flags_nonzero_rows() {
        let bm = BitMatrix::from_rows(3, vec![Block(0), Block(1), Block(0)]).unwrap();
        let active = bm.get_active_rows();
        assert!(active.iter().collect::<Vec<_>>() == vec![false, true, false]);
    }

    #[test]
    fn remove_rows_compacts_by_mask() {
        let bm = BitMatrix::from_rows(3, vec![Block(1), Block(2), Block(3)]).unwrap();
        let mask = BitVector::from_bits([true, false, true]);
        let kept = bm.remove_rows(&mask).unwrap();
        assert!(kept.nrows() == 2);
        assert!(kept.row(0) == Block(1));
        assert!(kept.row(1) == Block(3));
    }

    #[test]
    fn ensure_block_in_is_noop_when_present() {
        let mut bm = BitMatrix::from_rows(2, vec![Block(1), Block(2)]).unwrap();
        bm.ensure_block_in(Block(2), |_| 0);
        assert!(bm.row(0) == Block(1));
    }

    #[test]
    fn ensure_block_in_overwrites_when_absent() {
        let mut bm = BitMatrix::from_rows(2, vec![Block(1), Block(2)]).unwrap();
        bm.ensure_block_in(Block(3), |_| 0);
        assert!(bm.row(0) == Block(3));
    }
}
