//! The MRHS system data model: parallel (M, S) block pairs sharing a row
//! count `n`, plus the random fillers used to build test instances.

use mrhs_core::{BitMatrix, BitVector, Block, ShapeError};
use rand::Rng;
use tracing::instrument;

use crate::error::FillError;

/// One block's coefficient side `M_i` (shape `n x l_i`) paired with its
/// allowed right-hand-side set `S_i` (shape `k_i x l_i`).
#[derive(Clone, Debug)]
pub struct BlockPair {
    pub m: BitMatrix,
    pub s: BitMatrix,
}

/// Which structure to stamp into a block's `M_i` coefficient matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MFiller {
    Dense,
    SparseCols,
    AndCols { output_row: usize },
    /// An AND-gate block (spec.md sec 4.E's "sparse-AND-cols") whose three
    /// columns are placed with [`BitMatrix::random_sparse_cols`] instead of
    /// `AndCols`'s fixed rows 0/1/output_row: each of the 3 columns' single
    /// set bit lands in an independently-chosen variable row.
    AndColsSparse,
}

/// A sequence of `(M_i, S_i)` block pairs sharing a row dimension `n` on the
/// `M` side (spec.md sec 3).
#[derive(Clone, Debug)]
pub struct MrhsSystem {
    n: usize,
    blocks: Vec<BlockPair>,
    /// Pivot counts `p_i` per block, set by [`crate::preprocess::echelonize`].
    pivots: Option<Vec<usize>>,
}

impl MrhsSystem {
    /// Uniform block dimensions: every block gets the same `l`, `k`.
    pub fn create_fixed(n: usize, m: usize, l: usize, k: usize) -> Result<Self, ShapeError> {
        Self::create_variable(n, &vec![l; m], &vec![k; m])
    }

    /// `m == 0` yields an empty system.
    pub fn create_variable(n: usize, ls: &[usize], ks: &[usize]) -> Result<Self, ShapeError> {
        assert2::assert!(ls.len() == ks.len());
        let mut blocks = Vec::with_capacity(ls.len());
        for (&l, &k) in ls.iter().zip(ks.iter()) {
            blocks.push(BlockPair {
                m: BitMatrix::create(n, l)?,
                s: BitMatrix::create(k, l)?,
            });
        }
        Ok(MrhsSystem {
            n,
            blocks,
            pivots: None,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn set_n(&mut self, n: usize) {
        self.n = n;
    }

    pub fn nblocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, i: usize) -> &BlockPair {
        &self.blocks[i]
    }

    pub fn block_mut(&mut self, i: usize) -> &mut BlockPair {
        &mut self.blocks[i]
    }

    pub fn blocks(&self) -> &[BlockPair] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<BlockPair> {
        &mut self.blocks
    }

    pub fn pivots(&self) -> Option<&[usize]> {
        self.pivots.as_deref()
    }

    pub fn set_pivots(&mut self, pivots: Vec<usize>) {
        assert2::assert!(pivots.len() == self.blocks.len());
        self.pivots = Some(pivots);
    }

    pub fn is_echelonized(&self) -> bool {
        self.pivots.is_some()
    }

    fn check_index(&self, i: usize) -> Result<(), FillError> {
        if i >= self.blocks.len() {
            Err(FillError::BlockOutOfRange {
                index: i,
                nblocks: self.blocks.len(),
            })
        } else {
            Ok(())
        }
    }

    /// Stamp block `i`'s `M_i` with the requested random structure.
    pub fn fill_m(
        &mut self,
        i: usize,
        filler: MFiller,
        rng: &mut impl Rng,
    ) -> Result<(), FillError> {
        self.check_index(i)?;
        let l = self.blocks[i].m.ncols();
        self.blocks[i].m = match filler {
            MFiller::Dense => BitMatrix::random(self.n, l, rng)?,
            MFiller::SparseCols => BitMatrix::random_sparse_cols(self.n, l, rng)?,
            MFiller::AndCols { output_row } => {
                if l != 3 {
                    return Err(FillError::AndRequiresWidthThree { got: l });
                }
                BitMatrix::random_and_cols(self.n, l, output_row)?
            }
            MFiller::AndColsSparse => {
                if l != 3 {
                    return Err(FillError::AndRequiresWidthThree { got: l });
                }
                BitMatrix::random_sparse_cols(self.n, l, rng)?
            }
        };
        Ok(())
    }

    /// Stamp block `i`'s `S_i` with `k_i` pairwise-distinct random rows.
    pub fn fill_s_unique(&mut self, i: usize, rng: &mut impl Rng) -> Result<(), FillError> {
        self.check_index(i)?;
        let block = &self.blocks[i];
        let (k, l) = (block.s.nrows(), block.s.ncols());
        self.blocks[i].s = BitMatrix::random_unique(k, l, rng)?;
        Ok(())
    }

    /// Stamp block `i`'s `S_i` with the 4-row AND truth table
    /// `{000, 010, 100, 111}` over columns `(x, y, z = x & y)`.
    pub fn fill_s_and_truth_table(&mut self, i: usize) -> Result<(), FillError> {
        self.check_index(i)?;
        let block = &self.blocks[i];
        if block.s.ncols() != 3 {
            return Err(FillError::AndRequiresWidthThree {
                got: block.s.ncols(),
            });
        }
        if block.s.nrows() != 4 {
            return Err(FillError::AndRequiresFourRhs {
                got: block.s.nrows(),
            });
        }
        self.blocks[i].s =
            BitMatrix::from_rows(3, vec![Block(0b000), Block(0b010), Block(0b100), Block(0b111)])?;
        Ok(())
    }

    /// Builds a circuit of AND-gate blocks followed by `n_linear` plain
    /// pass-through (`l=1, k=1`) blocks. Per spec.md sec 4.E: "The AND
    /// fillers assume l_i = 3 and k_i = 4 for the first m-l blocks and
    /// impose n == k + m - l"; read here (documented in DESIGN.md) as
    /// `m` = total blocks, `l` = `n_linear`, `k` = 4 (the AND block's RHS
    /// row count). Violations are refused without mutating the system.
    pub fn fill_and_circuit(&mut self, n_linear: usize, rng: &mut impl Rng) -> Result<(), FillError> {
        let m = self.blocks.len();
        if n_linear > m {
            return Err(FillError::AndDimensionMismatch {
                n: self.n,
                m,
                l: n_linear,
                k: 4,
            });
        }
        let n_and = m - n_linear;
        for i in 0..n_and {
            if self.blocks[i].m.ncols() != 3 || self.blocks[i].s.ncols() != 3 {
                return Err(FillError::AndRequiresWidthThree {
                    got: self.blocks[i].m.ncols(),
                });
            }
            if self.blocks[i].s.nrows() != 4 {
                return Err(FillError::AndRequiresFourRhs {
                    got: self.blocks[i].s.nrows(),
                });
            }
        }
        for i in n_and..m {
            if self.blocks[i].m.ncols() != 1 || self.blocks[i].s.nrows() != 1 {
                return Err(FillError::AndDimensionMismatch {
                    n: self.n,
                    m,
                    l: n_linear,
                    k: 4,
                });
            }
        }
        if self.n != 4 + m - n_linear {
            return Err(FillError::AndDimensionMismatch {
                n: self.n,
                m,
                l: n_linear,
                k: 4,
            });
        }

        for i in 0..n_and {
            self.fill_m(i, MFiller::AndCols { output_row: 2 }, rng)?;
            self.fill_s_and_truth_table(i)?;
        }
        for i in n_and..m {
            self.blocks[i].m = BitMatrix::random_sparse_cols(self.n, 1, rng)?;
            self.blocks[i].s = BitMatrix::random_unique(1, 1, rng)?;
        }
        Ok(())
    }

    /// Picks a random `x in GF(2)^n` and guarantees `x . M_i in rows(S_i)`
    /// for every block, overwriting one `S_i` row when the computed RHS is
    /// absent. Returns the chosen `x`.
    #[instrument(skip(self, rng))]
    pub fn ensure_random_solution(&mut self, rng: &mut impl Rng) -> BitVector {
        let bits: Vec<bool> = (0..self.n).map(|_| rng.gen::<bool>()).collect();
        let x = BitVector::from_bits(bits);
        for block in self.blocks.iter_mut() {
            let r = apply(&x, &block.m);
            let pick_row = |nrows: usize| rng.gen_range(0..nrows);
            block.s.ensure_block_in(r, pick_row);
        }
        x
    }
}

/// `x . M`: the GF(2) row-vector by matrix product, as a packed [`Block`]
/// of width `m.ncols()`.
pub fn apply(x: &BitVector, m: &BitMatrix) -> Block {
    debug_assert_eq!(x.len(), m.nrows());
    let mut acc = Block::ZERO;
    for i in 0..x.len() {
        if x.get(i) {
            acc ^= m.row(i);
        }
    }
    acc.masked(m.ncols())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn create_fixed_has_matching_dims() {
        let sys = MrhsSystem::create_fixed(4, 3, 2, 5).unwrap();
        assert!(sys.nblocks() == 3);
        for b in sys.blocks() {
            assert!(b.m.nrows() == 4);
            assert!(b.m.ncols() == 2);
            assert!(b.s.ncols() == 2);
            assert!(b.s.nrows() == 5);
        }
    }

    #[test]
    fn create_variable_allows_heterogeneous_blocks() {
        let sys = MrhsSystem::create_variable(5, &[2, 3], &[1, 4]).unwrap();
        assert!(sys.block(0).m.ncols() == 2);
        assert!(sys.block(1).m.ncols() == 3);
        assert!(sys.block(1).s.nrows() == 4);
    }

    #[test]
    fn apply_is_xor_of_selected_rows() {
        let m = BitMatrix::from_rows(3, vec![Block(0b01), Block(0b10), Block(0b11)]).unwrap();
        let x = BitVector::from_bits([true, false, true]);
        assert!(apply(&x, &m) == Block(0b10));
    }

    #[test]
    fn ensure_random_solution_makes_rhs_reachable() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sys = MrhsSystem::create_fixed(4, 2, 2, 2).unwrap();
        for i in 0..sys.nblocks() {
            sys.fill_m(i, MFiller::Dense, &mut rng).unwrap();
            sys.fill_s_unique(i, &mut rng).unwrap();
        }
        let x = sys.ensure_random_solution(&mut rng);
        for block in sys.blocks() {
            let r = apply(&x, &block.m);
            assert!(block.s.rows().iter().any(|&row| row == r));
        }
    }

    #[test]
    fn and_cols_sparse_keeps_one_bit_per_column() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut sys = MrhsSystem::create_fixed(5, 1, 3, 4).unwrap();
        sys.fill_m(0, MFiller::AndColsSparse, &mut rng).unwrap();
        for col in 0..3 {
            let column = sys.block(0).m.get_column(col).unwrap();
            assert!(column.popcount() == 1);
        }
    }

    #[test]
    fn and_truth_table_matches_and_gate() {
        let mut sys = MrhsSystem::create_fixed(3, 1, 3, 4).unwrap();
        sys.fill_s_and_truth_table(0).unwrap();
        let rows: Vec<u64> = sys.block(0).s.rows().iter().map(|b| b.0).collect();
        assert!(rows == vec![0b000, 0b010, 0b100, 0b111]);
    }
}
