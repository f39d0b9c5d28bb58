//! Row-oriented layout of several [`BitMatrix`]es sharing a row count.

use crate::bitmatrix::BitMatrix;
use crate::block::Block;
use crate::error::ShapeError;

/// `nblocks` side-by-side [`BitMatrix`]es with identical `nrows`, presenting
/// each row as a tuple of per-block [`Block`]s.
///
/// Used to hold an MRHS system's M (or S) side jointly while echelonizing.
#[derive(Clone, Debug)]
pub struct BlockBitMatrix {
    blocks: Vec<BitMatrix>,
}

impl BlockBitMatrix {
    pub fn new(blocks: Vec<BitMatrix>) -> Result<Self, ShapeError> {
        if blocks.is_empty() {
            return Err(ShapeError::NoBlocks);
        }
        let expected = blocks[0].nrows();
        for (index, b) in blocks.iter().enumerate().skip(1) {
            if b.nrows() != expected {
                return Err(ShapeError::RowCountMismatch {
                    expected,
                    index,
                    got: b.nrows(),
                });
            }
        }
        Ok(BlockBitMatrix { blocks })
    }

    pub fn nblocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn nrows(&self) -> usize {
        self.blocks[0].nrows()
    }

    pub fn block(&self, i: usize) -> &BitMatrix {
        &self.blocks[i]
    }

    pub fn block_mut(&mut self, i: usize) -> &mut BitMatrix {
        &mut self.blocks[i]
    }

    pub fn blocks(&self) -> &[BitMatrix] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [BitMatrix] {
        &mut self.blocks
    }

    /// The full row `r`, one [`Block`] per constituent block matrix, in
    /// block order.
    pub fn row(&self, r: usize) -> Vec<Block> {
        self.blocks.iter().map(|b| b.row(r)).collect()
    }

    pub fn total_cols(&self) -> usize {
        self.blocks.iter().map(|b| b.ncols()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn rejects_mismatched_row_counts() {
        let a = BitMatrix::create(3, 2).unwrap();
        let b = BitMatrix::create(2, 2).unwrap();
        assert!(matches!(
            BlockBitMatrix::new(vec![a, b]),
            Err(ShapeError::RowCountMismatch { .. })
        ));
    }

    #[test]
    fn row_gathers_one_block_per_matrix() {
        let a = BitMatrix::from_rows(2, vec![Block(1), Block(2)]).unwrap();
        let b = BitMatrix::from_rows(2, vec![Block(3), Block(4)]).unwrap();
        let bbm = BlockBitMatrix::new(vec![a, b]).unwrap();
        assert!(bbm.row(1) == vec![Block(2), Block(4)]);
    }
}
