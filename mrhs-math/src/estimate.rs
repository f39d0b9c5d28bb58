//! Cost estimators (spec.md sec 4.I): pure functions of an echelonized
//! system's per-block shape that predict the search's total work and XOR
//! count, for benchmarking and algorithmic tuning.

use crate::solve::ActiveListEntry;
use crate::system::MrhsSystem;

/// Per-block shape after echelonization: `l_i` (width), `p_i` (pivots) and
/// `|S_i|` (distinct RHS count) — everything the formulas in spec.md sec
/// 4.I need, and nothing the estimators have to recompute from the raw
/// matrices themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockStats {
    pub l: usize,
    pub p: usize,
    pub s_count: usize,
}

impl BlockStats {
    pub fn from_system(sys: &MrhsSystem) -> Vec<BlockStats> {
        let pivots = sys.pivots().unwrap_or(&[]);
        sys.blocks()
            .iter()
            .enumerate()
            .map(|(i, block)| BlockStats {
                l: block.m.ncols(),
                p: pivots.get(i).copied().unwrap_or(0),
                s_count: block.s.nrows(),
            })
            .collect()
    }

    /// Same stats read directly off a prepared table, for callers who have
    /// already discarded the system but kept its `ActiveListEntry`s.
    pub fn from_ales(ales: &[ActiveListEntry]) -> Vec<BlockStats> {
        ales.iter()
            .map(|ale| BlockStats {
                l: ale.width,
                p: ale.pivots,
                s_count: ale.entry_count(),
            })
            .collect()
    }
}

/// `Pi_i = product_{j=1..i-1} |S_j| . 2^(p_j - l_j)`, 1-indexed per spec.md
/// sec 4.I; `blocks[0]` is block 1. Returns one entry per block, `pi[0] = 1`
/// (the empty product).
fn partial_products(blocks: &[BlockStats]) -> Vec<f64> {
    let mut pi = vec![1.0f64; blocks.len()];
    let mut acc = 1.0f64;
    for (i, stats) in blocks.iter().enumerate() {
        pi[i] = acc;
        acc *= stats.s_count as f64 * 2f64.powi(stats.p as i32 - stats.l as i32);
    }
    pi
}

/// `Ntotal = sum_{i=2..m} Pi_i`: the expected number of candidates the
/// search will walk through in total.
pub fn get_expected(blocks: &[BlockStats]) -> f64 {
    let pi = partial_products(blocks);
    pi.iter().skip(1).sum()
}

/// `Nxor (upper bound) = sum_{i=2..m} (m - i + 1) . Pi_i`.
pub fn get_xor1(blocks: &[BlockStats]) -> f64 {
    let m = blocks.len();
    let pi = partial_products(blocks);
    (1..m).map(|i| ((m - i) as f64) * pi[i]).sum()
}

/// `Nxored (effective, with pruning) = sum_{i=2..m} (1 - 2^-p_{i-1}) . (m -
/// i + 1) . Pi_i`.
pub fn get_xor2(blocks: &[BlockStats]) -> f64 {
    let m = blocks.len();
    let pi = partial_products(blocks);
    (1..m)
        .map(|i| {
            let prune = 1.0 - 2f64.powi(-(blocks[i - 1].p as i32));
            prune * ((m - i) as f64) * pi[i]
        })
        .sum()
}
