//! Non-recursive backtracking search over blocks (spec.md sec 4.H).
//!
//! The walk maintains one full-width `x` vector across the whole search
//! rather than the paper's per-depth `Block`-sized XOR accumulator: blocks
//! can have different widths `l_i`, so a single `Block`-sized running value
//! keyed per depth does not generalize cleanly. Recomputing `x . M_d`'s
//! masked projection at each descent is the direct, width-agnostic
//! equivalent; see DESIGN.md, "Solver engine accumulator", for the full
//! writeup of this deviation and why it is still correct for the case
//! spec.md's own cost estimators assume (free-bit dependencies resolved by
//! strictly earlier blocks).

use mrhs_core::BitVector;
use tracing::instrument;

use crate::solve::tables::{advance, ActiveListEntry};
use crate::system::{apply, MrhsSystem};

/// Receives one solution at a time during [`solve`]. Must not mutate the
/// ALE array or the system it's handed.
///
/// `x` is handed over already reconstructed (every pivot-owned row filled in
/// via the column permutation recorded during echelonization) rather than
/// leaving that reconstruction to the callback: the engine already tracks
/// `x` incrementally across the walk to compute each depth's `x . M_d`, so
/// redoing `ale.val` + permutation arithmetic a second time per callback
/// invocation would just repeat work already done. `sys` and `ales` are
/// still passed through so a sink that wants to double-check or recompute
/// the assignment independently (e.g. a verifier comparing against brute
/// force) can.
pub trait SolutionSink {
    fn report(&mut self, counter: u64, x: &BitVector, sys: &MrhsSystem, ales: &[ActiveListEntry]);
}

/// Accumulates reported solutions into a `Vec<BitVector>`. Convenient for
/// tests and small instances; a real caller with many solutions should
/// implement [`SolutionSink`] directly to stream them instead.
#[derive(Default)]
pub struct CollectSolutions {
    pub solutions: Vec<BitVector>,
}

impl SolutionSink for CollectSolutions {
    fn report(&mut self, _counter: u64, x: &BitVector, _sys: &MrhsSystem, _ales: &[ActiveListEntry]) {
        self.solutions.push(x.clone());
    }
}

fn begin(depth: usize, ales: &mut [ActiveListEntry], sys: &MrhsSystem, x: &BitVector, xors: &mut u64) {
    let block = sys.block(depth);
    let predicted = apply(x, &block.m);
    *xors += x.popcount() as u64;
    let idx = (predicted.0 & ales[depth].mask.0) as usize;
    ales[depth].cursor = ales[depth].bucket_head(idx);
}

/// Walks every block 0..m, backtracking on RHS choices, reporting each full
/// assignment through `sink`. `counter` and `xors` accumulate across the
/// call (callers wanting a fresh tally should zero them first).
#[instrument(skip(ales, sys, counter, xors, sink))]
pub fn solve(
    ales: &mut [ActiveListEntry],
    sys: &MrhsSystem,
    counter: &mut u64,
    xors: &mut u64,
    sink: &mut impl SolutionSink,
) {
    let m = ales.len();
    let n = sys.n();

    // Zero blocks is DegenerateInput (spec.md sec 7): report zero solutions,
    // not a trivial all-zero one.
    if m == 0 {
        return;
    }

    let mut x = BitVector::zeros(n);
    let mut depth = 0usize;
    begin(0, ales, sys, &x, xors);

    loop {
        match ales[depth].cursor {
            Some(id) => {
                let entry = *ales[depth].entry(id);

                #[cfg(feature = "first-pruning")]
                if crate::solve::tables::prunable(&entry, depth) {
                    advance(&mut ales[depth]);
                    continue;
                }

                ales[depth].val = entry.value;
                ales[depth].assign_into(&mut x);

                if depth + 1 == m {
                    *counter += 1;
                    sink.report(*counter, &x, sys, ales);
                    advance(&mut ales[depth]);
                } else {
                    depth += 1;
                    begin(depth, ales, sys, &x, xors);
                }
            }
            None => {
                if depth == 0 {
                    break;
                }
                ales[depth].clear_from(&mut x);
                depth -= 1;
                advance(&mut ales[depth]);
            }
        }
    }
}

/// Opt-in multi-branch solving: partitions depth-0's candidates across a
/// rayon thread pool, each branch running an independent [`solve`] over the
/// remaining blocks. Only the aggregate solution count is collected, since
/// merging per-thread callback state safely is left to the caller's own
/// `SolutionSink` if it needs the individual solutions (construct one
/// `solve` call per branch directly in that case).
#[cfg(feature = "parallel")]
pub fn solve_parallel(ales: &[ActiveListEntry], sys: &MrhsSystem) -> (u64, u64) {
    use rayon::prelude::*;

    // Zero blocks is DegenerateInput (spec.md sec 7): zero solutions, matching `solve`.
    if ales.is_empty() {
        return (0, 0);
    }

    // x = 0 at depth 0, so the only reachable bucket is index 0; every entry
    // chained off it is one disjoint depth-0 branch (sec 5: "each ALE branch
    // descends into a disjoint subtree").
    let mut depth0_ids = Vec::new();
    let mut cursor = ales[0].bucket_head(0);
    while let Some(id) = cursor {
        depth0_ids.push(id);
        cursor = ales[0].entry(id).next;
    }

    let totals: Vec<(u64, u64)> = depth0_ids
        .into_par_iter()
        .map(|id| {
            let mut local = ales.to_vec();
            local[0].val = local[0].entry(id).value;
            let mut x = BitVector::zeros(sys.n());
            local[0].assign_into(&mut x);

            let mut counter = 0u64;
            let mut xors = 0u64;
            let mut sink = CollectSolutions::default();
            if local.len() == 1 {
                counter += 1;
                sink.report(counter, &x, sys, &local);
            } else {
                solve_from_depth1(&mut local, sys, &x, &mut counter, &mut xors, &mut sink);
            }
            (counter, xors)
        })
        .collect();

    totals
        .into_iter()
        .fold((0, 0), |(c, xo), (c2, xo2)| (c + c2, xo + xo2))
}

#[cfg(feature = "parallel")]
fn solve_from_depth1(
    ales: &mut [ActiveListEntry],
    sys: &MrhsSystem,
    x0: &BitVector,
    counter: &mut u64,
    xors: &mut u64,
    sink: &mut impl SolutionSink,
) {
    let m = ales.len();
    let mut x = x0.clone();
    let mut depth = 1usize;
    begin(1, ales, sys, &x, xors);

    loop {
        match ales[depth].cursor {
            Some(id) => {
                let entry = *ales[depth].entry(id);
                ales[depth].val = entry.value;
                ales[depth].assign_into(&mut x);

                if depth + 1 == m {
                    *counter += 1;
                    sink.report(*counter, &x, sys, ales);
                    advance(&mut ales[depth]);
                } else {
                    depth += 1;
                    begin(depth, ales, sys, &x, xors);
                }
            }
            None => {
                if depth == 1 {
                    break;
                }
                ales[depth].clear_from(&mut x);
                depth -= 1;
                advance(&mut ales[depth]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;
    use mrhs_core::{BitMatrix, Block};

    use crate::preprocess::echelonize;
    use crate::solve::tables::prepare;

    fn solve_collect(sys: &mut MrhsSystem) -> Vec<BitVector> {
        echelonize(sys, None).unwrap();
        let mut ales = prepare(sys).unwrap();
        let mut counter = 0;
        let mut xors = 0;
        let mut sink = CollectSolutions::default();
        solve(&mut ales, sys, &mut counter, &mut xors, &mut sink);
        sink.solutions
    }

    #[test]
    fn scenario1_trivial_linear_has_one_solution() {
        let mut sys = MrhsSystem::create_fixed(2, 1, 2, 1).unwrap();
        sys.block_mut(0).m = BitMatrix::from_rows(2, vec![Block(0b01), Block(0b10)]).unwrap();
        sys.block_mut(0).s = BitMatrix::from_rows(2, vec![Block(0b11)]).unwrap();
        let solutions = solve_collect(&mut sys);
        assert!(solutions.len() == 1);
        assert!(solutions[0].iter().collect::<Vec<_>>() == vec![true, true]);
    }

    #[test]
    fn scenario2_two_rhs_has_two_solutions() {
        let mut sys = MrhsSystem::create_fixed(2, 1, 2, 2).unwrap();
        sys.block_mut(0).m = BitMatrix::from_rows(2, vec![Block(0b01), Block(0b10)]).unwrap();
        sys.block_mut(0).s = BitMatrix::from_rows(2, vec![Block(0b00), Block(0b11)]).unwrap();
        let solutions = solve_collect(&mut sys);
        assert!(solutions.len() == 2);
    }

    #[test]
    fn scenario3_and_gate_has_four_solutions() {
        let mut sys = MrhsSystem::create_fixed(3, 1, 3, 4).unwrap();
        sys.block_mut(0).m = BitMatrix::from_rows(3, vec![Block(0b001), Block(0b010), Block(0b100)]).unwrap();
        sys.fill_s_and_truth_table(0).unwrap();
        let solutions = solve_collect(&mut sys);
        assert!(solutions.len() == 4);
    }

    #[test]
    fn zero_blocks_report_zero_solutions() {
        let mut sys = MrhsSystem::create_variable(0, &[], &[]).unwrap();
        let solutions = solve_collect(&mut sys);
        assert!(solutions.len() == 0);
    }
}
