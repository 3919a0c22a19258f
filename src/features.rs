//! Scalar board heuristics.
//!
//! Every feature reads a [`BoardView`] with empty cells taken as 0 and returns
//! an `f64`. [`FEATURES`] fixes their order; weight vectors are indexed by it.

use crate::engine::{BoardView, Tile};
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

pub const FEATURE_COUNT: usize = 6;

/// Entries beyond this are computed but not remembered.
const LOG2_MEMO_CAPACITY: usize = 4096;

static LOG2_MEMO: OnceLock<RwLock<HashMap<Tile, f64>>> = OnceLock::new();

#[derive(Clone, Copy)]
pub struct Feature {
    pub name: &'static str,
    pub eval: fn(BoardView<'_>) -> f64,
}

pub const FEATURES: [Feature; FEATURE_COUNT] = [
    Feature { name: "monotonicity", eval: monotonicity },
    Feature { name: "smoothness", eval: smoothness },
    Feature { name: "free_cells", eval: free_cells },
    Feature { name: "max_tile", eval: max_tile },
    Feature { name: "freedom_degree", eval: freedom_degree },
    Feature { name: "free_or_paired_cells", eval: free_or_paired_cells },
];

/// Raw values of every feature, in registry order.
pub fn compute_all(board: BoardView<'_>) -> [f64; FEATURE_COUNT] {
    let mut out = [0.; FEATURE_COUNT];
    for (slot, feature) in out.iter_mut().zip(FEATURES.iter()) {
        *slot = (feature.eval)(board);
    }
    out
}

/// Memoized base-2 logarithm. `n` must be positive.
pub fn log2(n: Tile) -> f64 {
    assert!(n > 0, "log2 of a non-positive magnitude");
    let memo = LOG2_MEMO.get_or_init(|| RwLock::new(HashMap::new()));
    if let Some(&v) = memo.read().unwrap_or_else(PoisonError::into_inner).get(&n) {
        return v;
    }
    let v = f64::from(n).log2();
    let mut memo = memo.write().unwrap_or_else(PoisonError::into_inner);
    if memo.len() < LOG2_MEMO_CAPACITY {
        memo.insert(n, v);
    }
    v
}

// Adjacent (first, second, is_horizontal) value pairs, rows before columns.
fn adjacent_pairs<'a>(board: BoardView<'a>) -> impl Iterator<Item = (Tile, Tile, bool)> + 'a {
    let (rows, columns) = (board.rows(), board.columns());
    let horizontal = (0..rows).flat_map(move |r| {
        (1..columns).map(move |c| (board.value(r, c - 1), board.value(r, c), true))
    });
    let vertical = (1..rows).flat_map(move |r| {
        (0..columns).map(move |c| (board.value(r - 1, c), board.value(r, c), false))
    });
    horizontal.chain(vertical)
}

/// How far rows and columns are from being ordered in a single direction.
/// Zero when every line is monotone.
pub fn monotonicity(board: BoardView<'_>) -> f64 {
    let mut left = 0.;
    let mut right = 0.;
    let mut top = 0.;
    let mut bottom = 0.;
    for (first, second, horizontal) in adjacent_pairs(board) {
        let (decreasing, increasing) = if horizontal {
            (&mut left, &mut right)
        } else {
            (&mut top, &mut bottom)
        };
        if first > second {
            *decreasing += log2(first - second);
        } else if second > first {
            *increasing += log2(second - first);
        }
    }
    f64::min(left, right) + f64::min(top, bottom)
}

pub fn smoothness(board: BoardView<'_>) -> f64 {
    adjacent_pairs(board)
        .filter(|(a, b, _)| a != b)
        .map(|(a, b, _)| log2(a.abs_diff(b)))
        .sum()
}

pub fn free_cells(board: BoardView<'_>) -> f64 {
    board.count_empty() as f64
}

pub fn max_tile(board: BoardView<'_>) -> f64 {
    f64::from(board.highest_tile())
}

/// 1 when both a horizontal and a vertical move can change the board.
pub fn freedom_degree(board: BoardView<'_>) -> f64 {
    let mut horizontal = false;
    let mut vertical = false;
    for (first, second, is_horizontal) in adjacent_pairs(board) {
        let open = (first == 0) != (second == 0) || (first != 0 && first == second);
        if open {
            if is_horizontal {
                horizontal = true;
            } else {
                vertical = true;
            }
        }
        if horizontal && vertical {
            return 1.;
        }
    }
    0.
}

/// Empty cells plus equal right/bottom neighbour pairs.
pub fn free_or_paired_cells(board: BoardView<'_>) -> f64 {
    let (rows, columns) = (board.rows(), board.columns());
    let mut count: u32 = 0;
    for r in 0..rows {
        for c in 0..columns {
            let v = board.value(r, c);
            if v == 0 {
                count += 1;
                continue;
            }
            if c + 1 < columns && board.value(r, c + 1) == v {
                count += 1;
            }
            if r + 1 < rows && board.value(r + 1, c) == v {
                count += 1;
            }
        }
    }
    f64::from(count)
}
