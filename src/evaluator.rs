use crate::engine::{BoardView, Tile};
use crate::features::{compute_all, FEATURES};
use crate::weights::WeightVector;
use log::debug;

pub(crate) const SPAWN_TWO_PROB: f64 = 0.9;
pub(crate) const SPAWN_FOUR_PROB: f64 = 0.1;

/// Linear combination of the feature registry with a weight vector.
///
/// Holds its own weights so engines with different tunings can coexist.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    weights: WeightVector,
    verbose: bool,
}

impl Evaluator {
    pub fn new(weights: WeightVector) -> Self {
        Evaluator { weights, verbose: false }
    }

    /// Log every feature value and the combined score at debug level.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut WeightVector {
        &mut self.weights
    }

    pub fn evaluate(&self, board: BoardView<'_>) -> f64 {
        let values = compute_all(board);
        let score: f64 = values
            .iter()
            .zip(self.weights.get().iter())
            .map(|(value, weight)| value * weight)
            .sum();
        if self.verbose {
            for (feature, value) in FEATURES.iter().zip(values.iter()) {
                debug!("{:>22}: {}", feature.name, value);
            }
            debug!("{:>22}: {}", "score", score);
        }
        score
    }

    /// Expected [`Evaluator::evaluate`] after one random spawn.
    ///
    /// Panics if the board has no empty cell.
    pub fn evaluate_spawn_aware(&self, board: BoardView<'_>) -> f64 {
        let empty: Vec<usize> = board
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(idx, _)| idx)
            .collect();
        assert!(!empty.is_empty(), "spawn-aware evaluation needs an empty cell");

        let mut scratch: Vec<Option<Tile>> = board.cells().to_vec();
        let mut total = 0.;
        for &idx in &empty {
            scratch[idx] = Some(2);
            total += SPAWN_TWO_PROB * self.evaluate(BoardView::new(&scratch, board.columns()));
            scratch[idx] = Some(4);
            total += SPAWN_FOUR_PROB * self.evaluate(BoardView::new(&scratch, board.columns()));
            scratch[idx] = None;
        }
        total / empty.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{free_cells, max_tile};

    fn cells(values: &[Tile]) -> Vec<Option<Tile>> {
        values.iter().map(|&v| if v == 0 { None } else { Some(v) }).collect()
    }

    #[test]
    fn test_evaluate_is_weighted_sum() {
        let board = cells(&[0, 2, 4, 0, 8, 8, 0, 0, 0]);
        let view = BoardView::new(&board, 3);
        let only_free = Evaluator::new(WeightVector::from_array([0., 0., 1., 0., 0., 0.]));
        assert_eq!(only_free.evaluate(view), free_cells(view));

        let mixed = Evaluator::new(WeightVector::from_array([0., 0., 2., 0.5, 0., 0.]));
        assert_eq!(mixed.evaluate(view), 2. * free_cells(view) + 0.5 * max_tile(view));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let evaluator = Evaluator::default();
        let a = cells(&[2, 4, 8, 16, 0, 0, 2, 2, 4, 0, 0, 8, 64, 32, 2, 0]);
        let b = cells(&[128, 0, 0, 0, 2, 2, 2, 2, 0, 0, 0, 0, 4, 4, 4, 4]);
        let first = evaluator.evaluate(BoardView::new(&a, 4));
        evaluator.evaluate(BoardView::new(&b, 4));
        let again = evaluator.with_verbose(true).evaluate(BoardView::new(&a, 4));
        assert_eq!(first, again);
    }

    #[test]
    fn test_spawn_aware_single_cell() {
        let evaluator = Evaluator::default();
        let board = cells(&[2, 4, 8, 0]);
        let with_two = cells(&[2, 4, 8, 2]);
        let with_four = cells(&[2, 4, 8, 4]);
        let expected = 0.9 * evaluator.evaluate(BoardView::new(&with_two, 2))
            + 0.1 * evaluator.evaluate(BoardView::new(&with_four, 2));
        let got = evaluator.evaluate_spawn_aware(BoardView::new(&board, 2));
        assert!((got - expected).abs() < 1e-9);
    }

    #[test]
    fn test_spawn_aware_averages_over_cells() {
        // free cells only: every spawn leaves 2 of 3 cells empty
        let evaluator = Evaluator::new(WeightVector::from_array([0., 0., 1., 0., 0., 0.]));
        let board = cells(&[2, 0, 0, 0]);
        assert!((evaluator.evaluate_spawn_aware(BoardView::new(&board, 2)) - 2.).abs() < 1e-12);
    }

    #[test]
    #[should_panic]
    fn test_spawn_aware_requires_empty_cell() {
        let board = cells(&[2, 4, 8, 16]);
        Evaluator::default().evaluate_spawn_aware(BoardView::new(&board, 2));
    }
}
