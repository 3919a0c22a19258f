use crate::config::EngineConfig;
use crate::engine::{Move, Simulation};
use crate::evaluator::{Evaluator, SPAWN_FOUR_PROB, SPAWN_TWO_PROB};
use crate::features::FEATURE_COUNT;
use crate::weights::WeightVector;
use log::debug;
use serde::{Deserialize, Serialize};

/// Value of a max node where no move is legal.
const NO_MOVE_SCORE: f64 = -1.0e15;
/// Value of a chance node with no empty cell. Never reached after a legal move.
const NO_SPAWN_SCORE: f64 = 1.0e15;

// Two layers alternate:
//  - max nodes: the player picks the best of up to four moves
//  - chance nodes: the game spawns a 2 or 4 in some empty cell
// and any node at depth 0 is a leaf scored by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Max,
    Chance,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectimaxResult {
    pub score: f64,
    pub move_dir: Option<Move>,
}

/// Search depth chosen from the number of free cells.
///
/// Fuller boards have fewer branches and more risk, so they get deeper search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthPolicy {
    pub critical_free_cells: usize,
    pub critical_depth: u32,
    pub low_free_cells: usize,
    pub low_depth: u32,
    pub default_depth: u32,
}

impl Default for DepthPolicy {
    fn default() -> Self {
        DepthPolicy {
            critical_free_cells: 3,
            critical_depth: 9,
            low_free_cells: 5,
            low_depth: 7,
            default_depth: 5,
        }
    }
}

impl DepthPolicy {
    pub fn depth_for(&self, free_cells: usize) -> u32 {
        if free_cells < self.critical_free_cells {
            self.critical_depth
        } else if free_cells < self.low_free_cells {
            self.low_depth
        } else {
            self.default_depth
        }
    }
}

/// How search leaves are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafEvaluation {
    #[default]
    Plain,
    /// Average over one more random spawn. Full leaves fall back to `Plain`.
    SpawnAware,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes visited by the last search.
    pub nodes: u64,
    /// Most nodes visited by a single search.
    pub peak_nodes: u64,
    /// Nodes visited over the engine's lifetime.
    pub total_nodes: u64,
}

/// The decision engine.
pub struct Expectimax {
    evaluator: Evaluator,
    depth_policy: DepthPolicy,
    leaf: LeafEvaluation,
    stats: SearchStats,
}

impl Default for Expectimax {
    fn default() -> Self {
        Expectimax::new()
    }
}

impl Expectimax {
    pub fn new() -> Self {
        Expectimax::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Expectimax {
            evaluator: Evaluator::new(config.weights).with_verbose(config.verbose),
            depth_policy: config.depth,
            leaf: config.leaf,
            stats: SearchStats::default(),
        }
    }

    /// Pick the move with the highest expected value.
    ///
    /// Panics if `state` is not alive.
    pub fn get_action<S: Simulation>(&mut self, state: &S) -> Move {
        assert!(state.is_alive(), "get_action called on a finished game");
        let depth = self.search_depth(state);
        let result = self.search(state, depth, Node::Max);
        let direction = result
            .move_dir
            .expect("a live game always has a legal move");
        debug!(
            "depth {} chose {:?} (value {:.3}, {} nodes)",
            depth, direction, result.score, self.stats.nodes
        );
        direction
    }

    pub fn search_depth<S: Simulation>(&self, state: &S) -> u32 {
        self.depth_policy.depth_for(state.view().count_empty()).max(1)
    }

    /// Run the search from `state` as a node of kind `node`.
    pub fn search<S: Simulation>(&mut self, state: &S, depth: u32, node: Node) -> ExpectimaxResult {
        let mut state_count = 0;
        let result = self.expectimax(state, node, depth, &mut state_count);
        self.record(state_count);
        result
    }

    /// Expected value of each move in `[Up, Down, Left, Right]` order,
    /// `None` where the move does not change the board.
    pub fn move_values<S: Simulation>(&mut self, state: &S) -> [Option<f64>; 4] {
        let depth = self.search_depth(state);
        let mut state_count = 0;
        let mut out = [None; 4];
        let mut child = state.clone();
        for (slot, &direction) in out.iter_mut().zip(Move::ALL.iter()) {
            child.load_from(state);
            if child.shift(direction) {
                *slot = Some(
                    self.expectimax(&child, Node::Chance, depth - 1, &mut state_count)
                        .score,
                );
            }
        }
        self.record(state_count);
        out
    }

    pub fn get_weights(&self) -> [f64; FEATURE_COUNT] {
        self.evaluator.weights().get()
    }

    pub fn set_weights(&mut self, weights: [f64; FEATURE_COUNT]) {
        self.evaluator.weights_mut().set(weights);
    }

    pub fn weights(&self) -> &WeightVector {
        self.evaluator.weights()
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn last_stats(&self) -> SearchStats {
        self.stats
    }

    fn record(&mut self, state_count: u64) {
        self.stats.nodes = state_count;
        self.stats.peak_nodes = self.stats.peak_nodes.max(state_count);
        self.stats.total_nodes += state_count;
    }

    fn expectimax<S: Simulation>(
        &self,
        state: &S,
        node: Node,
        move_depth: u32,
        state_count: &mut u64,
    ) -> ExpectimaxResult {
        *state_count += 1;
        if move_depth == 0 {
            return ExpectimaxResult {
                score: self.evaluate_leaf(state),
                move_dir: None,
            };
        }
        match node {
            Node::Max => self.evaluate_max(state, move_depth, state_count),
            Node::Chance => self.evaluate_chance(state, move_depth, state_count),
        }
    }

    fn evaluate_leaf<S: Simulation>(&self, state: &S) -> f64 {
        let view = state.view();
        match self.leaf {
            LeafEvaluation::SpawnAware if view.count_empty() > 0 => {
                self.evaluator.evaluate_spawn_aware(view)
            }
            _ => self.evaluator.evaluate(view),
        }
    }

    fn evaluate_max<S: Simulation>(
        &self,
        state: &S,
        move_depth: u32,
        state_count: &mut u64,
    ) -> ExpectimaxResult {
        let mut best_score = NO_MOVE_SCORE;
        let mut best_move = None;
        let mut child = state.clone();
        for &direction in &Move::ALL {
            child.load_from(state);
            if !child.shift(direction) {
                continue;
            }
            let score = self
                .expectimax(&child, Node::Chance, move_depth - 1, state_count)
                .score;
            // strictly greater, so earlier moves keep ties
            if best_move.is_none() || score > best_score {
                best_score = score;
                best_move = Some(direction);
            }
        }
        ExpectimaxResult {
            score: best_score,
            move_dir: best_move,
        }
    }

    fn evaluate_chance<S: Simulation>(
        &self,
        state: &S,
        move_depth: u32,
        state_count: &mut u64,
    ) -> ExpectimaxResult {
        let empty: Vec<usize> = state
            .board()
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(idx, _)| idx)
            .collect();
        if empty.is_empty() {
            return ExpectimaxResult {
                score: NO_SPAWN_SCORE,
                move_dir: None,
            };
        }

        let mut given_two = Vec::with_capacity(empty.len());
        let mut given_four = Vec::with_capacity(empty.len());
        let mut child = state.clone();
        for &idx in &empty {
            child.set_tile(idx, Some(2));
            given_two.push(
                self.expectimax(&child, Node::Max, move_depth - 1, state_count)
                    .score,
            );
            child.set_tile(idx, Some(4));
            given_four.push(
                self.expectimax(&child, Node::Max, move_depth - 1, state_count)
                    .score,
            );
            child.set_tile(idx, None);
        }

        ExpectimaxResult {
            score: SPAWN_TWO_PROB * mean(&given_two) + SPAWN_FOUR_PROB * mean(&given_four),
            move_dir: None,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{GameState, Tile};

    fn zero_weights() -> EngineConfig {
        EngineConfig {
            weights: WeightVector::from_array([0.; FEATURE_COUNT]),
            ..EngineConfig::default()
        }
    }

    fn state(values: &[Tile], columns: usize) -> GameState {
        GameState::from_values(values, columns, 0)
    }

    #[test]
    fn it_depth_policy() {
        let policy = DepthPolicy::default();
        assert_eq!(policy.depth_for(0), 9);
        assert_eq!(policy.depth_for(2), 9);
        assert_eq!(policy.depth_for(3), 7);
        assert_eq!(policy.depth_for(4), 7);
        assert_eq!(policy.depth_for(5), 5);
        assert_eq!(policy.depth_for(16), 5);
    }

    #[test]
    fn test_depth_zero_is_a_leaf() {
        let mut ex = Expectimax::new();
        let game = state(&[2, 4, 0, 8], 2);
        let result = ex.search(&game, 0, Node::Max);
        assert_eq!(result.score, ex.evaluator().evaluate(game.view()));
        assert_eq!(result.move_dir, None);
        assert_eq!(ex.last_stats().nodes, 1);
    }

    #[test]
    fn test_chance_depth_one_single_cell() {
        let mut ex = Expectimax::new();
        let game = state(&[2, 4, 8, 16, 32, 64, 128, 256, 0], 3);
        let with_two = state(&[2, 4, 8, 16, 32, 64, 128, 256, 2], 3);
        let with_four = state(&[2, 4, 8, 16, 32, 64, 128, 256, 4], 3);
        let expected = 0.9 * ex.evaluator().evaluate(with_two.view())
            + 0.1 * ex.evaluator().evaluate(with_four.view());
        assert_eq!(ex.search(&game, 1, Node::Chance).score, expected);
    }

    #[test]
    fn test_chance_means_are_per_tile_value() {
        // free cells only: a 2 or 4 spawn both leave two of three cells empty
        let mut ex = Expectimax::with_config(EngineConfig {
            weights: WeightVector::from_array([0., 0., 1., 0., 0., 0.]),
            ..EngineConfig::default()
        });
        let game = state(&[2, 0, 0, 0], 2);
        assert!((ex.search(&game, 1, Node::Chance).score - 2.).abs() < 1e-12);
    }

    #[test]
    fn test_max_layer_skips_illegal_moves() {
        let mut ex = Expectimax::new();
        // only Up and Left change this board
        let game = state(&[0, 0, 0, 2], 2);
        let values = ex.move_values(&game);
        assert!(values[0].is_some());
        assert_eq!(values[1], None);
        assert!(values[2].is_some());
        assert_eq!(values[3], None);
    }

    #[test]
    fn test_ties_keep_the_earlier_move() {
        let mut ex = Expectimax::with_config(zero_weights());
        // Up and Left are no-ops here, Down comes before Right
        let mut cells = vec![0; 16];
        cells[0] = 2;
        let game = state(&cells, 4);
        assert_eq!(ex.get_action(&game), Move::Down);

        let mut cells = vec![0; 16];
        cells[15] = 2;
        let game = state(&cells, 4);
        assert_eq!(ex.get_action(&game), Move::Up);
    }

    #[test]
    fn test_depth_one_tie_between_symmetric_moves() {
        let mut ex = Expectimax::new();
        let mut cells = vec![0; 16];
        cells[15] = 2;
        let game = state(&cells, 4);
        let result = ex.search(&game, 1, Node::Max);
        assert_eq!(result.move_dir, Some(Move::Up));
    }

    #[test]
    fn test_dead_max_node_uses_sentinel() {
        let mut ex = Expectimax::new();
        let dead = state(&[2, 4, 4, 2], 2);
        let result = ex.search(&dead, 2, Node::Max);
        assert_eq!(result.move_dir, None);
        assert_eq!(result.score, NO_MOVE_SCORE);
    }

    #[test]
    fn test_search_leaves_caller_state_untouched() {
        let mut ex = Expectimax::new();
        let game = state(&[0, 2, 2, 0, 4, 0, 0, 8, 0], 3);
        let before = game.clone();
        ex.get_action(&game);
        assert_eq!(game, before);
    }

    #[test]
    fn test_set_weights_roundtrip() {
        let mut ex = Expectimax::new();
        let w = [1., 2., 3., 4., 5., 6.];
        ex.set_weights(w);
        assert_eq!(ex.get_weights(), w);
    }

    #[test]
    fn test_spawn_aware_leaves() {
        let mut cfg = zero_weights();
        cfg.weights = WeightVector::from_array([0., 0., 1., 0., 0., 0.]);
        cfg.leaf = LeafEvaluation::SpawnAware;
        let mut ex = Expectimax::with_config(cfg);
        let game = state(&[2, 0, 0, 0], 2);
        // leaf sees 3 free cells, spawn-aware drops that to 2
        assert!((ex.search(&game, 0, Node::Max).score - 2.).abs() < 1e-12);
        // full leaves fall back to the plain evaluator
        let full = state(&[2, 4, 8, 16], 2);
        assert_eq!(ex.search(&full, 0, Node::Max).score, 0.);
    }

    #[test]
    fn test_stats_accumulate() {
        let mut ex = Expectimax::new();
        let game = state(&[2, 0, 0, 4, 0, 0, 0, 0, 0], 3);
        ex.get_action(&game);
        let first = ex.last_stats();
        assert!(first.nodes > 1);
        ex.get_action(&game);
        let second = ex.last_stats();
        assert_eq!(second.nodes, first.nodes);
        assert_eq!(second.total_nodes, 2 * first.nodes);
        assert_eq!(second.peak_nodes, first.nodes);
    }

    #[test]
    #[should_panic]
    fn test_get_action_on_finished_game_panics() {
        let mut ex = Expectimax::new();
        ex.get_action(&state(&[2, 4, 4, 2], 2));
    }
}
