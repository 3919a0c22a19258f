use crate::engine::{GameState, Move, Simulation, Tile};
use crate::expectimax::Expectimax;
use crate::features::FEATURE_COUNT;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmExpectimax {
    engine: Expectimax,
}

#[wasm_bindgen]
impl WasmExpectimax {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        WasmExpectimax {
            engine: Expectimax::new(),
        }
    }

    /// Best move for a row-major board where 0 is an empty cell.
    ///
    /// Returns 0 for up, 1 right, 2 down, 3 left and -1 when no move changes
    /// the board.
    pub fn get_action(&mut self, cells: Vec<Tile>, columns: usize) -> i32 {
        let state = GameState::from_values(&cells, columns, 0);
        if !state.is_alive() {
            return -1;
        }
        match self.engine.get_action(&state) {
            Move::Up => 0,
            Move::Right => 1,
            Move::Down => 2,
            Move::Left => 3,
        }
    }

    /// Returns false, leaving the weights unchanged, unless exactly six are given.
    pub fn set_weights(&mut self, weights: &[f64]) -> bool {
        match <[f64; FEATURE_COUNT]>::try_from(weights) {
            Ok(weights) => {
                self.engine.set_weights(weights);
                true
            }
            Err(_) => false,
        }
    }

    pub fn get_weights(&self) -> Vec<f64> {
        self.engine.get_weights().to_vec()
    }
}

impl Default for WasmExpectimax {
    fn default() -> Self {
        WasmExpectimax::new()
    }
}
