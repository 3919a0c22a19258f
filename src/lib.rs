//! An expectimax player for 2048.
//!
//! - `engine`: a rows x columns board simulator and the [`engine::Simulation`]
//!   trait the search runs against
//! - `features`, `weights`, `evaluator`: the linear board heuristic
//! - `expectimax`: depth-adaptive search and the [`expectimax::Expectimax`] engine
//! - `config`: JSON engine configuration
//! - `wasm`: wasm-bindgen bindings
//!
//! ```
//! use expectimax_2048::engine::{GameState, Simulation};
//! use expectimax_2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut game = GameState::new(4, 4, &mut rng);
//! let mut engine = Expectimax::new();
//! let mut moves = 0;
//! while game.is_alive() && moves < 3 {
//!     let direction = engine.get_action(&game);
//!     assert!(game.make_move(direction, &mut rng));
//!     moves += 1;
//! }
//! assert_eq!(moves, 3);
//! ```
pub mod config;
pub mod engine;
pub mod evaluator;
pub mod expectimax;
pub mod features;
pub mod wasm;
pub mod weights;
