//! Reversi-MCTS: an 8x8 Reversi engine with a UCT tree-search player.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions and search parameters
//! - [`board`] - Players, the cell grid and its text form
//! - [`position`] - Game rules (legality, flips, passes, terminal detection)
//! - [`mcts`] - Monte Carlo Tree Search with UCT selection
//! - [`protocol`] - Text command protocol for front ends
//!
//! ## Example
//!
//! ```
//! use reversi_mcts::mcts::SearchEngine;
//! use reversi_mcts::position::{GameState, Move, parse_coord, str_coord};
//!
//! // Create a new game and play an opening move
//! let mut game = GameState::new();
//! game.apply_move(Move::Place(parse_coord("f4").unwrap())).unwrap();
//!
//! // Search a copy of the position for the reply
//! let mut search = SearchEngine::new(game.clone(), 100);
//! if let Some(pt) = search.search() {
//!     println!("Best move: {}", str_coord(pt));
//!     game.apply_move(Move::Place(pt)).unwrap();
//! }
//! ```

pub mod board;
pub mod constants;
pub mod mcts;
pub mod position;
pub mod protocol;
