//! Constants for board geometry and search parameters.
//!
//! The board is a fixed 8x8 grid addressed by `(column, row)` pairs, with
//! row 0 at the top and column 0 at the left.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size (NxN).
pub const N: usize = 8;

/// Total number of cells on the board.
pub const BOARDSIZE: usize = N * N;

/// Compass directions as `(dcol, drow)` offsets.
/// Order: North, NE, East, SE, South, SW, West, NW
pub const DIRECTIONS: [(isize, isize); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

// =============================================================================
// MCTS (Monte Carlo Tree Search) Parameters
// =============================================================================

/// Default number of simulate passes per search.
pub const N_ITERATIONS: usize = 1000;

/// Exploration constant `c` in the UCT term `sqrt(c * ln(N) / n)`.
pub const UCT_EXPLORATION: f64 = 2.0;
