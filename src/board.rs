use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::N;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    Black,
    White,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// Diagram character used by [`Board`]'s text form.
    pub fn symbol(self) -> char {
        match self {
            Player::Black => 'X',
            Player::White => 'O',
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Black => f.write_str("black"),
            Player::White => f.write_str("white"),
        }
    }
}

/// A cell coordinate as `(column, row)`.
pub type Point = (usize, usize);

/// Fixed 8x8 grid of cells, each empty or holding one player's piece.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Option<Player>; N * N],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    /// A board with no pieces on it.
    pub fn empty() -> Self {
        Self {
            cells: [None; N * N],
        }
    }

    /// The starting layout: two pieces per player crossed on the centre.
    pub fn starting() -> Self {
        let mut board = Self::empty();
        board.set((3, 3), Some(Player::Black));
        board.set((4, 4), Some(Player::Black));
        board.set((4, 3), Some(Player::White));
        board.set((3, 4), Some(Player::White));
        board
    }

    #[inline]
    fn idx(x: usize, y: usize) -> usize {
        y * N + x
    }

    /// Contents of a cell; `None` for empty or off-board cells.
    pub fn get(&self, (x, y): Point) -> Option<Player> {
        if x >= N || y >= N {
            return None;
        }
        self.cells[Self::idx(x, y)]
    }

    pub fn set(&mut self, (x, y): Point, cell: Option<Player>) {
        self.cells[Self::idx(x, y)] = cell;
    }

    /// Step one cell from `(x, y)` in direction `(dx, dy)`, or `None` off the board.
    #[inline]
    pub fn step((x, y): Point, (dx, dy): (isize, isize)) -> Option<Point> {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < N && ny < N).then_some((nx, ny))
    }

    /// Number of pieces belonging to `player`.
    pub fn count(&self, player: Player) -> usize {
        self.cells.iter().filter(|c| **c == Some(player)).count()
    }

    /// Number of non-empty cells.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Iterate over `(point, cell)` pairs in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Point, Option<Player>)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| ((i % N, i / N), *c))
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..N {
            for x in 0..N {
                let ch = self.get((x, y)).map_or('.', Player::symbol);
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Errors from parsing a board diagram.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardParseError {
    #[error("expected {N} rows, found {0}")]
    RowCount(usize),

    #[error("row {row}: expected {N} cells, found {found}")]
    RowLength { row: usize, found: usize },

    #[error("row {row}: unexpected character {ch:?}")]
    BadCell { row: usize, ch: char },
}

impl FromStr for Board {
    type Err = BoardParseError;

    /// Parse a diagram of `X` (black), `O` (white) and `.` (empty).
    /// Whitespace inside a row and blank lines are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = s.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if rows.len() != N {
            return Err(BoardParseError::RowCount(rows.len()));
        }

        let mut board = Board::empty();
        for (y, line) in rows.iter().enumerate() {
            let cells: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if cells.len() != N {
                return Err(BoardParseError::RowLength {
                    row: y,
                    found: cells.len(),
                });
            }
            for (x, ch) in cells.into_iter().enumerate() {
                let cell = match ch {
                    'X' | 'x' => Some(Player::Black),
                    'O' | 'o' => Some(Player::White),
                    '.' => None,
                    _ => return Err(BoardParseError::BadCell { row: y, ch }),
                };
                board.set((x, y), cell);
            }
        }
        Ok(board)
    }
}
