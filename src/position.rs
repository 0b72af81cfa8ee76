//! Reversi position representation and move execution.
//!
//! This module provides the core game rules:
//! - Legality: a placement must bracket at least one run of opposing pieces
//! - Move application with flips along every capturing direction
//! - Turn alternation, including explicit forced passes
//! - Terminal detection and outcome scoring
//!
//! A [`GameState`] is only ever changed through [`GameState::apply_move`]
//! (or its shorthand [`GameState::pass`]); every query takes `&self`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::board::{Board, Player, Point};
use crate::constants::{DIRECTIONS, N};

/// A move: a placement at a cell, or a pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Place(Point),
    Pass,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Place(pt) => f.write_str(&str_coord(*pt)),
            Move::Pass => f.write_str("pass"),
        }
    }
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("pass") {
            return Ok(Move::Pass);
        }
        parse_coord(s).map(Move::Place)
    }
}

/// Reasons a placement is rejected. The state is never changed on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move: ({0}, {1}) is off the board")]
    OutOfBounds(usize, usize),

    #[error("illegal move: {} is not empty", coord_name(.0))]
    Occupied(Point),

    #[error("illegal move: {} captures nothing", coord_name(.0))]
    NoCapture(Point),
}

fn coord_name(pt: &Point) -> String {
    str_coord(*pt)
}

/// Errors from parsing move notation such as `d3` or `pass`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMoveError {
    #[error("invalid coordinate {0:?}")]
    Invalid(String),
}

/// Result of a finished game relative to one player.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Numeric value used by the search: +1, -1 or 0.
    pub fn value(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss => -1.0,
            Outcome::Draw => 0.0,
        }
    }
}

/// Overall game status, as shown to a player.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameResult {
    InProgress,
    Won { winner: Player, black: usize, white: usize },
    Drawn { black: usize, white: usize },
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::InProgress => f.write_str("in progress"),
            GameResult::Won { winner, black, white } => {
                write!(f, "{winner} wins {black}-{white}")
            }
            GameResult::Drawn { black, white } => write!(f, "draw {black}-{white}"),
        }
    }
}

/// A Reversi position: the board plus the player to move.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GameState {
    board: Board,
    to_move: Player,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// The fixed starting configuration, Black to move.
    pub fn new() -> Self {
        Self {
            board: Board::starting(),
            to_move: Player::Black,
        }
    }

    /// Build a position from an arbitrary board.
    pub fn from_board(board: Board, to_move: Player) -> Self {
        Self { board, to_move }
    }

    /// Reset to the starting configuration.
    pub fn restart(&mut self) {
        *self = Self::new();
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn to_move(&self) -> Player {
        self.to_move
    }

    /// Piece counts as `(black, white)`.
    pub fn score(&self) -> (usize, usize) {
        (
            self.board.count(Player::Black),
            self.board.count(Player::White),
        )
    }

    /// Length of the opposing run `player` would capture from `pt` along `dir`.
    ///
    /// The run must start on the adjacent cell and be closed by one of
    /// `player`'s own pieces; otherwise nothing is captured and 0 is returned.
    fn run_length(&self, pt: Point, dir: (isize, isize), player: Player) -> usize {
        let opponent = player.opponent();
        let mut len = 0;
        let mut cur = pt;
        while let Some(next) = Board::step(cur, dir) {
            match self.board.get(next) {
                Some(p) if p == opponent => len += 1,
                Some(_) => return len,
                None => return 0,
            }
            cur = next;
        }
        0
    }

    fn is_legal_for(&self, pt: Point, player: Player) -> bool {
        let (x, y) = pt;
        if x >= N || y >= N || self.board.get(pt).is_some() {
            return false;
        }
        DIRECTIONS
            .iter()
            .any(|&dir| self.run_length(pt, dir, player) > 0)
    }

    fn valid_moves_for(&self, player: Player) -> Vec<Point> {
        let mut moves = Vec::new();
        for y in 0..N {
            for x in 0..N {
                if self.is_legal_for((x, y), player) {
                    moves.push((x, y));
                }
            }
        }
        moves
    }

    fn has_move_for(&self, player: Player) -> bool {
        (0..N).any(|y| (0..N).any(|x| self.is_legal_for((x, y), player)))
    }

    /// All legal placements for the player to move, in row-major order.
    pub fn valid_moves(&self) -> Vec<Point> {
        self.valid_moves_for(self.to_move)
    }

    /// Whether the player to move may place a piece at `pt`.
    pub fn is_legal(&self, pt: Point) -> bool {
        self.is_legal_for(pt, self.to_move)
    }

    /// Cells that would flip if the player to move placed at `pt`.
    /// Empty when the placement is illegal.
    pub fn flips(&self, pt: Point) -> Vec<Point> {
        if !self.is_legal(pt) {
            return Vec::new();
        }
        let mut flipped = Vec::new();
        for &dir in &DIRECTIONS {
            let len = self.run_length(pt, dir, self.to_move);
            let mut cur = pt;
            for _ in 0..len {
                // run_length only counts on-board cells
                if let Some(next) = Board::step(cur, dir) {
                    flipped.push(next);
                    cur = next;
                }
            }
        }
        flipped
    }

    /// Play `mv` for the player to move and hand the turn to the opponent.
    ///
    /// A placement must be legal; it is rejected before anything changes
    /// otherwise. A pass leaves the board untouched.
    pub fn apply_move(&mut self, mv: Move) -> Result<&mut Self, MoveError> {
        if let Move::Place(pt) = mv {
            let (x, y) = pt;
            if x >= N || y >= N {
                return Err(MoveError::OutOfBounds(x, y));
            }
            if self.board.get(pt).is_some() {
                return Err(MoveError::Occupied(pt));
            }
            let flipped = self.flips(pt);
            if flipped.is_empty() {
                return Err(MoveError::NoCapture(pt));
            }

            self.board.set(pt, Some(self.to_move));
            for f in flipped {
                self.board.set(f, Some(self.to_move));
            }
        }
        self.to_move = self.to_move.opponent();
        Ok(self)
    }

    /// Forced pass: yield the turn without changing the board.
    pub fn pass(&mut self) -> &mut Self {
        self.to_move = self.to_move.opponent();
        self
    }

    /// Whether the player to move has at least one legal placement.
    pub fn has_any_move(&self) -> bool {
        self.has_move_for(self.to_move)
    }

    /// Whether the player to move has no legal placement.
    pub fn is_blocked(&self) -> bool {
        !self.has_any_move()
    }

    /// Whether neither player can place a piece.
    pub fn is_terminal(&self) -> bool {
        !self.has_move_for(self.to_move) && !self.has_move_for(self.to_move.opponent())
    }

    /// Compare piece counts from `player`'s point of view.
    pub fn outcome(&self, player: Player) -> Outcome {
        let mine = self.board.count(player);
        let theirs = self.board.count(player.opponent());
        if mine > theirs {
            Outcome::Win
        } else if mine < theirs {
            Outcome::Loss
        } else {
            Outcome::Draw
        }
    }

    /// Game status for display.
    pub fn result(&self) -> GameResult {
        if !self.is_terminal() {
            return GameResult::InProgress;
        }
        let (black, white) = self.score();
        match self.outcome(Player::Black) {
            Outcome::Win => GameResult::Won {
                winner: Player::Black,
                black,
                white,
            },
            Outcome::Loss => GameResult::Won {
                winner: Player::White,
                black,
                white,
            },
            Outcome::Draw => GameResult::Drawn { black, white },
        }
    }
}

/// Parse a coordinate string (e.g., "d3") into a Point.
///
/// The letter names the column (`a` = 0) and the digit the row (`1` = row 0).
pub fn parse_coord(s: &str) -> Result<Point, ParseMoveError> {
    let invalid = || ParseMoveError::Invalid(s.to_string());
    let bytes = s.trim().as_bytes();
    if bytes.len() != 2 {
        return Err(invalid());
    }

    let col = bytes[0].to_ascii_lowercase().wrapping_sub(b'a') as usize;
    let row = bytes[1].wrapping_sub(b'1') as usize;
    if col >= N || row >= N {
        return Err(invalid());
    }
    Ok((col, row))
}

/// Convert a Point to a coordinate string (e.g., "d3").
pub fn str_coord((x, y): Point) -> String {
    format!("{}{}", (b'a' + x as u8) as char, y + 1)
}
