//! Tile-merge puzzle on a 4×4 board (2048 rules).
//!
//! A move slides every tile as far as possible in one direction; two
//! equal neighbours merge into their sum, each tile at most once per
//! move, and the merged value is added to the score. A new tile (2 at
//! 90 %, 4 at 10 %) appears only after a move that changed the board.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Challenge, GameRng, GameStatus, Reward, RewardLatch};
use crate::progress::challenge::PUZZLE;

pub const GRID_SIZE: usize = 4;

pub type Board = [[u32; GRID_SIZE]; GRID_SIZE];

pub const REWARD: Reward = Reward {
    challenge: PUZZLE,
    digit: "3",
    position: 2,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinCondition {
    /// Cumulative merge score reaches the target.
    ScoreTarget(u32),
    /// Any tile reaches the value.
    Tile(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub moved: bool,
    pub score_gained: u32,
}

/// Slide one line toward index 0. Returns the new line and the score gained.
pub fn slide_line(line: [u32; GRID_SIZE]) -> ([u32; GRID_SIZE], u32) {
    let tiles: Vec<u32> = line.into_iter().filter(|v| *v != 0).collect();
    let mut out = [0; GRID_SIZE];
    let mut gained = 0;
    let mut write = 0;
    let mut i = 0;
    while i < tiles.len() {
        if i + 1 < tiles.len() && tiles[i] == tiles[i + 1] {
            let merged = tiles[i] * 2;
            out[write] = merged;
            gained += merged;
            i += 2;
        } else {
            out[write] = tiles[i];
            i += 1;
        }
        write += 1;
    }
    (out, gained)
}

/// Apply a move to a board without spawning. Returns (board, gained, moved).
pub fn apply_move(board: &Board, direction: Direction) -> (Board, u32, bool) {
    let mut next = *board;
    let mut gained = 0;

    for k in 0..GRID_SIZE {
        // Gather the line so that index 0 is the edge tiles slide toward.
        let line: [u32; GRID_SIZE] = std::array::from_fn(|j| {
            let (r, c) = cell(direction, k, j);
            board[r][c]
        });
        let (slid, line_gain) = slide_line(line);
        gained += line_gain;
        for (j, value) in slid.into_iter().enumerate() {
            let (r, c) = cell(direction, k, j);
            next[r][c] = value;
        }
    }

    let moved = next != *board;
    (next, gained, moved)
}

/// Board coordinates of the `j`-th cell of line `k` for a direction.
fn cell(direction: Direction, k: usize, j: usize) -> (usize, usize) {
    let last = GRID_SIZE - 1;
    match direction {
        Direction::Left => (k, j),
        Direction::Right => (k, last - j),
        Direction::Up => (j, k),
        Direction::Down => (last - j, k),
    }
}

/// No empty cell and no equal horizontal or vertical neighbours.
pub fn is_stuck(board: &Board) -> bool {
    for r in 0..GRID_SIZE {
        for c in 0..GRID_SIZE {
            let v = board[r][c];
            if v == 0 {
                return false;
            }
            if r + 1 < GRID_SIZE && board[r + 1][c] == v {
                return false;
            }
            if c + 1 < GRID_SIZE && board[r][c + 1] == v {
                return false;
            }
        }
    }
    true
}

#[derive(Debug, Clone)]
pub struct TileMergeGame {
    board: Board,
    score: u32,
    moves: u32,
    win: WinCondition,
    status: GameStatus,
    rng: GameRng,
    latch: RewardLatch,
}

impl TileMergeGame {
    /// Empty board with two random starting tiles.
    pub fn new(rng: GameRng, win: WinCondition) -> Self {
        let mut game = Self::from_board([[0; GRID_SIZE]; GRID_SIZE], rng, win);
        game.spawn_tile();
        game.spawn_tile();
        game
    }

    pub fn from_board(board: Board, rng: GameRng, win: WinCondition) -> Self {
        Self {
            board,
            score: 0,
            moves: 0,
            win,
            status: GameStatus::Playing,
            rng,
            latch: RewardLatch::default(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn shift(&mut self, direction: Direction) -> MoveOutcome {
        if self.status != GameStatus::Playing {
            return MoveOutcome {
                moved: false,
                score_gained: 0,
            };
        }
        let (next, gained, moved) = apply_move(&self.board, direction);
        if moved {
            self.board = next;
            self.spawn_tile();
            self.score += gained;
            self.moves += 1;

            if self.is_won() {
                self.status = GameStatus::Won;
            } else if is_stuck(&self.board) {
                self.status = GameStatus::Lost;
            }
        }
        MoveOutcome {
            moved,
            score_gained: if moved { gained } else { 0 },
        }
    }

    fn is_won(&self) -> bool {
        match self.win {
            WinCondition::ScoreTarget(target) => self.score >= target,
            WinCondition::Tile(value) => self.board.iter().flatten().any(|v| *v >= value),
        }
    }

    fn spawn_tile(&mut self) {
        let empty: Vec<(usize, usize)> = (0..GRID_SIZE)
            .flat_map(|r| (0..GRID_SIZE).map(move |c| (r, c)))
            .filter(|(r, c)| self.board[*r][*c] == 0)
            .collect();
        if empty.is_empty() {
            return;
        }
        let (r, c) = empty[self.rng.gen_range(0..empty.len())];
        self.board[r][c] = if self.rng.gen_bool(0.9) { 2 } else { 4 };
    }
}

impl Challenge for TileMergeGame {
    fn status(&self) -> GameStatus {
        self.status
    }

    fn reward(&self) -> Reward {
        REWARD
    }

    fn latch(&mut self) -> &mut RewardLatch {
        &mut self.latch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::seeded_rng;

    fn tile_count(board: &Board) -> usize {
        board.iter().flatten().filter(|v| **v != 0).count()
    }

    #[test]
    fn slide_merges_each_tile_once() {
        assert_eq!(slide_line([2, 2, 2, 2]), ([4, 4, 0, 0], 8));
        assert_eq!(slide_line([2, 2, 4, 0]), ([4, 4, 0, 0], 4));
        assert_eq!(slide_line([0, 4, 0, 4]), ([8, 0, 0, 0], 8));
        assert_eq!(slide_line([2, 4, 8, 16]), ([2, 4, 8, 16], 0));
        assert_eq!(slide_line([4, 4, 8, 0]), ([8, 8, 0, 0], 8));
    }

    #[test]
    fn directions_slide_toward_their_edge() {
        let board: Board = [[0, 0, 0, 2], [0, 0, 0, 0], [0, 0, 0, 0], [2, 0, 0, 0]];

        let (left, _, moved) = apply_move(&board, Direction::Left);
        assert!(moved);
        assert_eq!(left[0], [2, 0, 0, 0]);

        let (right, _, _) = apply_move(&board, Direction::Right);
        assert_eq!(right[3], [0, 0, 0, 2]);

        let (up, _, _) = apply_move(&board, Direction::Up);
        assert_eq!(up[0], [2, 0, 0, 2]);

        let (down, _, _) = apply_move(&board, Direction::Down);
        assert_eq!(down[3], [2, 0, 0, 2]);
    }

    #[test]
    fn down_merges_columns() {
        let board: Board = [[2, 0, 0, 0], [2, 0, 0, 0], [4, 0, 0, 0], [4, 0, 0, 0]];
        let (down, gained, _) = apply_move(&board, Direction::Down);
        assert_eq!(gained, 12);
        assert_eq!([down[2][0], down[3][0]], [4, 8]);
    }

    #[test]
    fn blocked_move_spawns_nothing() {
        let board: Board = [[2, 0, 0, 0], [4, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]];
        let mut game = TileMergeGame::from_board(board, seeded_rng(1), WinCondition::Tile(2048));
        let outcome = game.shift(Direction::Left);
        assert!(!outcome.moved);
        assert_eq!(tile_count(game.board()), 2);
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn successful_move_spawns_one_tile() {
        let board: Board = [[0, 0, 0, 2], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]];
        let mut game = TileMergeGame::from_board(board, seeded_rng(1), WinCondition::Tile(2048));
        assert!(game.shift(Direction::Left).moved);
        assert_eq!(tile_count(game.board()), 2);
    }

    #[test]
    fn new_game_starts_with_two_tiles() {
        let game = TileMergeGame::new(seeded_rng(9), WinCondition::ScoreTarget(1000));
        assert_eq!(tile_count(game.board()), 2);
        assert!(game.board().iter().flatten().all(|v| [0, 2, 4].contains(v)));
    }

    #[test]
    fn score_target_wins() {
        let board: Board = [[512, 512, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]];
        let mut game =
            TileMergeGame::from_board(board, seeded_rng(2), WinCondition::ScoreTarget(1000));
        let outcome = game.shift(Direction::Left);
        assert_eq!(outcome.score_gained, 1024);
        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(game.take_reward(), Some(REWARD));
        assert!(!game.shift(Direction::Right).moved);
    }

    #[test]
    fn tile_target_wins() {
        let board: Board = [[1024, 1024, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]];
        let mut game = TileMergeGame::from_board(board, seeded_rng(3), WinCondition::Tile(2048));
        game.shift(Direction::Right);
        assert_eq!(game.status(), GameStatus::Won);
    }

    #[test]
    fn stuck_detection() {
        let stuck: Board = [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]];
        assert!(is_stuck(&stuck));
        let mut open = stuck;
        open[3][3] = 4;
        assert!(!is_stuck(&open));
    }
}
