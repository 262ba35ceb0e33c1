//! Bomb maze: walk a 13×13 grid from (1,1) to the exit at (11,11),
//! blasting through destructible blocks on the way.
//!
//! Simulation runs in fixed 100 ms steps; `advance()` accepts any
//! elapsed duration and consumes it step by step. Coordinates are
//! `(x, y)` with `grid[y][x]`.

use rand::Rng;
use serde::Serialize;

use super::{Challenge, GameRng, GameStatus, Reward, RewardLatch};
use crate::progress::challenge::MAZE;

pub const GRID_SIZE: usize = 13;
pub const STEP_MS: u64 = 100;
pub const BOMB_FUSE_MS: u64 = 3000;
pub const EXPLOSION_MS: u64 = 1000;
pub const BASE_MOVE_COOLDOWN_MS: u64 = 200;
pub const MIN_MOVE_COOLDOWN_MS: u64 = 100;
pub const SPEED_BOOST_MS: u64 = 50;
pub const MAX_HIDDEN_POWER_UPS: usize = 3;

const DESTRUCTIBLE_CHANCE: f64 = 0.6;
const POWER_UP_CHANCE: f64 = 0.1;

pub const START: Pos = Pos { x: 1, y: 1 };
pub const EXIT: Pos = Pos { x: 11, y: 11 };

/// Cells that never receive a destructible block.
const KEEP_CLEAR: [Pos; 6] = [
    Pos { x: 1, y: 1 },
    Pos { x: 2, y: 1 },
    Pos { x: 1, y: 2 },
    Pos { x: 11, y: 11 },
    Pos { x: 10, y: 11 },
    Pos { x: 11, y: 10 },
];

pub const REWARD: Reward = Reward {
    challenge: MAZE,
    digit: "9",
    position: 3,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUp {
    ExtraBomb,
    BiggerBlast,
    Speed,
}

const POWER_UP_CYCLE: [PowerUp; 3] = [PowerUp::ExtraBomb, PowerUp::BiggerBlast, PowerUp::Speed];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Wall,
    Destructible { hidden: Option<PowerUp> },
    Bomb { fuse_ms: u64 },
    Explosion { remaining_ms: u64 },
    Exit,
    PowerUp { kind: PowerUp },
}

impl Cell {
    fn is_walkable(self) -> bool {
        matches!(
            self,
            Cell::Empty | Cell::Exit | Cell::PowerUp { .. } | Cell::Bomb { .. }
        )
    }
}

pub type Grid = [[Cell; GRID_SIZE]; GRID_SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn offset(self, pos: Pos) -> Option<Pos> {
        let (x, y) = match self {
            Direction::Up => (Some(pos.x), pos.y.checked_sub(1)),
            Direction::Down => (Some(pos.x), Some(pos.y + 1)),
            Direction::Left => (pos.x.checked_sub(1), Some(pos.y)),
            Direction::Right => (Some(pos.x + 1), Some(pos.y)),
        };
        match (x, y) {
            (Some(x), Some(y)) if x < GRID_SIZE && y < GRID_SIZE => Some(Pos { x, y }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Game already over.
    Ignored,
    /// Last move was less than the cooldown ago.
    CoolingDown,
    Blocked,
    Moved,
    Collected(PowerUp),
    Escaped,
}

/// Fresh random maze.
///
/// Border and every even/even cell are walls. Other cells are
/// destructible with 60 % probability, except around the start and the
/// exit. Up to three destructibles hide a power-up, cycling through the
/// kinds in order.
pub fn generate_grid(rng: &mut GameRng) -> Grid {
    let mut grid = [[Cell::Empty; GRID_SIZE]; GRID_SIZE];
    let last = GRID_SIZE - 1;

    for (y, row) in grid.iter_mut().enumerate() {
        for (x, cell) in row.iter_mut().enumerate() {
            let border = x == 0 || y == 0 || x == last || y == last;
            if border || (x % 2 == 0 && y % 2 == 0) {
                *cell = Cell::Wall;
            } else if !KEEP_CLEAR.contains(&Pos { x, y }) && rng.gen_bool(DESTRUCTIBLE_CHANCE) {
                *cell = Cell::Destructible { hidden: None };
            }
        }
    }
    grid[EXIT.y][EXIT.x] = Cell::Exit;

    let mut placed = 0;
    'rows: for row in grid.iter_mut().take(last).skip(1) {
        for cell in row.iter_mut().take(last).skip(1) {
            if placed >= MAX_HIDDEN_POWER_UPS {
                break 'rows;
            }
            if let Cell::Destructible { hidden } = cell {
                if rng.gen_bool(POWER_UP_CHANCE) {
                    *hidden = Some(POWER_UP_CYCLE[placed % POWER_UP_CYCLE.len()]);
                    placed += 1;
                }
            }
        }
    }
    grid
}

#[derive(Debug, Clone)]
pub struct BombMazeGame {
    grid: Grid,
    player: Pos,
    max_bombs: usize,
    blast_range: usize,
    move_cooldown_ms: u64,
    clock_ms: u64,
    carry_ms: u64,
    last_move_ms: Option<u64>,
    time_left_ms: u64,
    started: bool,
    status: GameStatus,
    latch: RewardLatch,
}

impl BombMazeGame {
    pub fn new(rng: &mut GameRng, time_limit_secs: u64) -> Self {
        Self::with_grid(generate_grid(rng), START, time_limit_secs)
    }

    /// Start from a prepared grid.
    pub fn with_grid(grid: Grid, player: Pos, time_limit_secs: u64) -> Self {
        Self {
            grid,
            player,
            max_bombs: 1,
            blast_range: 1,
            move_cooldown_ms: BASE_MOVE_COOLDOWN_MS,
            clock_ms: 0,
            carry_ms: 0,
            last_move_ms: None,
            time_left_ms: time_limit_secs * 1000,
            started: false,
            status: GameStatus::Playing,
            latch: RewardLatch::default(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cell(&self, pos: Pos) -> Cell {
        self.grid[pos.y][pos.x]
    }

    pub fn player(&self) -> Pos {
        self.player
    }

    pub fn max_bombs(&self) -> usize {
        self.max_bombs
    }

    pub fn blast_range(&self) -> usize {
        self.blast_range
    }

    pub fn move_cooldown_ms(&self) -> u64 {
        self.move_cooldown_ms
    }

    /// Whole seconds left, rounded up.
    pub fn time_left(&self) -> u64 {
        self.time_left_ms.div_ceil(1000)
    }

    pub fn active_bombs(&self) -> usize {
        self.grid
            .iter()
            .flatten()
            .filter(|c| matches!(c, Cell::Bomb { .. }))
            .count()
    }

    /// Move one cell. The countdown starts with the first attempt.
    pub fn step(&mut self, direction: Direction) -> MoveOutcome {
        if self.status != GameStatus::Playing {
            return MoveOutcome::Ignored;
        }
        if let Some(last) = self.last_move_ms {
            if self.clock_ms - last < self.move_cooldown_ms {
                return MoveOutcome::CoolingDown;
            }
        }
        self.started = true;
        self.last_move_ms = Some(self.clock_ms);

        let Some(target) = direction.offset(self.player) else {
            return MoveOutcome::Blocked;
        };
        let cell = self.cell(target);
        if !cell.is_walkable() {
            return MoveOutcome::Blocked;
        }
        self.player = target;

        match cell {
            Cell::Exit => {
                self.status = GameStatus::Won;
                MoveOutcome::Escaped
            }
            Cell::PowerUp { kind } => {
                self.collect(kind);
                self.grid[target.y][target.x] = Cell::Empty;
                MoveOutcome::Collected(kind)
            }
            _ => MoveOutcome::Moved,
        }
    }

    /// Drop a bomb where the player stands. Only on an empty cell and
    /// below the bomb limit.
    pub fn place_bomb(&mut self) -> bool {
        if self.status != GameStatus::Playing
            || self.active_bombs() >= self.max_bombs
            || self.cell(self.player) != Cell::Empty
        {
            return false;
        }
        self.grid[self.player.y][self.player.x] = Cell::Bomb {
            fuse_ms: BOMB_FUSE_MS,
        };
        true
    }

    /// Let `elapsed_ms` of game time pass.
    pub fn advance(&mut self, elapsed_ms: u64) {
        self.clock_ms += elapsed_ms;
        self.carry_ms += elapsed_ms;
        while self.carry_ms >= STEP_MS && self.status == GameStatus::Playing {
            self.carry_ms -= STEP_MS;
            self.sim_step();
        }
    }

    fn sim_step(&mut self) {
        for cell in self.grid.iter_mut().flatten() {
            match cell {
                Cell::Bomb { fuse_ms } => *fuse_ms = fuse_ms.saturating_sub(STEP_MS),
                Cell::Explosion { remaining_ms } => {
                    if *remaining_ms <= STEP_MS {
                        *cell = Cell::Empty;
                    } else {
                        *remaining_ms -= STEP_MS;
                    }
                }
                _ => {}
            }
        }

        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                if self.grid[y][x] == (Cell::Bomb { fuse_ms: 0 }) {
                    self.explode(Pos { x, y });
                }
            }
        }

        if self.started && self.status == GameStatus::Playing {
            self.time_left_ms = self.time_left_ms.saturating_sub(STEP_MS);
            if self.time_left_ms == 0 {
                self.status = GameStatus::Lost;
            }
        }
    }

    /// Centre plus four arms of `blast_range` cells. Walls stop an arm;
    /// a destructible is consumed and stops it. Other bombs caught in
    /// the blast turn into explosion without detonating their own arms.
    fn explode(&mut self, origin: Pos) {
        const ARMS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

        self.burn(origin);
        for (dx, dy) in ARMS {
            for i in 1..=self.blast_range as isize {
                let x = origin.x as isize + dx * i;
                let y = origin.y as isize + dy * i;
                if x < 0 || y < 0 || x >= GRID_SIZE as isize || y >= GRID_SIZE as isize {
                    break;
                }
                if !self.burn(Pos {
                    x: x as usize,
                    y: y as usize,
                }) {
                    break;
                }
            }
        }
    }

    /// Apply the blast to one cell. Returns whether the arm continues.
    fn burn(&mut self, pos: Pos) -> bool {
        let cell = &mut self.grid[pos.y][pos.x];
        match *cell {
            Cell::Wall => return false,
            Cell::Destructible { hidden } => {
                *cell = match hidden {
                    Some(kind) => Cell::PowerUp { kind },
                    None => Cell::Explosion {
                        remaining_ms: EXPLOSION_MS,
                    },
                };
                return false;
            }
            Cell::Empty | Cell::Bomb { .. } => {
                *cell = Cell::Explosion {
                    remaining_ms: EXPLOSION_MS,
                };
            }
            Cell::Explosion { .. } | Cell::Exit | Cell::PowerUp { .. } => {}
        }
        if pos == self.player {
            tracing::debug!(x = pos.x, y = pos.y, "player caught in blast");
            self.status = GameStatus::Lost;
        }
        true
    }

    fn collect(&mut self, kind: PowerUp) {
        match kind {
            PowerUp::ExtraBomb => self.max_bombs += 1,
            PowerUp::BiggerBlast => self.blast_range += 1,
            PowerUp::Speed => {
                self.move_cooldown_ms = self
                    .move_cooldown_ms
                    .saturating_sub(SPEED_BOOST_MS)
                    .max(MIN_MOVE_COOLDOWN_MS);
            }
        }
    }
}

impl Challenge for BombMazeGame {
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
