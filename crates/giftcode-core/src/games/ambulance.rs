//! Ambulance run: the side game that buys time.
//!
//! Drive home, wait there for two seconds, then drive back to the
//! hospital on a three-lane road. Obstacles end the run; clock pickups
//! pay a time bonus into the session countdown as
//! [`DriveEvent::TimeBonus`]. The run awards no code digit, so it does
//! not implement [`Challenge`](super::Challenge).
//!
//! Movement is frame-normalised: a frame of `delta_ms` counts as
//! `delta_ms / 16.67` reference frames.

use rand::Rng;
use serde::Serialize;

use super::{GameRng, GameStatus};

pub const GAME_WIDTH: f64 = 800.0;
pub const GAME_HEIGHT: f64 = 600.0;
pub const AMBULANCE_SIZE: f64 = 40.0;
pub const ROAD_WIDTH: f64 = 300.0;
pub const ROAD_LANES: usize = 3;
pub const LANE_WIDTH: f64 = ROAD_WIDTH / ROAD_LANES as f64;
pub const TARGET_DISTANCE: f64 = 1000.0;
pub const START_SPEED: u32 = 30;
pub const MAX_SPEED: u32 = 120;
pub const SPEED_PICKUP: u32 = 10;
pub const AT_HOME_MS: f64 = 2000.0;
pub const COLLISION_MARGIN: f64 = 3.0;
pub const PICKUP_SIZE: f64 = 30.0;

const REFERENCE_FRAME_MS: f64 = 16.67;
/// Longer frames are dropped, e.g. the first one after a pause.
const MAX_FRAME_MS: f64 = 100.0;
const OBSTACLE_SPAWN_CHANCE: f64 = 0.008;
const COLLECTIBLE_SPAWN_CHANCE: f64 = 0.002;
const STEER_X: f64 = 1.5;
const STEER_Y: f64 = 1.0;
const ROAD_LEFT: f64 = (GAME_WIDTH - ROAD_WIDTH) / 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrivePhase {
    ToHome,
    AtHome,
    ToHospital,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    Car,
    Cone,
    Barrier,
}

impl ObstacleKind {
    const ALL: [ObstacleKind; 3] = [ObstacleKind::Car, ObstacleKind::Cone, ObstacleKind::Barrier];

    /// Width and height in pixels.
    pub fn size(self) -> (f64, f64) {
        match self {
            ObstacleKind::Car => (35.0, 60.0),
            ObstacleKind::Cone => (20.0, 20.0),
            ObstacleKind::Barrier => (40.0, 30.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectibleKind {
    Speed,
    Clock,
}

/// `x` is the lane centre, `y` the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    pub x: f64,
    pub y: f64,
}

/// `x` and `y` are the centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Collectible {
    pub id: u32,
    pub kind: CollectibleKind,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriveEvent {
    TimeBonus { seconds: u64 },
    SpeedBoost { speed: u32 },
    ArrivedHome,
    Departed,
    Crashed,
    Delivered,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Rect {
    fn inset(self, margin: f64) -> Self {
        Self {
            x: self.x + margin,
            y: self.y + margin,
            w: self.w - margin * 2.0,
            h: self.h - margin * 2.0,
        }
    }

    fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

pub fn lane_centre(lane: usize) -> f64 {
    ROAD_LEFT + lane as f64 * LANE_WIDTH + LANE_WIDTH / 2.0
}

#[derive(Debug, Clone)]
pub struct AmbulanceGame {
    rng: GameRng,
    time_bonus_secs: u64,
    controls: Controls,
    x: f64,
    y: f64,
    obstacles: Vec<Obstacle>,
    collectibles: Vec<Collectible>,
    next_id: u32,
    distance: f64,
    speed: u32,
    score: u32,
    bonus_earned: u64,
    phase: DrivePhase,
    at_home_ms: f64,
    status: GameStatus,
}

impl AmbulanceGame {
    pub fn new(rng: GameRng, time_bonus_secs: u64) -> Self {
        Self {
            rng,
            time_bonus_secs,
            controls: Controls::default(),
            x: GAME_WIDTH / 2.0,
            y: GAME_HEIGHT - 60.0,
            obstacles: Vec::new(),
            collectibles: Vec::new(),
            next_id: 0,
            distance: 0.0,
            speed: START_SPEED,
            score: 0,
            bonus_earned: 0,
            phase: DrivePhase::ToHome,
            at_home_ms: 0.0,
            status: GameStatus::Playing,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn phase(&self) -> DrivePhase {
        self.phase
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Seconds of time bonus collected this run.
    pub fn bonus_earned(&self) -> u64 {
        self.bonus_earned
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn collectibles(&self) -> &[Collectible] {
        &self.collectibles
    }

    /// Route progress for the progress bar: up to 100 on the way home,
    /// back down to 0 on the way to the hospital.
    pub fn progress_percent(&self) -> f64 {
        match self.phase {
            DrivePhase::ToHome => (self.distance / TARGET_DISTANCE * 100.0).min(100.0),
            DrivePhase::AtHome => 100.0,
            DrivePhase::ToHospital => {
                let back = ((self.distance - TARGET_DISTANCE) / TARGET_DISTANCE).max(0.0);
                (100.0 - back * 100.0).max(0.0)
            }
        }
    }

    pub fn set_controls(&mut self, controls: Controls) {
        self.controls = controls;
    }

    pub fn place_obstacle(&mut self, kind: ObstacleKind, lane: usize, y: f64) {
        let id = self.take_id();
        self.obstacles.push(Obstacle {
            id,
            kind,
            x: lane_centre(lane.min(ROAD_LANES - 1)),
            y,
        });
    }

    pub fn place_collectible(&mut self, kind: CollectibleKind, lane: usize, y: f64) {
        let id = self.take_id();
        self.collectibles.push(Collectible {
            id,
            kind,
            x: lane_centre(lane.min(ROAD_LANES - 1)),
            y,
        });
    }

    /// Advance one animation frame.
    pub fn frame(&mut self, delta_ms: f64) -> Vec<DriveEvent> {
        let mut events = Vec::new();
        if self.status != GameStatus::Playing || !(0.0..=MAX_FRAME_MS).contains(&delta_ms) {
            return events;
        }
        let n = delta_ms / REFERENCE_FRAME_MS;

        self.steer(n);

        match self.phase {
            DrivePhase::ToHome => {
                self.distance += f64::from(self.speed) * 0.01 * n;
                if self.distance >= TARGET_DISTANCE {
                    self.distance = TARGET_DISTANCE;
                    self.phase = DrivePhase::AtHome;
                    self.at_home_ms = 0.0;
                    events.push(DriveEvent::ArrivedHome);
                }
            }
            DrivePhase::AtHome => {
                self.at_home_ms += delta_ms;
                if self.at_home_ms >= AT_HOME_MS {
                    self.phase = DrivePhase::ToHospital;
                    events.push(DriveEvent::Departed);
                }
            }
            DrivePhase::ToHospital => {
                self.distance += f64::from(self.speed) * 0.01 * n;
                if self.distance >= TARGET_DISTANCE * 2.0 {
                    self.distance = TARGET_DISTANCE * 2.0;
                    self.status = GameStatus::Won;
                    events.push(DriveEvent::Delivered);
                    return events;
                }
            }
        }

        let scroll = f64::from(self.speed) * 0.05 * n;
        for obstacle in &mut self.obstacles {
            obstacle.y += scroll;
        }
        self.obstacles.retain(|o| o.y < GAME_HEIGHT + 100.0);
        for collectible in &mut self.collectibles {
            collectible.y += scroll;
        }
        self.collectibles.retain(|c| c.y < GAME_HEIGHT + 50.0);

        let body = self.body();
        let hull = body.inset(COLLISION_MARGIN);
        if self.obstacles.iter().any(|o| hull.overlaps(&obstacle_box(o))) {
            self.status = GameStatus::Lost;
            tracing::debug!(distance = self.distance, "ambulance crashed");
            events.push(DriveEvent::Crashed);
            return events;
        }

        let (picked, kept): (Vec<Collectible>, Vec<Collectible>) = self
            .collectibles
            .drain(..)
            .partition(|c| body.overlaps(&pickup_box(c)));
        self.collectibles = kept;
        for collectible in picked {
            self.score += 100;
            match collectible.kind {
                CollectibleKind::Speed => {
                    self.speed = (self.speed + SPEED_PICKUP).min(MAX_SPEED);
                    events.push(DriveEvent::SpeedBoost { speed: self.speed });
                }
                CollectibleKind::Clock => {
                    self.bonus_earned += self.time_bonus_secs;
                    events.push(DriveEvent::TimeBonus {
                        seconds: self.time_bonus_secs,
                    });
                }
            }
        }

        if self.rng.gen::<f64>() < OBSTACLE_SPAWN_CHANCE * n {
            let lane = self.rng.gen_range(0..ROAD_LANES);
            let kind = ObstacleKind::ALL[self.rng.gen_range(0..ObstacleKind::ALL.len())];
            self.place_obstacle(kind, lane, -50.0);
        }
        if self.rng.gen::<f64>() < COLLECTIBLE_SPAWN_CHANCE * n {
            let lane = self.rng.gen_range(0..ROAD_LANES);
            let kind = if self.rng.gen_bool(0.5) {
                CollectibleKind::Speed
            } else {
                CollectibleKind::Clock
            };
            self.place_collectible(kind, lane, -30.0);
        }

        events
    }

    fn steer(&mut self, n: f64) {
        let c = self.controls;
        if c.left && self.x > ROAD_LEFT {
            self.x -= STEER_X * n;
        }
        if c.right && self.x < ROAD_LEFT + ROAD_WIDTH - AMBULANCE_SIZE {
            self.x += STEER_X * n;
        }
        if c.up && self.y > 0.0 {
            self.y -= STEER_Y * n;
        }
        if c.down && self.y < GAME_HEIGHT - AMBULANCE_SIZE {
            self.y += STEER_Y * n;
        }
    }

    fn body(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            w: AMBULANCE_SIZE,
            h: AMBULANCE_SIZE,
        }
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn obstacle_box(o: &Obstacle) -> Rect {
    let (w, h) = o.kind.size();
    Rect {
        x: o.x - w / 2.0,
        y: o.y,
        w,
        h,
    }
    .inset(COLLISION_MARGIN)
}

fn pickup_box(c: &Collectible) -> Rect {
    Rect {
        x: c.x - PICKUP_SIZE / 2.0,
        y: c.y - PICKUP_SIZE / 2.0,
        w: PICKUP_SIZE,
        h: PICKUP_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::seeded_rng;

    const FRAME: f64 = REFERENCE_FRAME_MS;

    fn game() -> AmbulanceGame {
        AmbulanceGame::new(seeded_rng(11), 15)
    }

    #[test]
    fn starts_in_the_middle_lane() {
        let game = game();
        assert_eq!(game.position(), (400.0, 540.0));
        assert_eq!(game.speed(), START_SPEED);
        assert_eq!(game.phase(), DrivePhase::ToHome);
        assert_eq!(lane_centre(1), 400.0);
    }

    #[test]
    fn long_frames_are_dropped() {
        let mut game = game();
        assert!(game.frame(250.0).is_empty());
        assert_eq!(game.distance(), 0.0);
    }

    #[test]
    fn distance_scales_with_speed() {
        let mut game = game();
        game.frame(FRAME);
        assert!((game.distance() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn steering_stays_on_the_road() {
        let mut game = game();
        game.set_controls(Controls {
            right: true,
            ..Controls::default()
        });
        for _ in 0..100 {
            game.frame(FRAME);
        }
        let (x, _) = game.position();
        assert!(x >= ROAD_LEFT + ROAD_WIDTH - AMBULANCE_SIZE);
        assert!(x < ROAD_LEFT + ROAD_WIDTH - AMBULANCE_SIZE + STEER_X);
    }

    #[test]
    fn obstacle_collision_ends_the_run() {
        let mut game = game();
        game.place_obstacle(ObstacleKind::Car, 1, 500.0);
        assert_eq!(game.frame(FRAME), vec![DriveEvent::Crashed]);
        assert_eq!(game.status(), GameStatus::Lost);
        assert!(game.frame(FRAME).is_empty());
    }

    #[test]
    fn margin_forgives_grazing_contact() {
        let mut game = game();
        // Cone bottom edge 2 px into the ambulance, inside both margins.
        game.place_obstacle(ObstacleKind::Cone, 1, 540.0 - 20.0 + 2.0 - 1.5);
        assert!(game.frame(FRAME).is_empty());
        assert_eq!(game.status(), GameStatus::Playing);
    }

    #[test]
    fn clock_pickup_pays_time_bonus() {
        let mut game = game();
        game.place_collectible(CollectibleKind::Clock, 1, 560.0);
        let events = game.frame(FRAME);
        assert_eq!(events, vec![DriveEvent::TimeBonus { seconds: 15 }]);
        assert_eq!(game.bonus_earned(), 15);
        assert_eq!(game.score(), 100);
        assert!(game.collectibles().is_empty());
    }

    #[test]
    fn speed_pickup_is_capped() {
        let mut game = game();
        for _ in 0..12 {
            game.place_collectible(CollectibleKind::Speed, 1, 560.0);
            game.frame(FRAME);
        }
        assert_eq!(game.speed(), MAX_SPEED);
    }

    #[test]
    fn full_route_home_and_back() {
        let mut game = game();
        game.distance = TARGET_DISTANCE - 0.1;
        assert_eq!(game.frame(FRAME), vec![DriveEvent::ArrivedHome]);
        assert_eq!(game.progress_percent(), 100.0);

        let mut departed = false;
        for _ in 0..130 {
            if game.frame(FRAME).contains(&DriveEvent::Departed) {
                departed = true;
                break;
            }
        }
        assert!(departed);
        assert_eq!(game.phase(), DrivePhase::ToHospital);
        assert_eq!(game.distance(), TARGET_DISTANCE);

        game.distance = TARGET_DISTANCE * 2.0 - 0.1;
        assert_eq!(game.frame(FRAME), vec![DriveEvent::Delivered]);
        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(game.progress_percent(), 0.0);
    }
}
