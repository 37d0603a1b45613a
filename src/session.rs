//! Session state machine
//!
//! Owns the current level and one ball per active player, and moves between
//! menus, play and the finish screen. All transitions happen from `activate`
//! (menu buttons), `confirm_ready` (between levels) or `update` (per frame).
//!
//! - Finished players are frozen until every active player is in.
//! - The exit signal returns to the main menu from anywhere but the menu itself.
//! - `Exit` is terminal.

use serde::{Deserialize, Serialize};

use crate::levels::{LevelError, LevelSource};
use crate::settings::PhysicsSettings;
use crate::sim::{Ball, BallInput, Level, tick};

/// Number of players in a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerCount {
    One,
    Two,
}

impl PlayerCount {
    pub fn count(self) -> usize {
        match self {
            PlayerCount::One => 1,
            PlayerCount::Two => 2,
        }
    }
}

/// Player identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    pub fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }
}

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    MainMenu,
    PlayerSelect,
    Help,
    /// Active play
    InGame { players: PlayerCount },
    /// Level cleared, waiting for every player to confirm
    BetweenLevels {
        players: PlayerCount,
        p1_ready: bool,
        p2_ready: bool,
    },
    /// Last level cleared
    Finish,
    Exit,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::MainMenu => "MainMenu",
            GamePhase::PlayerSelect => "PlayerSelect",
            GamePhase::Help => "Help",
            GamePhase::InGame { .. } => "InGame",
            GamePhase::BetweenLevels { .. } => "BetweenLevels",
            GamePhase::Finish => "Finish",
            GamePhase::Exit => "Exit",
        }
    }
}

/// Destination of a menu button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuTarget {
    PlayerSelect,
    Help,
    MainMenu,
    OnePlayer,
    TwoPlayer,
    Exit,
}

/// Everything the session consumes in one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub players: [BallInput; 2],
    /// Global back/exit signal
    pub exit: bool,
}

/// Things that happened during a session call
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    LevelStarted { level: usize },
    /// Seconds the player needed for this level
    PlayerFinished {
        player: PlayerId,
        level: usize,
        time: f32,
    },
    LevelComplete { level: usize },
    GameFinished,
}

/// Per-player progress
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSlot {
    pub ball: Ball,
    /// Reached the current level's finish zone
    pub finished: bool,
    pub level_time: f32,
    pub total_time: f32,
}

impl PlayerSlot {
    fn new(spawn: glam::Vec3) -> Self {
        Self {
            ball: Ball::new(spawn),
            finished: false,
            level_time: 0.0,
            total_time: 0.0,
        }
    }
}

/// One play-through, from main menu to exit
pub struct Session<S: LevelSource> {
    source: S,
    settings: PhysicsSettings,
    phase: GamePhase,
    level_index: usize,
    level: Option<Level<S::Terrain>>,
    players: Vec<PlayerSlot>,
}

impl<S: LevelSource> Session<S> {
    pub fn new(source: S, settings: PhysicsSettings) -> Self {
        Self {
            source,
            settings,
            phase: GamePhase::MainMenu,
            level_index: 0,
            level: None,
            players: Vec::new(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    /// Zero-based index of the current level
    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn level(&self) -> Option<&Level<S::Terrain>> {
        self.level.as_ref()
    }

    pub fn players(&self) -> &[PlayerSlot] {
        &self.players
    }

    /// Balls to draw this frame, in player order
    pub fn balls(&self) -> impl Iterator<Item = &Ball> {
        self.players.iter().map(|p| &p.ball)
    }

    /// Whether `position` is inside the current level's finish zone
    pub fn reached_finish(&self, position: glam::Vec3) -> bool {
        self.level
            .as_ref()
            .is_some_and(|level| level.reached_finish(position))
    }

    /// Apply a menu button press
    pub fn activate(&mut self, target: MenuTarget) -> Result<Vec<SessionEvent>, LevelError> {
        let mut events = Vec::new();
        match (self.phase, target) {
            (GamePhase::Exit, _) => {}
            (GamePhase::MainMenu, MenuTarget::PlayerSelect) => {
                self.set_phase(GamePhase::PlayerSelect, &mut events);
            }
            (GamePhase::MainMenu, MenuTarget::Help) => {
                self.set_phase(GamePhase::Help, &mut events);
            }
            (GamePhase::MainMenu | GamePhase::Finish, MenuTarget::Exit) => {
                self.set_phase(GamePhase::Exit, &mut events);
            }
            (GamePhase::PlayerSelect, MenuTarget::OnePlayer) => {
                self.start_game(PlayerCount::One, &mut events)?;
            }
            (GamePhase::PlayerSelect, MenuTarget::TwoPlayer) => {
                self.start_game(PlayerCount::Two, &mut events)?;
            }
            (phase, MenuTarget::MainMenu) if phase != GamePhase::MainMenu => {
                self.return_to_menu(&mut events);
            }
            (phase, target) => {
                log::debug!("Ignoring {:?} in {}", target, phase.as_str());
            }
        }
        Ok(events)
    }

    /// Mark a player ready between levels; play resumes once all are ready
    pub fn confirm_ready(&mut self, player: PlayerId) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let GamePhase::BetweenLevels {
            players,
            mut p1_ready,
            mut p2_ready,
        } = self.phase
        else {
            return events;
        };

        match player {
            PlayerId::One => p1_ready = true,
            PlayerId::Two if players == PlayerCount::Two => p2_ready = true,
            PlayerId::Two => return events,
        }

        let all_ready = p1_ready && (players == PlayerCount::One || p2_ready);
        if all_ready {
            for slot in &mut self.players {
                slot.finished = false;
                slot.level_time = 0.0;
            }
            self.set_phase(GamePhase::InGame { players }, &mut events);
            events.push(SessionEvent::LevelStarted {
                level: self.level_index,
            });
        } else {
            self.phase = GamePhase::BetweenLevels {
                players,
                p1_ready,
                p2_ready,
            };
        }
        events
    }

    /// Advance the session by one frame
    pub fn update(&mut self, input: &FrameInput, dt: f32) -> Result<Vec<SessionEvent>, LevelError> {
        let mut events = Vec::new();

        if input.exit && !matches!(self.phase, GamePhase::MainMenu | GamePhase::Exit) {
            self.return_to_menu(&mut events);
            return Ok(events);
        }

        let GamePhase::InGame { players } = self.phase else {
            return Ok(events);
        };
        let Some(level) = self.level.as_ref() else {
            return Ok(events);
        };

        for (i, slot) in self.players.iter_mut().enumerate() {
            if slot.finished {
                continue;
            }
            tick(
                &mut slot.ball,
                &input.players[i],
                &level.terrain,
                &self.settings,
                level.spawn,
            );
            slot.level_time += dt;

            if level.reached_finish(slot.ball.position) {
                slot.finished = true;
                slot.total_time += slot.level_time;
                log::info!(
                    "Player {} finished level {} in {:.2}s",
                    i + 1,
                    self.level_index + 1,
                    slot.level_time
                );
                events.push(SessionEvent::PlayerFinished {
                    player: PlayerId::ALL[i],
                    level: self.level_index,
                    time: slot.level_time,
                });
            }
        }

        if self.players.iter().all(|p| p.finished) {
            events.push(SessionEvent::LevelComplete {
                level: self.level_index,
            });
            let next = self.level_index + 1;
            if next < self.source.level_count() {
                let level = match self.source.load(next) {
                    Ok(level) => level,
                    Err(e) => {
                        // Not retried: drop back to the menu
                        log::error!("Failed to load level {}: {e}", next + 1);
                        self.return_to_menu(&mut events);
                        return Err(e);
                    }
                };
                let spawn = level.spawn_point(self.settings.sphere_radius);
                for slot in &mut self.players {
                    slot.ball = Ball::new(spawn);
                }
                self.level = Some(level);
                self.level_index = next;
                self.set_phase(
                    GamePhase::BetweenLevels {
                        players,
                        p1_ready: false,
                        p2_ready: false,
                    },
                    &mut events,
                );
            } else {
                self.set_phase(GamePhase::Finish, &mut events);
                events.push(SessionEvent::GameFinished);
            }
        }

        Ok(events)
    }

    fn start_game(&mut self, players: PlayerCount, events: &mut Vec<SessionEvent>) -> Result<(), LevelError> {
        let level = self.source.load(0)?;
        let spawn = level.spawn_point(self.settings.sphere_radius);
        self.players = (0..players.count())
            .map(|_| PlayerSlot::new(spawn))
            .collect();
        self.level = Some(level);
        self.level_index = 0;
        self.set_phase(GamePhase::InGame { players }, events);
        events.push(SessionEvent::LevelStarted { level: 0 });
        Ok(())
    }

    fn return_to_menu(&mut self, events: &mut Vec<SessionEvent>) {
        self.level = None;
        self.players.clear();
        self.level_index = 0;
        self.set_phase(GamePhase::MainMenu, events);
    }

    fn set_phase(&mut self, to: GamePhase, events: &mut Vec<SessionEvent>) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::info!("Phase {} -> {}", from.as_str(), to.as_str());
        self.phase = to;
        events.push(SessionEvent::PhaseChanged { from, to });
    }
}
