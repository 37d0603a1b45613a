//! Menu screens
//!
//! Each non-gameplay phase has a fixed button layout. The host feeds pointer
//! and hand positions to the active `Menu` and passes any returned target to
//! `Session::activate`.

pub mod button;

pub use button::{Button, PointerState, Rect};

use glam::Vec2;

use crate::session::{GamePhase, MenuTarget};

/// Large menu button size in pixels
pub const BUTTON_SIZE: Vec2 = Vec2::new(400.0, 200.0);

/// Buttons for one screen
#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    pub buttons: Vec<Button>,
}

impl Menu {
    /// Layout for `phase` on a `screen`-sized window; `None` while playing
    pub fn for_phase(phase: GamePhase, screen: Vec2) -> Option<Self> {
        let w = screen.x;
        let h = screen.y;
        let center_x = w / 2.0;
        let stacked = |y: f32| Rect::new(center_x - BUTTON_SIZE.x / 2.0, y, BUTTON_SIZE.x, BUTTON_SIZE.y);

        let buttons = match phase {
            GamePhase::MainMenu => vec![
                Button::new(
                    "Play",
                    Rect::centered(Vec2::new(center_x, h / 4.0), BUTTON_SIZE.x, BUTTON_SIZE.y),
                    MenuTarget::PlayerSelect,
                ),
                Button::new(
                    "Help",
                    Rect::centered(Vec2::new(w - 120.0, h - 60.0), 200.0, 100.0),
                    MenuTarget::Help,
                ),
                Button::new(
                    "Exit",
                    Rect::centered(Vec2::new(center_x, h * 2.0 / 3.0), BUTTON_SIZE.x, BUTTON_SIZE.y),
                    MenuTarget::Exit,
                ),
            ],
            GamePhase::PlayerSelect => vec![
                Button::new("One Player", stacked(75.0), MenuTarget::OnePlayer),
                Button::new("Two Players", stacked(275.0), MenuTarget::TwoPlayer),
                Button::new("Main Menu", stacked(475.0), MenuTarget::MainMenu),
            ],
            GamePhase::Help => vec![Button::new(
                "Main Menu",
                Rect::centered(Vec2::new(center_x, h * 3.0 / 4.0), BUTTON_SIZE.x, BUTTON_SIZE.y),
                MenuTarget::MainMenu,
            )],
            GamePhase::Finish => vec![
                Button::new(
                    "Main Menu",
                    Rect::centered(Vec2::new(center_x, h / 3.0), BUTTON_SIZE.x, BUTTON_SIZE.y),
                    MenuTarget::MainMenu,
                ),
                Button::new(
                    "Exit",
                    Rect::centered(Vec2::new(center_x, h * 2.0 / 3.0), BUTTON_SIZE.x, BUTTON_SIZE.y),
                    MenuTarget::Exit,
                ),
            ],
            GamePhase::InGame { .. } | GamePhase::BetweenLevels { .. } | GamePhase::Exit => {
                return None;
            }
        };
        Some(Self { buttons })
    }

    /// Update every button; the first one to fire wins
    pub fn update(&mut self, pointer: PointerState, hand: Option<Vec2>, now: f64) -> Option<MenuTarget> {
        let mut activated = None;
        for button in &mut self.buttons {
            let fired = button.update(pointer, hand, now);
            if activated.is_none() {
                activated = fired;
            }
        }
        activated
    }

    pub fn button(&self, target: MenuTarget) -> Option<&Button> {
        self.buttons.iter().find(|b| b.target == target)
    }
}
