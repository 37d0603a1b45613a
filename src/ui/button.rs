//! Menu buttons
//!
//! A button fires on a mouse press followed by a release while the pointer is
//! still over it, or after a hand cursor has hovered over it for
//! `HAND_DWELL_SECS`.

use glam::Vec2;

use crate::consts::HAND_DWELL_SECS;
use crate::session::MenuTarget;

/// Screen rectangle, origin top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centered on `center`
    pub fn centered(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    /// Strict: points on the border are outside
    pub fn contains(&self, point: Vec2) -> bool {
        point.x > self.x
            && point.x < self.x + self.width
            && point.y > self.y
            && point.y < self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Mouse state for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub position: Vec2,
    /// Primary button held
    pub pressed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub label: &'static str,
    pub rect: Rect,
    pub target: MenuTarget,
    /// Pointer or hand is over the button (for highlight)
    pub hovered: bool,
    armed: bool,
    dwell_start: Option<f64>,
}

impl Button {
    pub fn new(label: &'static str, rect: Rect, target: MenuTarget) -> Self {
        Self {
            label,
            rect,
            target,
            hovered: false,
            armed: false,
            dwell_start: None,
        }
    }

    /// Feed one frame of pointer and hand input; `now` is in seconds
    pub fn update(&mut self, pointer: PointerState, hand: Option<Vec2>, now: f64) -> Option<MenuTarget> {
        let pointer_over = self.rect.contains(pointer.position);
        let hand_over = hand.is_some_and(|h| self.rect.contains(h));
        self.hovered = pointer_over || hand_over;

        let mut fired = false;
        if pointer_over {
            if pointer.pressed {
                self.armed = true;
            } else if self.armed {
                self.armed = false;
                fired = true;
            }
        } else {
            self.armed = false;
        }

        if hand_over {
            match self.dwell_start {
                None => self.dwell_start = Some(now),
                Some(start) if now - start >= HAND_DWELL_SECS => {
                    self.dwell_start = None;
                    fired = true;
                }
                Some(_) => {}
            }
        } else {
            self.dwell_start = None;
        }

        if fired {
            log::debug!("Button '{}' activated", self.label);
            self.armed = false;
            self.dwell_start = None;
            Some(self.target)
        } else {
            None
        }
    }
}
