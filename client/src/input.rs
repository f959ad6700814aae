//! Pointer gesture handling: drag-to-aim, click-to-move

use macroquad::prelude::*;
use shared::AIM_RADIUS;

/// A command ready to be sent to the server.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Move { x: f32, y: f32 },
    Shoot { angle: f32 },
}

/// Maps raw pointer events to move/shoot commands.
///
/// Pressing near the player's own rendered position starts aim mode (no
/// command yet); pressing elsewhere is an immediate move. Releasing while
/// aiming fires toward the release point. The gate is always in exactly one
/// of {aiming, not aiming}, and aiming clears unconditionally on release.
pub struct InputGate {
    aiming: bool,
}

impl InputGate {
    pub fn new() -> Self {
        Self { aiming: false }
    }

    pub fn is_aiming(&self) -> bool {
        self.aiming
    }

    /// Handles a pointer press at (px, py). `me` is the local player's
    /// rendered position, if known.
    pub fn pointer_down(&mut self, px: f32, py: f32, me: Option<(f32, f32)>) -> Option<Command> {
        let (mx, my) = me?;

        let dx = px - mx;
        let dy = py - my;
        let d = (dx * dx + dy * dy).sqrt();

        if d < AIM_RADIUS {
            self.aiming = true;
            None
        } else {
            Some(Command::Move { x: px, y: py })
        }
    }

    /// Handles a pointer release at (px, py).
    pub fn pointer_up(&mut self, px: f32, py: f32, me: Option<(f32, f32)>) -> Option<Command> {
        let was_aiming = self.aiming;
        self.aiming = false;

        if !was_aiming {
            return None;
        }

        let (mx, my) = me?;
        let angle = (py - my).atan2(px - mx);
        Some(Command::Shoot { angle })
    }

    /// Samples macroquad's mouse state for this frame and feeds it through
    /// the gate.
    pub fn sample(&mut self, me: Option<(f32, f32)>) -> Option<Command> {
        let (px, py) = mouse_position();

        if is_mouse_button_pressed(MouseButton::Left) {
            return self.pointer_down(px, py, me);
        }
        if is_mouse_button_released(MouseButton::Left) {
            return self.pointer_up(px, py, me);
        }

        None
    }
}

impl Default for InputGate {
    fn default() -> Self {
        Self::new()
    }
}
