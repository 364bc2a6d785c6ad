//! Durable intention state read by the simulation loop

/// Held keys, pointer aim and one-shot requests.
///
/// The input layer writes these; the engine reads them and consumes the
/// one-shot requests (`take_*`).
#[derive(Debug, Clone, Default)]
pub struct Intentions {
    pub attack: bool,
    pub block: bool,
    pub interact: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub move_left: bool,
    pub move_right: bool,
    /// Aim angle from the actor centre to the pointer, radians
    pub aim_angle: f32,
    /// Pointer position in world pixels
    pub pointer: (f32, f32),
    /// Click-to-move destination in grid units
    pub click_target: Option<(f32, f32)>,
    aim_changed: bool,
    dash_requested: bool,
    switch_requested: bool,
    drop_requested: bool,
    /// Set once an interact press picked something up; cleared on release
    interact_consumed: bool,
}

impl Intentions {
    pub fn moving_directionally(&self) -> bool {
        self.move_up || self.move_down || self.move_left || self.move_right
    }

    /// Unit vector of the held direction keys, zero when they cancel out
    pub fn move_vector(&self) -> (f32, f32) {
        let dx = f32::from(u8::from(self.move_right)) - f32::from(u8::from(self.move_left));
        let dy = f32::from(u8::from(self.move_down)) - f32::from(u8::from(self.move_up));
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            (0.0, 0.0)
        } else {
            (dx / len, dy / len)
        }
    }

    pub(crate) fn set_aim(&mut self, angle: f32) {
        self.aim_angle = angle;
        self.aim_changed = true;
    }

    /// New aim since the last call, if any
    pub fn take_aim(&mut self) -> Option<f32> {
        std::mem::take(&mut self.aim_changed).then_some(self.aim_angle)
    }

    pub(crate) fn request_dash(&mut self) {
        self.dash_requested = true;
    }

    pub fn take_dash(&mut self) -> bool {
        std::mem::take(&mut self.dash_requested)
    }

    pub(crate) fn request_switch(&mut self) {
        self.switch_requested = true;
    }

    pub fn take_switch(&mut self) -> bool {
        std::mem::take(&mut self.switch_requested)
    }

    pub(crate) fn request_drop(&mut self) {
        self.drop_requested = true;
    }

    pub fn take_drop(&mut self) -> bool {
        std::mem::take(&mut self.drop_requested)
    }

    pub(crate) fn set_interact(&mut self, held: bool) {
        self.interact = held;
        if !held {
            self.interact_consumed = false;
        }
    }

    /// Mark the current interact press as spent on a pickup
    pub fn consume_interact(&mut self) {
        self.interact_consumed = true;
    }

    /// Interact is held and has not already been spent on a pickup
    pub fn interact_available(&self) -> bool {
        self.interact && !self.interact_consumed
    }

    /// Drop pending one-shot requests
    pub fn clear_requests(&mut self) {
        self.dash_requested = false;
        self.switch_requested = false;
        self.drop_requested = false;
    }
}
