//! Input intention layer
//!
//! Raw device events (keyboard codes, pointer moves, mouse buttons) become
//! durable [`Intentions`]. This layer never touches combat state; the only
//! thing it can reject on its own is a dash that is still on cooldown.

pub mod intent;

pub use intent::Intentions;

use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::game::character::Character;
use crate::game::constants::{CELL_SIZE, GRID_SIZE};

pub const DEFAULT_VIEWPORT: (f32, f32) = (1280.0, 720.0);

/// Device event as delivered by a front end
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    KeyDown { code: String },
    KeyUp { code: String },
    /// Pointer position in viewport pixels
    PointerMove { x: f32, y: f32 },
    MouseDown { button: u8 },
    MouseUp { button: u8 },
}

/// What a bound key does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Attack,
    Block,
    Interact,
    Dash,
    SwitchWeapon,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
}

/// Key code to action table
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<String, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let map = [
            ("KeyQ", Action::Attack),
            ("KeyW", Action::Block),
            ("KeyE", Action::Interact),
            ("KeyR", Action::Dash),
            ("Space", Action::SwitchWeapon),
            ("ArrowUp", Action::MoveUp),
            ("ArrowDown", Action::MoveDown),
            ("ArrowLeft", Action::MoveLeft),
            ("ArrowRight", Action::MoveRight),
        ]
        .into_iter()
        .map(|(code, action)| (code.to_string(), action))
        .collect();
        Self { map }
    }
}

impl KeyBindings {
    pub fn action(&self, code: &str) -> Option<Action> {
        self.map.get(code).copied()
    }

    pub fn bind(&mut self, code: impl Into<String>, action: Action) {
        self.map.insert(code.into(), action);
    }
}

/// Something the input layer refused, to be shown as warning feedback
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: &'static str,
}

/// Viewport that follows the local actor, clamped to the arena
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// Top-left corner in world pixels
    pub x: f32,
    pub y: f32,
    pub viewport: (f32, f32),
}

impl Camera {
    pub fn new(viewport: (f32, f32)) -> Self {
        Self { x: 0.0, y: 0.0, viewport }
    }

    pub fn follow(&mut self, target: &Character) {
        let world = GRID_SIZE * CELL_SIZE;
        let max_x = (world - self.viewport.0).max(0.0);
        let max_y = (world - self.viewport.1).max(0.0);
        self.x = (target.x * CELL_SIZE - self.viewport.0 / 2.0).clamp(0.0, max_x);
        self.y = (target.y * CELL_SIZE - self.viewport.1 / 2.0).clamp(0.0, max_y);
    }

    pub fn to_world(&self, screen_x: f32, screen_y: f32) -> (f32, f32) {
        (screen_x + self.x, screen_y + self.y)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT)
    }
}

pub struct InputLayer {
    pub intents: Intentions,
    pub camera: Camera,
    bindings: KeyBindings,
}

impl InputLayer {
    pub fn new(bindings: KeyBindings, camera: Camera) -> Self {
        Self {
            intents: Intentions::default(),
            camera,
            bindings,
        }
    }

    /// Fold one device event into the intentions
    pub fn apply(&mut self, event: &InputEvent, local: &Character) -> Option<Notice> {
        match event {
            InputEvent::KeyDown { code } => {
                let action = self.bindings.action(code)?;
                self.press(action, true, local)
            }
            InputEvent::KeyUp { code } => {
                let action = self.bindings.action(code)?;
                self.press(action, false, local)
            }
            InputEvent::PointerMove { x, y } => {
                let (wx, wy) = self.camera.to_world(*x, *y);
                self.intents.pointer = (wx, wy);
                let angle = (wy - local.y * CELL_SIZE).atan2(wx - local.x * CELL_SIZE);
                self.intents.set_aim(angle);
                None
            }
            InputEvent::MouseDown { button: 0 } => {
                self.intents.request_drop();
                None
            }
            InputEvent::MouseDown { button: 2 } => {
                let (wx, wy) = self.intents.pointer;
                self.intents.click_target = Some((wx / CELL_SIZE, wy / CELL_SIZE));
                debug!(x = wx / CELL_SIZE, y = wy / CELL_SIZE, "Move target set");
                None
            }
            InputEvent::MouseDown { .. } | InputEvent::MouseUp { .. } => None,
        }
    }

    fn press(&mut self, action: Action, down: bool, local: &Character) -> Option<Notice> {
        let intents = &mut self.intents;
        match action {
            Action::Attack => intents.attack = down,
            Action::Block => intents.block = down,
            Action::Interact => intents.set_interact(down),
            Action::MoveUp => intents.move_up = down,
            Action::MoveDown => intents.move_down = down,
            Action::MoveLeft => intents.move_left = down,
            Action::MoveRight => intents.move_right = down,
            Action::SwitchWeapon if down => intents.request_switch(),
            Action::Dash if down => {
                if local.timers.dash > 0.0 {
                    return Some(Notice { text: "Dash on cooldown" });
                }
                intents.request_dash();
            }
            Action::SwitchWeapon | Action::Dash => {}
        }
        None
    }
}

impl Default for InputLayer {
    fn default() -> Self {
        Self::new(KeyBindings::default(), Camera::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::character::ActorKind;
    use crate::game::weapons::ClassKey;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use uuid::Uuid;

    fn local(x: f32, y: f32) -> Character {
        Character::new(Uuid::new_v4(), ActorKind::Player, "me", ClassKey::Swordsman, "#fff", x, y)
    }

    fn key_down(code: &str) -> InputEvent {
        InputEvent::KeyDown { code: code.to_string() }
    }

    #[rstest]
    #[case("KeyQ", Action::Attack)]
    #[case("KeyW", Action::Block)]
    #[case("KeyE", Action::Interact)]
    #[case("KeyR", Action::Dash)]
    #[case("Space", Action::SwitchWeapon)]
    #[case("ArrowLeft", Action::MoveLeft)]
    fn default_bindings(#[case] code: &str, #[case] action: Action) {
        assert_eq!(KeyBindings::default().action(code), Some(action));
    }

    #[test]
    fn rebinding_moves_an_action_to_another_key() {
        let mut bindings = KeyBindings::default();
        bindings.bind("KeyF", Action::Attack);
        let mut input = InputLayer::new(bindings, Camera::default());
        input.apply(&key_down("KeyF"), &local(5.0, 5.0));
        assert!(input.intents.attack);
    }

    #[test]
    fn held_keys_track_press_and_release() {
        let me = local(5.0, 5.0);
        let mut input = InputLayer::default();
        input.apply(&key_down("KeyW"), &me);
        assert!(input.intents.block);
        input.apply(&InputEvent::KeyUp { code: "KeyW".into() }, &me);
        assert!(!input.intents.block);
        assert_eq!(input.apply(&key_down("KeyZ"), &me), None);
    }

    #[test]
    fn dash_on_cooldown_is_rejected_with_notice() {
        let mut me = local(5.0, 5.0);
        me.timers.dash = 1.0;
        let mut input = InputLayer::default();
        let notice = input.apply(&key_down("KeyR"), &me);
        assert!(notice.is_some());
        assert!(!input.intents.take_dash());

        me.timers.dash = 0.0;
        assert!(input.apply(&key_down("KeyR"), &me).is_none());
        assert!(input.intents.take_dash());
    }

    #[test]
    fn pointer_aim_is_measured_from_actor_centre() {
        let me = local(2.0, 2.0);
        let mut input = InputLayer::default();
        // actor centre is at (160, 160) px, camera at origin
        input.apply(&InputEvent::PointerMove { x: 160.0, y: 240.0 }, &me);
        assert_relative_eq!(input.intents.aim_angle, std::f32::consts::FRAC_PI_2);
        assert_eq!(input.intents.take_aim(), Some(input.intents.aim_angle));
    }

    #[test]
    fn right_click_sets_move_target_in_grid_units() {
        let me = local(2.0, 2.0);
        let mut input = InputLayer::default();
        input.apply(&InputEvent::PointerMove { x: 400.0, y: 200.0 }, &me);
        input.apply(&InputEvent::MouseDown { button: 2 }, &me);
        assert_eq!(input.intents.click_target, Some((5.0, 2.5)));
    }

    #[test]
    fn left_click_requests_drop() {
        let me = local(2.0, 2.0);
        let mut input = InputLayer::default();
        input.apply(&InputEvent::MouseDown { button: 0 }, &me);
        assert!(input.intents.take_drop());
    }

    #[test]
    fn camera_follows_and_clamps() {
        let mut camera = Camera::default();
        camera.follow(&local(1.0, 1.0));
        assert_eq!((camera.x, camera.y), (0.0, 0.0));
        camera.follow(&local(10.0, 10.0));
        assert_relative_eq!(camera.x, 800.0 - 640.0);
        assert_relative_eq!(camera.y, 800.0 - 360.0);
        camera.follow(&local(19.5, 19.5));
        assert_relative_eq!(camera.x, 1600.0 - 1280.0);
        assert_relative_eq!(camera.y, 1600.0 - 720.0);
    }

    #[test]
    fn events_parse_from_json() {
        let event: InputEvent = serde_json::from_str(r#"{"type":"key_down","code":"KeyQ"}"#).unwrap();
        assert_eq!(event, key_down("KeyQ"));
        let event: InputEvent = serde_json::from_str(r#"{"type":"pointer_move","x":1.0,"y":2.0}"#).unwrap();
        assert_eq!(event, InputEvent::PointerMove { x: 1.0, y: 2.0 });
    }
}
