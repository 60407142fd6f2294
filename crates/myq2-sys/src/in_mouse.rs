// in_mouse.rs -- mouse button, wheel and motion normalization
//
// Two delivery paths exist. The legacy path sees the full button state
// with every message and has to diff it against the previous state; the
// raw path sees explicit per-button down/up transitions plus relative
// motion.

use myq2_common::keys::*;

use crate::in_keys::LogicalKeyEvent;
use crate::platform::EventSink;

pub const MOUSE_BUTTONS: usize = 5;

/// One of the mouse buttons the engine binds. Only the BUTTON_* values
/// exist, so the index is always in range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ButtonId(u8);

pub const BUTTON_LEFT: ButtonId = ButtonId(0);
pub const BUTTON_RIGHT: ButtonId = ButtonId(1);
pub const BUTTON_MIDDLE: ButtonId = ButtonId(2);
pub const BUTTON_X1: ButtonId = ButtonId(3);
pub const BUTTON_X2: ButtonId = ButtonId(4);

const BUTTON_KEYS: [Keynum; MOUSE_BUTTONS] = [K_MOUSE1, K_MOUSE2, K_MOUSE3, K_MOUSE4, K_MOUSE5];

impl ButtonId {
    pub const ALL: [ButtonId; MOUSE_BUTTONS] = [BUTTON_LEFT, BUTTON_RIGHT, BUTTON_MIDDLE, BUTTON_X1, BUTTON_X2];

    pub fn from_index(index: usize) -> Option<Self> {
        (index < MOUSE_BUTTONS).then_some(ButtonId(index as u8))
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub fn keynum(self) -> Keynum {
        BUTTON_KEYS[self.index()]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MouseButtonEvent {
    pub button: ButtonId,
    pub down: bool,
    pub time: u32,
}

impl MouseButtonEvent {
    pub fn keynum(&self) -> Keynum {
        self.button.keynum()
    }
}

// ============================================================
// Legacy path
// ============================================================

/// Pressed/released state of every mouse button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonState([bool; MOUSE_BUTTONS]);

impl ButtonState {
    pub const fn new(pressed: [bool; MOUSE_BUTTONS]) -> Self {
        ButtonState(pressed)
    }

    pub fn with(mut self, button: ButtonId) -> Self {
        self.0[button.index()] = true;
        self
    }

    pub fn is_pressed(&self, button: ButtonId) -> bool {
        self.0[button.index()]
    }

    pub fn set(&mut self, button: ButtonId, pressed: bool) {
        self.0[button.index()] = pressed;
    }
}

/// Diff two button states into press/release events in button order.
///
/// A single native message can carry transitions of several buttons at
/// once, so every button is checked on every call.
pub fn reconcile_buttons(previous: ButtonState, new: ButtonState, time: u32) -> Vec<MouseButtonEvent> {
    if previous == new {
        return Vec::new();
    }

    ButtonId::ALL
        .into_iter()
        .filter(|&b| previous.is_pressed(b) != new.is_pressed(b))
        .map(|b| MouseButtonEvent { button: b, down: new.is_pressed(b), time })
        .collect()
}

// ============================================================
// Wheel
// ============================================================

/// Expand a wheel notification into key press/release pairs.
///
/// Only the sign of `delta` matters. Vertical wheel repeats `lines` times
/// (clamped to 1..=9); horizontal wheel always sends one pair.
pub fn wheel_events(delta: i32, horizontal: bool, lines: u32, time: u32) -> Vec<LogicalKeyEvent> {
    let key = match (horizontal, delta.signum()) {
        (_, 0) => return Vec::new(),
        (false, 1) => K_MWHEELUP,
        (false, _) => K_MWHEELDOWN,
        (true, 1) => K_MWHEELRIGHT,
        (true, _) => K_MWHEELLEFT,
    };

    let repeats = if horizontal { 1 } else { lines.clamp(1, 9) };

    let mut events = Vec::with_capacity(repeats as usize * 2);
    for _ in 0..repeats {
        events.push(LogicalKeyEvent::new(key, true, time));
        events.push(LogicalKeyEvent::new(key, false, time));
    }
    events
}

// ============================================================
// Raw path
// ============================================================

/// Down/up flags of one button in a raw update. Both may be set when a
/// full click was collapsed into one notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonTransition {
    pub down: bool,
    pub up: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawButtonFlags {
    pub buttons: [ButtonTransition; MOUSE_BUTTONS],
    pub wheel: Option<i16>,
    pub hwheel: Option<i16>,
}

impl RawButtonFlags {
    pub fn press(mut self, button: ButtonId) -> Self {
        self.buttons[button.index()].down = true;
        self
    }

    pub fn release(mut self, button: ButtonId) -> Self {
        self.buttons[button.index()].up = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.wheel.is_none()
            && self.hwheel.is_none()
            && self.buttons.iter().all(|b| !b.down && !b.up)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawMotion {
    Relative { dx: i32, dy: i32 },
    /// Absolute pointer devices (tablets, remote desktop). Not accumulated.
    Absolute { x: i32, y: i32 },
}

impl Default for RawMotion {
    fn default() -> Self {
        RawMotion::Relative { dx: 0, dy: 0 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawMouseUpdate {
    pub flags: RawButtonFlags,
    pub motion: RawMotion,
}

/// Relative motion gathered between two consumes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionDelta {
    pub dx: i32,
    pub dy: i32,
}

impl MotionDelta {
    pub fn accumulate(&mut self, dx: i32, dy: i32) {
        self.dx = self.dx.saturating_add(dx);
        self.dy = self.dy.saturating_add(dy);
    }

    /// Return the accumulated motion and reset to zero.
    pub fn take(&mut self) -> (i32, i32) {
        let d = (self.dx, self.dy);
        *self = MotionDelta::default();
        d
    }

    pub fn clear(&mut self) {
        *self = MotionDelta::default();
    }
}

/// Process one raw mouse update.
///
/// Outside the client area only releases go through, so a click on the
/// window frame can't start a grab; motion is dropped there as well.
/// Button events are sent before wheel events.
pub fn raw_mouse_event(
    update: &RawMouseUpdate,
    cursor_inside: bool,
    wheel_lines: u32,
    time: u32,
    motion: &mut MotionDelta,
    sink: &mut dyn EventSink,
) {
    let flags = &update.flags;

    if !cursor_inside {
        for (button, b) in ButtonId::ALL.into_iter().zip(&flags.buttons) {
            if b.up {
                sink.button_event(MouseButtonEvent { button, down: false, time });
            }
        }
        return;
    }

    for (button, b) in ButtonId::ALL.into_iter().zip(&flags.buttons) {
        if b.down {
            sink.button_event(MouseButtonEvent { button, down: true, time });
        }
        if b.up {
            sink.button_event(MouseButtonEvent { button, down: false, time });
        }
    }

    if let Some(delta) = flags.wheel {
        for ev in wheel_events(delta as i32, false, wheel_lines, time) {
            sink.key_event(ev);
        }
    }
    if let Some(delta) = flags.hwheel {
        for ev in wheel_events(delta as i32, true, wheel_lines, time) {
            sink.key_event(ev);
        }
    }

    if let RawMotion::Relative { dx, dy } = update.motion {
        motion.accumulate(dx, dy);
    }
}
