// in_keys.rs -- keyboard scancode translation
//
// Maps hardware scancodes (set 1, as delivered in the key message lParam)
// to logical key numbers. The extended flag separates the arrow/editing
// cluster from the numpad keys that share its scancodes, and the left and
// right modifier keys from each other.

use log::debug;

use myq2_common::keys::*;

/// One semantic key transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogicalKeyEvent {
    pub key: Keynum,
    pub down: bool,
    /// Message time in milliseconds.
    pub time: u32,
}

impl LogicalKeyEvent {
    pub const fn new(key: Keynum, down: bool, time: u32) -> Self {
        Self { key, down, time }
    }
}

// ============================================================
// Scancode to key mapping table
// ============================================================

const N: Keynum = Keynum(0);

const fn c(ch: u8) -> Keynum {
    Keynum::from_char(ch)
}

#[rustfmt::skip]
pub const SCANTOKEY: [Keynum; 128] = [
//  0            1           2           3               4           5               6            7
//  8            9           A           B               C           D               E            F
    N,           K_ESCAPE,   c(b'1'),    c(b'2'),        c(b'3'),    c(b'4'),        c(b'5'),     c(b'6'),
    c(b'7'),     c(b'8'),    c(b'9'),    c(b'0'),        c(b'-'),    c(b'='),        K_BACKSPACE, K_TAB,        // 0
    c(b'q'),     c(b'w'),    c(b'e'),    c(b'r'),        c(b't'),    c(b'y'),        c(b'u'),     c(b'i'),
    c(b'o'),     c(b'p'),    c(b'['),    c(b']'),        K_ENTER,    K_CTRL,         c(b'a'),     c(b's'),      // 1
    c(b'd'),     c(b'f'),    c(b'g'),    c(b'h'),        c(b'j'),    c(b'k'),        c(b'l'),     c(b';'),
    c(b'\''),    c(b'`'),    K_LSHIFT,   c(b'\\'),       c(b'z'),    c(b'x'),        c(b'c'),     c(b'v'),      // 2
    c(b'b'),     c(b'n'),    c(b'm'),    c(b','),        c(b'.'),    c(b'/'),        K_RSHIFT,    K_KP_MULTIPLY,
    K_ALT,       K_SPACE,    K_CAPSLOCK, K_F1,           K_F2,       K_F3,           K_F4,        K_F5,         // 3
    K_F6,        K_F7,       K_F8,       K_F9,           K_F10,      K_PAUSE,        K_SCROLLOCK, K_HOME,
    K_UPARROW,   K_PGUP,     K_KP_MINUS, K_LEFTARROW,    K_KP_5,     K_RIGHTARROW,   K_KP_PLUS,   K_END,        // 4
    K_DOWNARROW, K_PGDN,     K_INS,      K_DEL,          N,          N,              N,           K_F11,
    K_F12,       N,          N,          K_LWINKEY,      K_RWINKEY,  K_MENU,         N,           N,            // 5
    N,           N,          N,          N,              N,          N,              N,           N,
    N,           N,          N,          N,              N,          N,              N,           N,            // 6
    N,           N,          N,          N,              N,          N,              N,           N,
    N,           N,          N,          N,              N,          N,              N,           N,            // 7
];

/// Editing/arrow keys without the extended flag come from the numpad.
fn numpad_equivalent(key: Keynum) -> Option<Keynum> {
    Some(match key {
        K_HOME => K_KP_HOME,
        K_UPARROW => K_KP_UPARROW,
        K_PGUP => K_KP_PGUP,
        K_LEFTARROW => K_KP_LEFTARROW,
        K_RIGHTARROW => K_KP_RIGHTARROW,
        K_END => K_KP_END,
        K_DOWNARROW => K_KP_DOWNARROW,
        K_PGDN => K_KP_PGDN,
        K_INS => K_KP_INS,
        K_DEL => K_KP_DEL,
        _ => return None,
    })
}

/// Translate a key message into zero, one or two logical key events.
///
/// Modifier keys produce the generic key first and the side-specific key
/// second, both with the same state and time. Unknown scancodes produce
/// nothing.
pub fn translate_key(scancode: u32, extended: bool, down: bool, time: u32) -> Vec<LogicalKeyEvent> {
    if scancode > 127 {
        return Vec::new();
    }

    let result = SCANTOKEY[scancode as usize];
    if result == N {
        debug!("translate_key: unknown scancode: {}", scancode);
        return Vec::new();
    }

    let single = |key: Keynum| vec![LogicalKeyEvent::new(key, down, time)];
    let pair = |generic: Keynum, side: Keynum| {
        vec![
            LogicalKeyEvent::new(generic, down, time),
            LogicalKeyEvent::new(side, down, time),
        ]
    };

    if !extended {
        if let Some(kp) = numpad_equivalent(result) {
            return single(kp);
        }
        match result {
            K_LSHIFT => pair(K_SHIFT, K_LSHIFT),
            K_RSHIFT => pair(K_SHIFT, K_RSHIFT),
            K_ALT => pair(K_ALT, K_LALT),
            K_CTRL => pair(K_CTRL, K_LCTRL),
            _ => single(result),
        }
    } else {
        match result {
            K_ENTER => single(K_KP_ENTER),
            k if k == c(b'/') => single(K_KP_SLASH),
            K_PAUSE => single(K_NUMLOCK),
            K_ALT => pair(K_ALT, K_RALT),
            K_CTRL => pair(K_CTRL, K_RCTRL),
            _ => single(result),
        }
    }
}

/// Windows key event delivered by the low-level keyboard hook.
pub fn winkey_event(right: bool, down: bool, time: u32) -> LogicalKeyEvent {
    let key = if right { K_RWINKEY } else { K_LWINKEY };
    LogicalKeyEvent::new(key, down, time)
}
