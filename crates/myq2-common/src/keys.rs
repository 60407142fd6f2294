// keys.rs -- logical key numbers shared between the platform layer and the
// engine's key dispatcher.
//
// Printable keys use their lowercase ASCII value; everything else lives in
// the 128..=255 range.

use std::borrow::Cow;
use std::fmt;

/// A logical (layout-independent) key number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Keynum(pub u8);

impl Keynum {
    /// Key number for a printable ASCII character.
    pub const fn from_char(c: u8) -> Self {
        Keynum(c)
    }

    /// Human readable name, as shown in bind listings.
    pub fn name(self) -> Cow<'static, str> {
        if let Some(&(_, name)) = KEYNAMES.iter().find(|(k, _)| *k == self) {
            return Cow::Borrowed(name);
        }
        if self.0.is_ascii_graphic() {
            return Cow::Owned((self.0 as char).to_string());
        }
        Cow::Owned(format!("0x{:02x}", self.0))
    }
}

impl fmt::Debug for Keynum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keynum({})", self.name())
    }
}

impl fmt::Display for Keynum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// ============================================================
// Key constants
// ============================================================

pub const K_TAB: Keynum = Keynum(9);
pub const K_ENTER: Keynum = Keynum(13);
pub const K_ESCAPE: Keynum = Keynum(27);
pub const K_SPACE: Keynum = Keynum(32);
pub const K_BACKSPACE: Keynum = Keynum(127);
pub const K_UPARROW: Keynum = Keynum(128);
pub const K_DOWNARROW: Keynum = Keynum(129);
pub const K_LEFTARROW: Keynum = Keynum(130);
pub const K_RIGHTARROW: Keynum = Keynum(131);
pub const K_ALT: Keynum = Keynum(132);
pub const K_CTRL: Keynum = Keynum(133);
pub const K_SHIFT: Keynum = Keynum(134);
pub const K_F1: Keynum = Keynum(135);
pub const K_F2: Keynum = Keynum(136);
pub const K_F3: Keynum = Keynum(137);
pub const K_F4: Keynum = Keynum(138);
pub const K_F5: Keynum = Keynum(139);
pub const K_F6: Keynum = Keynum(140);
pub const K_F7: Keynum = Keynum(141);
pub const K_F8: Keynum = Keynum(142);
pub const K_F9: Keynum = Keynum(143);
pub const K_F10: Keynum = Keynum(144);
pub const K_F11: Keynum = Keynum(145);
pub const K_F12: Keynum = Keynum(146);
pub const K_INS: Keynum = Keynum(147);
pub const K_DEL: Keynum = Keynum(148);
pub const K_PGDN: Keynum = Keynum(149);
pub const K_PGUP: Keynum = Keynum(150);
pub const K_HOME: Keynum = Keynum(151);
pub const K_END: Keynum = Keynum(152);

pub const K_KP_HOME: Keynum = Keynum(160);
pub const K_KP_UPARROW: Keynum = Keynum(161);
pub const K_KP_PGUP: Keynum = Keynum(162);
pub const K_KP_LEFTARROW: Keynum = Keynum(163);
pub const K_KP_5: Keynum = Keynum(164);
pub const K_KP_RIGHTARROW: Keynum = Keynum(165);
pub const K_KP_END: Keynum = Keynum(166);
pub const K_KP_DOWNARROW: Keynum = Keynum(167);
pub const K_KP_PGDN: Keynum = Keynum(168);
pub const K_KP_ENTER: Keynum = Keynum(169);
pub const K_KP_INS: Keynum = Keynum(170);
pub const K_KP_DEL: Keynum = Keynum(171);
pub const K_KP_SLASH: Keynum = Keynum(172);
pub const K_KP_MINUS: Keynum = Keynum(173);
pub const K_KP_PLUS: Keynum = Keynum(174);
pub const K_NUMLOCK: Keynum = Keynum(175);
pub const K_KP_MULTIPLY: Keynum = Keynum(176);
pub const K_CAPSLOCK: Keynum = Keynum(177);
pub const K_SCROLLOCK: Keynum = Keynum(178);
pub const K_LWINKEY: Keynum = Keynum(179);
pub const K_RWINKEY: Keynum = Keynum(180);
pub const K_MENU: Keynum = Keynum(181);

// side-specific modifiers, sent alongside the generic K_ALT/K_CTRL/K_SHIFT
pub const K_LALT: Keynum = Keynum(182);
pub const K_RALT: Keynum = Keynum(183);
pub const K_LCTRL: Keynum = Keynum(184);
pub const K_RCTRL: Keynum = Keynum(185);
pub const K_LSHIFT: Keynum = Keynum(186);
pub const K_RSHIFT: Keynum = Keynum(187);

pub const K_MOUSE1: Keynum = Keynum(200);
pub const K_MOUSE2: Keynum = Keynum(201);
pub const K_MOUSE3: Keynum = Keynum(202);
pub const K_MOUSE4: Keynum = Keynum(203);
pub const K_MOUSE5: Keynum = Keynum(204);

pub const K_MWHEELDOWN: Keynum = Keynum(239);
pub const K_MWHEELUP: Keynum = Keynum(240);
pub const K_MWHEELRIGHT: Keynum = Keynum(243);
pub const K_MWHEELLEFT: Keynum = Keynum(244);

pub const K_PAUSE: Keynum = Keynum(255);

// ============================================================
// Key name table
// ============================================================

const KEYNAMES: &[(Keynum, &str)] = &[
    (K_TAB, "TAB"),
    (K_ENTER, "ENTER"),
    (K_ESCAPE, "ESCAPE"),
    (K_SPACE, "SPACE"),
    (K_BACKSPACE, "BACKSPACE"),
    (K_UPARROW, "UPARROW"),
    (K_DOWNARROW, "DOWNARROW"),
    (K_LEFTARROW, "LEFTARROW"),
    (K_RIGHTARROW, "RIGHTARROW"),
    (K_ALT, "ALT"),
    (K_CTRL, "CTRL"),
    (K_SHIFT, "SHIFT"),
    (K_LALT, "LALT"),
    (K_RALT, "RALT"),
    (K_LCTRL, "LCTRL"),
    (K_RCTRL, "RCTRL"),
    (K_LSHIFT, "LSHIFT"),
    (K_RSHIFT, "RSHIFT"),
    (K_F1, "F1"),
    (K_F2, "F2"),
    (K_F3, "F3"),
    (K_F4, "F4"),
    (K_F5, "F5"),
    (K_F6, "F6"),
    (K_F7, "F7"),
    (K_F8, "F8"),
    (K_F9, "F9"),
    (K_F10, "F10"),
    (K_F11, "F11"),
    (K_F12, "F12"),
    (K_INS, "INS"),
    (K_DEL, "DEL"),
    (K_PGDN, "PGDN"),
    (K_PGUP, "PGUP"),
    (K_HOME, "HOME"),
    (K_END, "END"),
    (K_KP_HOME, "KP_HOME"),
    (K_KP_UPARROW, "KP_UPARROW"),
    (K_KP_PGUP, "KP_PGUP"),
    (K_KP_LEFTARROW, "KP_LEFTARROW"),
    (K_KP_5, "KP_5"),
    (K_KP_RIGHTARROW, "KP_RIGHTARROW"),
    (K_KP_END, "KP_END"),
    (K_KP_DOWNARROW, "KP_DOWNARROW"),
    (K_KP_PGDN, "KP_PGDN"),
    (K_KP_ENTER, "KP_ENTER"),
    (K_KP_INS, "KP_INS"),
    (K_KP_DEL, "KP_DEL"),
    (K_KP_SLASH, "KP_SLASH"),
    (K_KP_MINUS, "KP_MINUS"),
    (K_KP_PLUS, "KP_PLUS"),
    (K_KP_MULTIPLY, "KP_MULTIPLY"),
    (K_NUMLOCK, "NUMLOCK"),
    (K_CAPSLOCK, "CAPSLOCK"),
    (K_SCROLLOCK, "SCROLLOCK"),
    (K_LWINKEY, "LWINKEY"),
    (K_RWINKEY, "RWINKEY"),
    (K_MENU, "MENU"),
    (K_MOUSE1, "MOUSE1"),
    (K_MOUSE2, "MOUSE2"),
    (K_MOUSE3, "MOUSE3"),
    (K_MOUSE4, "MOUSE4"),
    (K_MOUSE5, "MOUSE5"),
    (K_MWHEELUP, "MWHEELUP"),
    (K_MWHEELDOWN, "MWHEELDOWN"),
    (K_MWHEELLEFT, "MWHEELLEFT"),
    (K_MWHEELRIGHT, "MWHEELRIGHT"),
    (K_PAUSE, "PAUSE"),
    (Keynum(b';'), "SEMICOLON"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys_use_table_names() {
        for &(key, name) in KEYNAMES {
            assert_eq!(key.name(), name);
        }
    }

    #[test]
    fn test_printable_key_name() {
        assert_eq!(Keynum::from_char(b'a').name(), "a");
        assert_eq!(format!("{}", K_MOUSE1), "MOUSE1");
    }

    #[test]
    fn test_unnamed_control_key_name() {
        assert_eq!(Keynum(1).name(), "0x01");
    }
}
