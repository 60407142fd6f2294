// sys_win.rs -- native message pump
//
// Backends queue NativeMsg values (one per OS notification, stamped with the
// message time); pump_events() hands each one to its handler in arrival
// order and applies the collected window changes once at the end.

use log::trace;

use myq2_common::cvar::CvarContext;

use crate::in_keys;
use crate::in_mouse::{self, ButtonState, RawMouseUpdate};
use crate::in_win::InputMode;
use crate::platform::{Backend, EventSink, ModeObserver, WindowPos};
use crate::win_state::Win;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SysCommand {
    /// Maximize box or double-click on the caption.
    Maximize,
    ScreenSave,
}

/// Platform-neutral form of the window messages the layer consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NativeMsg {
    /// Set 1 scancode, extended flag from the key message.
    Key { scancode: u32, extended: bool, down: bool },
    /// Windows key seen by the low-level keyboard hook.
    WinKey { right: bool, down: bool },
    /// Legacy button message carrying the full button state.
    MouseButtons(ButtonState),
    /// Cursor moved within the client area, in client coordinates.
    MouseMove { x: i32, y: i32, buttons: ButtonState },
    /// Cursor moved over the frame.
    NcMouseMove,
    MouseWheel(i32),
    MouseHWheel(i32),
    RawMouse(RawMouseUpdate),
    Activate { active: bool, minimized: bool },
    /// None when only the frame style changed.
    PosChanged(Option<WindowPos>),
    SysCommand(SysCommand),
    Close,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedMsg {
    /// Milliseconds, same clock as the engine's input events.
    pub time: u32,
    pub msg: NativeMsg,
}

impl TimedMsg {
    pub fn new(time: u32, msg: NativeMsg) -> Self {
        TimedMsg { time, msg }
    }
}

impl<B: Backend> Win<B> {
    /// Sys_SendKeyEvents
    pub fn pump_events<I>(
        &mut self,
        msgs: I,
        cvars: &mut CvarContext,
        sink: &mut dyn EventSink,
        observer: &mut dyn ModeObserver,
    ) where
        I: IntoIterator<Item = TimedMsg>,
    {
        for m in msgs {
            self.last_msg_time = m.time;
            self.dispatch(m, cvars, sink, observer);
        }

        let grabbed = self.input.grab_state().is_exclusive();
        self.vid.apply_pending(&mut self.backend, cvars, grabbed, observer);
    }

    fn dispatch(
        &mut self,
        m: TimedMsg,
        cvars: &mut CvarContext,
        sink: &mut dyn EventSink,
        observer: &mut dyn ModeObserver,
    ) {
        trace!("dispatch: {:?}", m);
        let time = m.time;

        match m.msg {
            NativeMsg::Key { scancode, extended, down } => self.key_msg(scancode, extended, down, time, sink),
            NativeMsg::WinKey { right, down } => sink.key_event(in_keys::winkey_event(right, down, time)),
            NativeMsg::MouseButtons(state) => self.input.legacy_buttons(state, time, sink),
            NativeMsg::MouseMove { x, y, buttons } => self.mouse_move_msg(x, y, buttons, time, sink),
            NativeMsg::NcMouseMove => {
                if self.input.is_initialized() {
                    sink.cursor_event(-1, -1);
                }
            }
            NativeMsg::MouseWheel(delta) => self.wheel_msg(delta, false, time, cvars, sink),
            NativeMsg::MouseHWheel(delta) => self.wheel_msg(delta, true, time, cvars, sink),
            NativeMsg::RawMouse(update) => self.raw_mouse_msg(&update, time, cvars, sink),
            NativeMsg::Activate { active, minimized } => self.activate(active, minimized, cvars, sink),
            NativeMsg::PosChanged(pos) => self.vid.pos_changed(&self.backend, pos.as_ref()),
            NativeMsg::SysCommand(SysCommand::Maximize) => {
                if !self.vid.is_fullscreen() {
                    self.toggle_fullscreen(cvars, observer);
                }
            }
            // never let the screen saver kick in
            NativeMsg::SysCommand(SysCommand::ScreenSave) => {}
            NativeMsg::Close => sink.quit(),
        }
    }

    fn key_msg(&mut self, scancode: u32, extended: bool, down: bool, time: u32, sink: &mut dyn EventSink) {
        for ev in in_keys::translate_key(scancode, extended, down, time) {
            sink.key_event(ev);
        }
    }

    fn mouse_move_msg(&mut self, x: i32, y: i32, buttons: ButtonState, time: u32, sink: &mut dyn EventSink) {
        if self.input.is_initialized() {
            sink.cursor_event(x, y);
        }
        self.input.legacy_buttons(buttons, time, sink);
    }

    fn wheel_msg(&mut self, delta: i32, horizontal: bool, time: u32, cvars: &CvarContext, sink: &mut dyn EventSink) {
        if self.input.mode() != InputMode::Legacy {
            return;
        }
        let lines = self.wheel_lines(cvars, sink);
        for ev in in_mouse::wheel_events(delta, horizontal, lines, time) {
            sink.key_event(ev);
        }
    }

    fn raw_mouse_msg(&mut self, update: &RawMouseUpdate, time: u32, cvars: &CvarContext, sink: &mut dyn EventSink) {
        if self.input.mode() != InputMode::Raw {
            return;
        }
        let inside = self.input.cursor_inside(&self.backend, self.vid.client_area());
        let lines = self.wheel_lines(cvars, sink);
        self.input.raw_input(update, inside, lines, time, sink);
    }

    /// Size constraint for an interactive resize, for backends that can
    /// adjust the proposed size before it takes effect.
    pub fn constrain_window_size(&self, pos: &mut WindowPos) {
        self.vid.constrain_window_size(&self.backend, pos);
    }
}
