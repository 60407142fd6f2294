// in_win.rs -- mouse input mode and cursor grab
//
// Two mouse paths exist: raw input (relative motion and explicit button
// transitions from the device) and the legacy path (cursor position polled
// against the client area center, button state diffed per message). Raw is
// preferred; if registration fails the legacy path is used and win_rawmouse
// is reset so the failure isn't retried on every restart.

use log::{debug, error, info};

use myq2_common::cvar::{CvarContext, ObserverId};

use crate::in_grab::{CursorVisibility, GrabMachine, GrabState};
use crate::in_mouse::{self, ButtonState, MotionDelta, RawMouseUpdate};
use crate::platform::{EventSink, PointerDevice, WindowSystem, PRODUCT};
use crate::vid_win::ClientArea;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Uninitialized,
    Legacy,
    Raw,
}

/// Win_ClipCursor
pub fn clip_cursor_to<P: PointerDevice>(pointer: &mut P, area: &ClientArea) {
    pointer.set_cursor_pos(area.center_x, area.center_y);
    pointer.clip_cursor(Some(area.screen_rc));
}

fn hide_cursor<P: PointerDevice>(pointer: &mut P) {
    while pointer.show_cursor(false) >= 0 {}
}

fn show_cursor<P: PointerDevice>(pointer: &mut P) {
    while pointer.show_cursor(true) < 0 {}
}

#[derive(Debug, Default)]
pub struct InputModeController {
    mode: InputMode,
    grab: GrabMachine,
    buttons: ButtonState,
    motion: MotionDelta,
    /// System acceleration settings saved at init (legacy path only).
    saved_params: Option<[i32; 3]>,
    params_changed: bool,
}

impl InputModeController {
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn is_initialized(&self) -> bool {
        self.mode != InputMode::Uninitialized
    }

    pub fn grab_state(&self) -> GrabState {
        self.grab.state()
    }

    /// Win_InitMouse
    pub fn init<P: PointerDevice>(&mut self, pointer: &mut P, cvars: &mut CvarContext, observer: ObserverId) -> bool {
        if self.is_initialized() {
            debug!("Win_InitMouse: already initialized");
            return true;
        }

        self.mode = InputMode::Legacy;

        if cvars.variable_integer("win_rawmouse") != 0 {
            match pointer.register_raw_mouse() {
                Ok(()) => {
                    self.mode = InputMode::Raw;
                    info!("Raw mouse initialized.");
                }
                Err(e) => {
                    error!("{}", e);
                    cvars.set("win_rawmouse", "0");
                }
            }
        }

        if self.mode == InputMode::Legacy {
            self.saved_params = pointer.mouse_params();
            cvars.subscribe("win_xpfix", observer);
            info!("Legacy mouse initialized.");
        }

        cvars.subscribe("win_rawmouse", observer);
        true
    }

    /// Win_ShutdownMouse. Restores the cursor and all system settings, then
    /// forgets everything.
    pub fn shutdown<B>(&mut self, backend: &mut B, area: &ClientArea, cvars: &mut CvarContext, observer: ObserverId)
    where
        B: PointerDevice + WindowSystem,
    {
        if !self.is_initialized() {
            return;
        }

        self.release_exclusive(backend, area);
        show_cursor(backend);

        if self.mode == InputMode::Raw {
            backend.unregister_raw_mouse();
        }

        cvars.unsubscribe("win_xpfix", observer);
        cvars.unsubscribe("win_rawmouse", observer);

        *self = InputModeController::default();
    }

    fn acquire_exclusive<B>(&mut self, backend: &mut B, area: &ClientArea, xpfix: bool)
    where
        B: PointerDevice + WindowSystem,
    {
        if self.saved_params.is_some() {
            let params = if xpfix { [0, 0, 0] } else { [0, 0, 1] };
            self.params_changed = backend.set_mouse_params(params);
        }

        clip_cursor_to(backend, area);
        backend.set_capture(true);
        backend.set_title(&format!("[{}]", PRODUCT));
    }

    fn release_exclusive<B>(&mut self, backend: &mut B, area: &ClientArea)
    where
        B: PointerDevice + WindowSystem,
    {
        if self.params_changed {
            if let Some(params) = self.saved_params {
                backend.set_mouse_params(params);
            }
            self.params_changed = false;
        }

        backend.set_cursor_pos(area.center_x, area.center_y);
        backend.clip_cursor(None);
        backend.set_capture(false);
        backend.set_title(PRODUCT);
    }

    /// Win_GrabMouse
    pub fn grab<B>(&mut self, requested: GrabState, backend: &mut B, area: &ClientArea, cvars: &CvarContext)
    where
        B: PointerDevice + WindowSystem,
    {
        if !self.is_initialized() {
            return;
        }

        let t = self.grab.request(requested);

        if t.is_refresh() {
            if self.mode == InputMode::Legacy {
                backend.set_cursor_pos(area.center_x, area.center_y);
            }
        } else {
            if t.release_exclusive {
                self.release_exclusive(backend, area);
            }
            if t.acquire_exclusive {
                self.acquire_exclusive(backend, area, cvars.variable_integer("win_xpfix") != 0);
            }
            match t.visibility {
                Some(CursorVisibility::Hide) => hide_cursor(backend),
                Some(CursorVisibility::Show) => show_cursor(backend),
                None => {}
            }
        }

        self.buttons = ButtonState::default();
        self.motion.clear();
    }

    /// win_xpfix changed: re-apply the acceleration settings if they are
    /// currently overridden.
    pub fn xpfix_changed<B>(&mut self, backend: &mut B, area: &ClientArea, cvars: &CvarContext)
    where
        B: PointerDevice + WindowSystem,
    {
        if self.mode == InputMode::Legacy && self.grab.state().is_exclusive() {
            self.acquire_exclusive(backend, area, cvars.variable_integer("win_xpfix") != 0);
        }
    }

    /// Motion since the last call, or None while not grabbed.
    pub fn consume_motion<P: PointerDevice>(&mut self, pointer: &mut P, area: &ClientArea) -> Option<(i32, i32)> {
        if !self.is_initialized() || !self.grab.state().is_exclusive() {
            return None;
        }

        match self.mode {
            InputMode::Raw => Some(self.motion.take()),
            _ => {
                let (x, y) = pointer.cursor_pos()?;
                let delta = (x - area.center_x, y - area.center_y);
                pointer.set_cursor_pos(area.center_x, area.center_y);
                Some(delta)
            }
        }
    }

    /// Move the cursor to client coordinates (x, y).
    pub fn warp<P: PointerDevice>(&self, pointer: &mut P, area: &ClientArea, x: i32, y: i32) {
        pointer.set_cursor_pos(area.screen_rc.left + x, area.screen_rc.top + y);
    }

    /// Whether raw button presses should go through.
    pub fn cursor_inside<P: PointerDevice>(&self, pointer: &P, area: &ClientArea) -> bool {
        if self.grab.state().is_exclusive() {
            return true;
        }
        pointer
            .cursor_pos()
            .is_some_and(|(x, y)| area.screen_rc.contains(x, y))
    }

    /// Legacy path: a message carrying the full button state.
    pub fn legacy_buttons(&mut self, state: ButtonState, time: u32, sink: &mut dyn EventSink) {
        if self.mode != InputMode::Legacy {
            return;
        }
        for ev in in_mouse::reconcile_buttons(self.buttons, state, time) {
            sink.button_event(ev);
        }
        self.buttons = state;
    }

    /// Raw path: one device update.
    pub fn raw_input(
        &mut self,
        update: &RawMouseUpdate,
        cursor_inside: bool,
        wheel_lines: u32,
        time: u32,
        sink: &mut dyn EventSink,
    ) {
        if self.mode != InputMode::Raw {
            return;
        }
        in_mouse::raw_mouse_event(update, cursor_inside, wheel_lines, time, &mut self.motion, sink);
    }
}
