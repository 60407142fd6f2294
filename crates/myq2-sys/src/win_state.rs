// win_state.rs -- the platform context
//
// Win owns the backend and all window, display and input state. The engine
// holds exactly one of these between init() and shutdown(); there are no
// globals. Native messages are fed in through pump_events() (sys_win.rs).

use log::{debug, error, info, warn};

use myq2_common::cvar::{CvarContext, CvarFlags, CvarObserver, ObserverId};

use crate::error::SysResult;
use crate::in_grab::GrabState;
use crate::in_win::{clip_cursor_to, InputModeController};
use crate::platform::{ActiveState, Backend, EventSink, GammaRamp, ModeObserver, ShowCommand, PRODUCT};
use crate::vid_modes::{self, DisplayModeDescriptor};
use crate::vid_win::ModeReconciler;

/// Subscription id of the platform context.
pub const WIN_OBSERVER: ObserverId = 1;

const WIN_CVARS: [&str; 5] = [
    "win_noalttab",
    "win_disablewinkey",
    "win_noresize",
    "win_notitle",
    "win_alwaysontop",
];

/// Register every variable the platform layer reads. Existing values are
/// left alone.
pub fn register_cvars(cvars: &mut CvarContext, modelist: &str) {
    cvars.get_or_create("vid_fullscreen", "0", CvarFlags::ARCHIVE);
    cvars.get_or_create("vid_geometry", "640x480", CvarFlags::ARCHIVE);
    cvars.get_or_create("vid_modelist", modelist, CvarFlags::ARCHIVE);
    cvars.get_or_create("vid_flip_on_switch", "0", CvarFlags::empty());
    cvars.get_or_create("vid_hwgamma", "0", CvarFlags::ARCHIVE | CvarFlags::REFRESH);
    cvars.get_or_create("win_noalttab", "0", CvarFlags::ARCHIVE);
    cvars.get_or_create("win_disablewinkey", "0", CvarFlags::empty());
    cvars.get_or_create("win_noresize", "0", CvarFlags::empty());
    cvars.get_or_create("win_notitle", "0", CvarFlags::empty());
    cvars.get_or_create("win_alwaysontop", "0", CvarFlags::empty());
    cvars.get_or_create("win_xpfix", "0", CvarFlags::empty());
    cvars.get_or_create("win_rawmouse", "1", CvarFlags::empty());
    cvars.get_or_create("win_scrolllines", "0", CvarFlags::ARCHIVE);
}

#[derive(Debug)]
struct GammaState {
    original: GammaRamp,
    custom: GammaRamp,
}

pub struct Win<B: Backend> {
    pub(crate) backend: B,
    pub(crate) vid: ModeReconciler,
    pub(crate) input: InputModeController,
    gamma: Option<GammaState>,
    alttab_disabled: bool,
    kbd_hooked: bool,
    active: Option<ActiveState>,
    pub(crate) last_msg_time: u32,
}

impl<B: Backend> Win<B> {
    /// Win_Init
    ///
    /// Window creation and device context errors are fatal and returned;
    /// optional capabilities (gamma, keyboard hook) just get their
    /// variables reset.
    pub fn init(mut backend: B, cvars: &mut CvarContext) -> SysResult<Self> {
        let modelist = vid_modes::default_mode_list(&backend);
        register_cvars(cvars, &modelist);

        backend.create_window(PRODUCT)?;
        if let Err(e) = backend.acquire_device_context() {
            backend.destroy_window();
            return Err(e);
        }

        let mut win = Win {
            backend,
            vid: ModeReconciler::default(),
            input: InputModeController::default(),
            gamma: None,
            alttab_disabled: false,
            kbd_hooked: false,
            active: None,
            last_msg_time: 0,
        };

        for name in WIN_CVARS {
            cvars.subscribe(name, WIN_OBSERVER);
        }

        if cvars.variable_integer("vid_hwgamma") != 0 {
            win.init_gamma(cvars);
        }

        win.update_winkey_hook(cvars);

        info!("Win_Init: main window created");
        Ok(win)
    }

    /// Win_Shutdown. Gives the backend back.
    pub fn shutdown(mut self, cvars: &mut CvarContext) -> B {
        self.input_shutdown(cvars);

        if let Some(g) = &self.gamma {
            self.backend.set_gamma_ramp(&g.original);
        }

        self.enable_alt_tab();
        if self.kbd_hooked {
            self.backend.remove_winkey_hook();
            self.kbd_hooked = false;
        }

        self.backend.show(ShowCommand::ShowNormal);
        self.backend.destroy_window();
        self.vid.shutdown(&mut self.backend);

        for name in WIN_CVARS {
            cvars.unsubscribe(name, WIN_OBSERVER);
        }

        self.backend
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn mode(&self) -> &ModeReconciler {
        &self.vid
    }

    pub fn input(&self) -> &InputModeController {
        &self.input
    }

    pub fn active_state(&self) -> Option<ActiveState> {
        self.active
    }

    /// Time stamp of the last native message processed.
    pub fn last_msg_time(&self) -> u32 {
        self.last_msg_time
    }

    // ============================================================
    // Video
    // ============================================================

    /// VID_SetMode
    pub fn set_mode(&mut self, cvars: &mut CvarContext, observer: &mut dyn ModeObserver) {
        if let Err(e) = self.vid.set_mode(&mut self.backend, cvars) {
            error!("Couldn't set video mode: {}", e);
        }

        if self.input.grab_state().is_exclusive() {
            clip_cursor_to(&mut self.backend, self.vid.client_area());
        }

        let rc = self.vid.geometry();
        observer.mode_changed(rc.width, rc.height, self.vid.is_fullscreen());
    }

    pub fn toggle_fullscreen(&mut self, cvars: &mut CvarContext, observer: &mut dyn ModeObserver) {
        let value = if self.vid.is_fullscreen() { "0" } else { "1" };
        cvars.set("vid_fullscreen", value);
        self.set_mode(cvars, observer);
    }

    /// Usable fullscreen modes, desktop mode first.
    pub fn mode_list(&self) -> Vec<DisplayModeDescriptor> {
        match self.backend.desktop_mode() {
            Some(desktop) => vid_modes::build_mode_list(&self.backend.enumerate_modes(), &desktop),
            None => Vec::new(),
        }
    }

    fn init_gamma(&mut self, cvars: &mut CvarContext) {
        match self.backend.get_gamma_ramp() {
            Ok(ramp) => {
                debug!("...enabling hardware gamma");
                self.gamma = Some(GammaState { original: ramp.clone(), custom: ramp });
            }
            Err(e) => {
                warn!("...{}", e);
                cvars.set("vid_hwgamma", "0");
            }
        }
    }

    pub fn hw_gamma_enabled(&self) -> bool {
        self.gamma.is_some()
    }

    /// Load an 8-bit gamma table into all three channels.
    pub fn update_gamma(&mut self, table: &[u8; 256]) {
        let Some(g) = self.gamma.as_mut() else {
            return;
        };

        for (i, &v) in table.iter().enumerate() {
            let v = (v as u16) << 8;
            g.custom.0[0][i] = v;
            g.custom.0[1][i] = v;
            g.custom.0[2][i] = v;
        }

        if !self.backend.set_gamma_ramp(&g.custom) {
            debug!("SetDeviceGammaRamp failed");
        }
    }

    // ============================================================
    // Input
    // ============================================================

    pub fn input_init(&mut self, cvars: &mut CvarContext) -> bool {
        self.input.init(&mut self.backend, cvars, WIN_OBSERVER)
    }

    pub fn input_shutdown(&mut self, cvars: &mut CvarContext) {
        self.input
            .shutdown(&mut self.backend, self.vid.client_area(), cvars, WIN_OBSERVER);
    }

    pub fn grab_mouse(&mut self, state: GrabState, cvars: &CvarContext) {
        self.input
            .grab(state, &mut self.backend, self.vid.client_area(), cvars);
    }

    /// Mouse motion since the last call, None while not grabbed.
    pub fn mouse_motion(&mut self) -> Option<(i32, i32)> {
        self.input.consume_motion(&mut self.backend, self.vid.client_area())
    }

    pub fn warp_mouse(&mut self, x: i32, y: i32) {
        self.input.warp(&mut self.backend, self.vid.client_area(), x, y);
    }

    /// Lines per wheel notch. Only a console-like target scrolls by more
    /// than one.
    pub(crate) fn wheel_lines(&self, cvars: &CvarContext, sink: &dyn EventSink) -> u32 {
        if !sink.console_active() {
            return 1;
        }
        let lines = match cvars.variable_integer("win_scrolllines") {
            n if n > 0 => n as u32,
            _ => self.backend.wheel_scroll_lines(),
        };
        lines.clamp(1, 9)
    }

    // ============================================================
    // Shell integration
    // ============================================================

    fn disable_alt_tab(&mut self) {
        if !self.alttab_disabled {
            if !self.backend.register_alt_tab_hotkeys() {
                debug!("RegisterHotKey failed");
            }
            self.alttab_disabled = true;
        }
    }

    fn enable_alt_tab(&mut self) {
        if self.alttab_disabled {
            self.backend.unregister_alt_tab_hotkeys();
            self.alttab_disabled = false;
        }
    }

    fn update_winkey_hook(&mut self, cvars: &mut CvarContext) {
        if cvars.variable_integer("win_disablewinkey") != 0 {
            if self.kbd_hooked {
                return;
            }
            match self.backend.install_winkey_hook() {
                Ok(()) => self.kbd_hooked = true,
                Err(e) => {
                    error!("{}", e);
                    cvars.set("win_disablewinkey", "0");
                }
            }
        } else if self.kbd_hooked {
            self.backend.remove_winkey_hook();
            self.kbd_hooked = false;
        }
    }

    /// Win_Activate
    pub(crate) fn activate(&mut self, active: bool, minimized: bool, cvars: &CvarContext, sink: &mut dyn EventSink) {
        let state = if minimized {
            ActiveState::Minimized
        } else if active {
            ActiveState::Activated
        } else {
            ActiveState::Restored
        };
        let activated = state == ActiveState::Activated;

        self.active = Some(state);
        sink.activate(state);

        if cvars.variable_integer("win_noalttab") != 0 {
            if activated {
                self.disable_alt_tab();
            } else {
                self.enable_alt_tab();
            }
        }

        if let Some(g) = &self.gamma {
            let ramp = if activated { &g.custom } else { &g.original };
            if !self.backend.set_gamma_ramp(ramp) {
                debug!("SetDeviceGammaRamp failed");
            }
        }

        let flip = cvars.variable_integer("vid_flip_on_switch") != 0;
        self.vid.activate(&mut self.backend, activated, flip);

        if activated {
            self.backend.set_foreground();
        }
    }

    // ============================================================
    // Clipboard
    // ============================================================

    pub fn clipboard_data(&mut self) -> Option<String> {
        match self.backend.get_text() {
            Ok(data) => data,
            Err(e) => {
                debug!("Couldn't read clipboard: {}", e);
                None
            }
        }
    }

    pub fn set_clipboard_data(&mut self, data: &str) {
        if data.is_empty() {
            return;
        }
        if let Err(e) = self.backend.set_text(data) {
            debug!("Couldn't write clipboard: {}", e);
        }
    }
}

impl<B: Backend> CvarObserver for Win<B> {
    fn observer_id(&self) -> ObserverId {
        WIN_OBSERVER
    }

    fn cvar_changed(&mut self, cvars: &mut CvarContext, name: &str) {
        match name {
            "win_noalttab" => {
                if cvars.variable_integer("win_noalttab") != 0 {
                    self.disable_alt_tab();
                } else {
                    self.enable_alt_tab();
                }
            }
            "win_disablewinkey" => self.update_winkey_hook(cvars),
            "win_noresize" | "win_notitle" | "win_alwaysontop" => self.vid.request_reposition(),
            "win_xpfix" => self
                .input
                .xpfix_changed(&mut self.backend, self.vid.client_area(), cvars),
            "win_rawmouse" => {
                self.input_shutdown(cvars);
                self.input_init(cvars);
            }
            _ => debug!("Win: ignoring change of {}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SysError;
    use crate::in_win::InputMode;
    use crate::mock::{MockBackend, RecordingObserver, RecordingSink};
    use crate::vid_win::ModeChanged;

    fn init() -> (Win<MockBackend>, CvarContext) {
        let mut cvars = CvarContext::new();
        let win = Win::init(MockBackend::new(), &mut cvars).unwrap();
        (win, cvars)
    }

    #[test]
    fn test_init_registers_cvars_and_default_modelist() {
        let (win, cvars) = init();
        assert!(win.backend().window_created);
        assert!(win.backend().dc_acquired);
        assert_eq!(cvars.variable_string("vid_geometry"), "640x480");
        assert_eq!(cvars.variable_integer("win_rawmouse"), 1);
        assert_eq!(
            cvars.variable_string("vid_modelist"),
            "1920x1080 1280x1024@75 1024x768@85 800x600"
        );
        assert!(cvars.find_var("win_noalttab").unwrap().is_subscribed(WIN_OBSERVER));
    }

    #[test]
    fn test_init_failures_are_fatal() {
        let mut cvars = CvarContext::new();
        let mut b = MockBackend::new();
        b.fail_create = true;
        let err = Win::init(b, &mut cvars).err().unwrap();
        assert!(matches!(err, SysError::WindowCreation(_)));
        assert!(err.is_fatal());

        let mut b = MockBackend::new();
        b.fail_dc = true;
        let err = Win::init(b, &mut cvars).err().unwrap();
        assert!(matches!(err, SysError::DeviceContext));
    }

    #[test]
    fn test_unsupported_gamma_resets_variable() {
        let mut cvars = CvarContext::new();
        cvars.set("vid_hwgamma", "1");
        let mut b = MockBackend::new();
        b.gamma = None;
        let win = Win::init(b, &mut cvars).unwrap();
        assert!(!win.hw_gamma_enabled());
        assert_eq!(cvars.variable_integer("vid_hwgamma"), 0);
    }

    #[test]
    fn test_update_gamma_shifts_table() {
        let mut cvars = CvarContext::new();
        cvars.set("vid_hwgamma", "1");
        let mut win = Win::init(MockBackend::new(), &mut cvars).unwrap();
        assert!(win.hw_gamma_enabled());

        let mut table = [0u8; 256];
        for (i, v) in table.iter_mut().enumerate() {
            *v = i as u8;
        }
        win.update_gamma(&table);

        let ramp = win.backend().gamma_sets.last().unwrap();
        assert_eq!(ramp.0[0][1], 0x100);
        assert_eq!(ramp.0[2][255], 0xff00);

        let backend = win.shutdown(&mut cvars);
        assert_eq!(backend.gamma_sets.last(), Some(&GammaRamp::default()));
    }

    #[test]
    fn test_winkey_hook_failure_resets_variable() {
        let (mut win, mut cvars) = init();
        win.backend_mut().fail_hook = true;
        cvars.set_notify("win_disablewinkey", "1", &mut win);
        assert_eq!(cvars.variable_integer("win_disablewinkey"), 0);
        assert!(!win.backend().hooked);

        win.backend_mut().fail_hook = false;
        cvars.set_notify("win_disablewinkey", "1", &mut win);
        assert!(win.backend().hooked);
        cvars.set_notify("win_disablewinkey", "0", &mut win);
        assert!(!win.backend().hooked);
    }

    #[test]
    fn test_noalttab_toggles_hotkeys() {
        let (mut win, mut cvars) = init();
        cvars.set_notify("win_noalttab", "1", &mut win);
        assert!(win.backend().hotkeys_registered);
        cvars.set_notify("win_noalttab", "0", &mut win);
        assert!(!win.backend().hotkeys_registered);
    }

    #[test]
    fn test_noalttab_follows_activation() {
        let (mut win, mut cvars) = init();
        cvars.set("win_noalttab", "1");
        let mut sink = RecordingSink::default();

        win.activate(true, false, &cvars, &mut sink);
        assert!(win.backend().hotkeys_registered);
        assert_eq!(win.backend().foreground_calls, 1);

        win.activate(false, false, &cvars, &mut sink);
        assert!(!win.backend().hotkeys_registered);
        assert_eq!(sink.activations, vec![ActiveState::Activated, ActiveState::Restored]);

        win.activate(true, true, &cvars, &mut sink);
        assert_eq!(win.active_state(), Some(ActiveState::Minimized));
    }

    #[test]
    fn test_style_change_requests_reposition() {
        let (mut win, mut cvars) = init();
        let mut obs = RecordingObserver::default();
        win.set_mode(&mut cvars, &mut obs);
        assert_eq!(obs.changes, vec![(640, 480, false)]);

        cvars.set_notify("win_notitle", "1", &mut win);
        assert_eq!(win.mode().pending(), ModeChanged::REPOSITION);
    }

    #[test]
    fn test_rawmouse_change_reinitializes_input() {
        let (mut win, mut cvars) = init();
        assert!(win.input_init(&mut cvars));
        assert_eq!(win.input().mode(), InputMode::Raw);

        cvars.set_notify("win_rawmouse", "0", &mut win);
        assert_eq!(win.input().mode(), InputMode::Legacy);
        assert!(!win.backend().raw_registered);

        cvars.set_notify("win_rawmouse", "1", &mut win);
        assert_eq!(win.input().mode(), InputMode::Raw);
    }

    #[test]
    fn test_xpfix_reapplies_params_while_grabbed() {
        let (mut win, mut cvars) = init();
        cvars.set("win_rawmouse", "0");
        win.input_init(&mut cvars);
        let mut obs = RecordingObserver::default();
        win.set_mode(&mut cvars, &mut obs);

        win.grab_mouse(GrabState::Grabbed, &cvars);
        assert_eq!(win.backend().params, Some([0, 0, 1]));
        cvars.set_notify("win_xpfix", "1", &mut win);
        assert_eq!(win.backend().params, Some([0, 0, 0]));
    }

    #[test]
    fn test_wheel_lines() {
        let (win, mut cvars) = init();
        let mut sink = RecordingSink::default();
        assert_eq!(win.wheel_lines(&cvars, &sink), 1);

        sink.console = true;
        assert_eq!(win.wheel_lines(&cvars, &sink), 3);
        cvars.set("win_scrolllines", "12");
        assert_eq!(win.wheel_lines(&cvars, &sink), 9);
    }

    #[test]
    fn test_clipboard() {
        let (mut win, _cvars) = init();
        win.set_clipboard_data("");
        assert_eq!(win.clipboard_data(), None);

        win.set_clipboard_data("connect 127.0.0.1");
        assert_eq!(win.clipboard_data().as_deref(), Some("connect 127.0.0.1"));

        win.backend_mut().clipboard_broken = true;
        assert_eq!(win.clipboard_data(), None);
    }

    #[test]
    fn test_toggle_fullscreen_and_shutdown_restores_desktop() {
        let (mut win, mut cvars) = init();
        let mut obs = RecordingObserver::default();
        win.set_mode(&mut cvars, &mut obs);

        cvars.set("vid_modelist", "desktop");
        win.toggle_fullscreen(&mut cvars, &mut obs);
        assert!(win.mode().is_fullscreen());
        assert_eq!(obs.changes.last(), Some(&(1920, 1080, true)));
        assert!(win.backend().current_display.is_some());

        let backend = win.shutdown(&mut cvars);
        assert!(backend.current_display.is_none());
        assert!(backend.destroyed);
        assert!(!cvars.find_var("win_noalttab").unwrap().is_subscribed(WIN_OBSERVER));
    }

    #[test]
    fn test_fullscreen_set_by_config_before_init_resets_to_off() {
        let mut cvars = CvarContext::new();
        cvars.set("vid_fullscreen", "1");
        let b = MockBackend { fail_fullscreen: true, ..MockBackend::new() };
        let mut win = Win::init(b, &mut cvars).unwrap();
        let mut obs = RecordingObserver::default();

        win.set_mode(&mut cvars, &mut obs);
        assert!(!win.mode().is_fullscreen());
        assert_eq!(cvars.variable_integer("vid_fullscreen"), 0);
        assert_eq!(obs.changes.last(), Some(&(640, 480, false)));

        win.input_init(&mut cvars);
        win.grab_mouse(GrabState::Grabbed, &cvars);
        let clip = win.backend().clip;
        assert!(clip.is_some());

        cvars.set("vid_fullscreen", "1");
        win.set_mode(&mut cvars, &mut obs);
        assert!(!win.mode().is_fullscreen());
        assert_eq!(cvars.variable_integer("vid_fullscreen"), 0);
        assert_eq!(win.input().grab_state(), GrabState::Grabbed);
        assert_eq!(win.backend().clip, clip);
        assert!(win.backend().applied_modes.is_empty());
    }

    #[test]
    fn test_mode_list() {
        let (win, _cvars) = init();
        let list = win.mode_list();
        assert_eq!(list.len(), 4);
        assert!(list[0].is_desktop_native);
    }
}
