// mock.rs -- recording backend shared by the unit tests

use myq2_common::cvar::CvarContext;

use crate::error::{SysError, SysResult};
use crate::in_keys::LogicalKeyEvent;
use crate::in_mouse::MouseButtonEvent;
use crate::platform::*;

pub fn register_win_cvars(cvars: &mut CvarContext) {
    crate::win_state::register_cvars(cvars, crate::vid_modes::VID_MODELIST);
}

/// Pretends to be a desktop with a 1920x1080@60 32 bpp monitor. Client
/// rectangles ignore the frame: the client origin is the window origin.
#[derive(Debug)]
pub struct MockBackend {
    pub fail_create: bool,
    pub fail_dc: bool,
    pub window_created: bool,
    pub dc_acquired: bool,
    pub destroyed: bool,
    pub placements: Vec<WindowPlacement>,
    /// Refuse popup (fullscreen) placements.
    pub fail_popup_place: bool,
    pub window_pos: (i32, i32),
    pub client_rc: Rect,
    pub nc_size: (i32, i32),
    pub title: String,
    pub titles: Vec<String>,
    pub shows: Vec<ShowCommand>,
    pub foreground_calls: usize,

    pub desktop: Option<DisplaySettings>,
    pub modes: Vec<DisplaySettings>,
    pub fail_fullscreen: bool,
    pub applied_modes: Vec<DisplaySettings>,
    pub current_display: Option<DisplaySettings>,

    pub fail_raw: bool,
    pub raw_registered: bool,
    pub raw_registrations: usize,
    pub cursor: (i32, i32),
    pub cursor_count: i32,
    pub clip: Option<Rect>,
    pub clip_calls: usize,
    pub captured: bool,
    pub params: Option<[i32; 3]>,
    pub wheel_lines: u32,

    pub hotkeys_registered: bool,
    pub fail_hook: bool,
    pub hooked: bool,

    pub gamma: Option<GammaRamp>,
    pub gamma_sets: Vec<GammaRamp>,

    pub clipboard: Option<String>,
    pub clipboard_broken: bool,
}

fn desktop_mode() -> DisplaySettings {
    DisplaySettings {
        width: 1920,
        height: 1080,
        refresh_hz: Some(60),
        bit_depth: Some(32),
        ..Default::default()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        let desktop = desktop_mode();
        let mode = |width, height, hz| DisplaySettings { width, height, refresh_hz: Some(hz), ..desktop };
        MockBackend {
            fail_create: false,
            fail_dc: false,
            window_created: false,
            dc_acquired: false,
            destroyed: false,
            placements: Vec::new(),
            fail_popup_place: false,
            window_pos: (0, 0),
            client_rc: Rect::default(),
            nc_size: (16, 39),
            title: String::new(),
            titles: Vec::new(),
            shows: Vec::new(),
            foreground_calls: 0,
            desktop: Some(desktop),
            modes: vec![desktop, mode(1280, 1024, 75), mode(1024, 768, 60), mode(1024, 768, 85), mode(800, 600, 60)],
            fail_fullscreen: false,
            applied_modes: Vec::new(),
            current_display: None,
            fail_raw: false,
            raw_registered: false,
            raw_registrations: 0,
            cursor: (0, 0),
            cursor_count: 0,
            clip: None,
            clip_calls: 0,
            captured: false,
            params: Some([6, 10, 1]),
            wheel_lines: 3,
            hotkeys_registered: false,
            fail_hook: false,
            hooked: false,
            gamma: Some(GammaRamp::default()),
            gamma_sets: Vec::new(),
            clipboard: None,
            clipboard_broken: false,
        }
    }

    /// Simulate the user dragging or resizing the window.
    pub fn move_window(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.window_pos = (x, y);
        self.client_rc = Rect::from_origin_size(x, y, width, height);
    }
}

impl WindowSystem for MockBackend {
    fn create_window(&mut self, title: &str) -> SysResult<()> {
        if self.fail_create {
            return Err(SysError::WindowCreation("mock".into()));
        }
        self.window_created = true;
        self.title = title.to_string();
        Ok(())
    }

    fn acquire_device_context(&mut self) -> SysResult<()> {
        if self.fail_dc {
            return Err(SysError::DeviceContext);
        }
        self.dc_acquired = true;
        Ok(())
    }

    fn destroy_window(&mut self) {
        self.window_created = false;
        self.destroyed = true;
    }

    fn place_window(&mut self, placement: &WindowPlacement) -> SysResult<()> {
        if self.fail_popup_place && placement.style.contains(WindowStyle::POPUP) {
            return Err(SysError::Window("mock".into()));
        }
        self.placements.push(*placement);
        self.move_window(placement.x, placement.y, placement.width, placement.height);
        Ok(())
    }

    fn non_client_size(&self, style: WindowStyle) -> (i32, i32) {
        if style.contains(WindowStyle::POPUP) {
            (0, 0)
        } else {
            self.nc_size
        }
    }

    fn window_position(&self) -> (i32, i32) {
        self.window_pos
    }

    fn client_rect_on_screen(&self) -> Rect {
        self.client_rc
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.titles.push(title.to_string());
    }

    fn show(&mut self, cmd: ShowCommand) {
        self.shows.push(cmd);
    }

    fn set_foreground(&mut self) {
        self.foreground_calls += 1;
    }
}

impl DisplayModeProvider for MockBackend {
    fn desktop_mode(&self) -> Option<DisplaySettings> {
        self.desktop
    }

    fn enumerate_modes(&self) -> Vec<DisplaySettings> {
        self.modes.clone()
    }

    fn apply_fullscreen(&mut self, mode: &DisplaySettings) -> SysResult<()> {
        if self.fail_fullscreen {
            return Err(SysError::DisplayModeChange {
                width: mode.width,
                height: mode.height,
                reason: "mock".into(),
            });
        }
        self.applied_modes.push(*mode);
        self.current_display = Some(*mode);
        Ok(())
    }

    fn restore_desktop(&mut self) {
        self.current_display = None;
    }
}

impl PointerDevice for MockBackend {
    fn register_raw_mouse(&mut self) -> SysResult<()> {
        if self.fail_raw {
            return Err(SysError::RawInputRegistration("mock".into()));
        }
        self.raw_registered = true;
        self.raw_registrations += 1;
        Ok(())
    }

    fn unregister_raw_mouse(&mut self) {
        self.raw_registered = false;
    }

    fn cursor_pos(&self) -> Option<(i32, i32)> {
        Some(self.cursor)
    }

    fn set_cursor_pos(&mut self, x: i32, y: i32) {
        self.cursor = (x, y);
    }

    fn clip_cursor(&mut self, rect: Option<Rect>) {
        self.clip = rect;
        self.clip_calls += 1;
    }

    fn set_capture(&mut self, capture: bool) {
        self.captured = capture;
    }

    fn show_cursor(&mut self, show: bool) -> i32 {
        self.cursor_count += if show { 1 } else { -1 };
        self.cursor_count
    }

    fn mouse_params(&self) -> Option<[i32; 3]> {
        self.params
    }

    fn set_mouse_params(&mut self, params: [i32; 3]) -> bool {
        self.params = Some(params);
        true
    }

    fn wheel_scroll_lines(&self) -> u32 {
        self.wheel_lines
    }
}

impl ShellIntegration for MockBackend {
    fn register_alt_tab_hotkeys(&mut self) -> bool {
        self.hotkeys_registered = true;
        true
    }

    fn unregister_alt_tab_hotkeys(&mut self) {
        self.hotkeys_registered = false;
    }

    fn install_winkey_hook(&mut self) -> SysResult<()> {
        if self.fail_hook {
            return Err(SysError::KeyboardHook("mock".into()));
        }
        self.hooked = true;
        Ok(())
    }

    fn remove_winkey_hook(&mut self) {
        self.hooked = false;
    }
}

impl GammaDevice for MockBackend {
    fn get_gamma_ramp(&mut self) -> SysResult<GammaRamp> {
        self.gamma.clone().ok_or(SysError::GammaUnsupported)
    }

    fn set_gamma_ramp(&mut self, ramp: &GammaRamp) -> bool {
        self.gamma_sets.push(ramp.clone());
        true
    }
}

impl Clipboard for MockBackend {
    fn get_text(&mut self) -> SysResult<Option<String>> {
        if self.clipboard_broken {
            return Err(SysError::Clipboard("mock".into()));
        }
        Ok(self.clipboard.clone())
    }

    fn set_text(&mut self, text: &str) -> SysResult<()> {
        if self.clipboard_broken {
            return Err(SysError::Clipboard("mock".into()));
        }
        self.clipboard = Some(text.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub changes: Vec<(u32, u32, bool)>,
}

impl ModeObserver for RecordingObserver {
    fn mode_changed(&mut self, width: u32, height: u32, fullscreen: bool) {
        self.changes.push((width, height, fullscreen));
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<InputEvent>,
    pub cursor: Vec<(i32, i32)>,
    pub activations: Vec<ActiveState>,
    pub quit: bool,
    pub console: bool,
}

impl EventSink for RecordingSink {
    fn key_event(&mut self, event: LogicalKeyEvent) {
        self.events.push(InputEvent::Key(event));
    }

    fn button_event(&mut self, event: MouseButtonEvent) {
        self.events.push(InputEvent::Button(event));
    }

    fn cursor_event(&mut self, x: i32, y: i32) {
        self.cursor.push((x, y));
    }

    fn activate(&mut self, state: ActiveState) {
        self.activations.push(state);
    }

    fn quit(&mut self) {
        self.quit = true;
    }

    fn console_active(&self) -> bool {
        self.console
    }
}
