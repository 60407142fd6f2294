// winit_backend.rs -- Backend implementation on top of winit
//
// winit owns the event loop and window creation, so the window is created
// by the application handler and attached here. Window events are turned
// into NativeMsg values by translate_window_event / translate_device_event
// and queued for Win::pump_events.
//
// Hotkeys and hardware gamma go straight to user32/gdi32 on Windows; other
// platforms report them as unsupported.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::monitor::{MonitorHandle, VideoModeHandle};
use winit::platform::scancode::PhysicalKeyExtScancode;
use winit::window::{CursorGrabMode, Fullscreen, Window, WindowLevel};

use crate::error::{SysError, SysResult};
use crate::in_mouse::{
    ButtonId, ButtonState, RawButtonFlags, RawMotion, RawMouseUpdate, BUTTON_LEFT, BUTTON_MIDDLE, BUTTON_RIGHT,
    BUTTON_X1, BUTTON_X2,
};
use crate::platform::*;
use crate::sys_win::{NativeMsg, SysCommand, TimedMsg};

#[cfg(target_os = "windows")]
#[link(name = "user32")]
extern "system" {
    fn GetDC(hwnd: isize) -> isize;
    fn ReleaseDC(hwnd: isize, hdc: isize) -> i32;
    fn RegisterHotKey(hwnd: isize, id: i32, modifiers: u32, vk: u32) -> i32;
    fn UnregisterHotKey(hwnd: isize, id: i32) -> i32;
}

#[cfg(target_os = "windows")]
#[link(name = "gdi32")]
extern "system" {
    fn GetDeviceGammaRamp(hdc: isize, lp_ramp: *mut std::ffi::c_void) -> i32;
    fn SetDeviceGammaRamp(hdc: isize, lp_ramp: *const std::ffi::c_void) -> i32;
}

#[cfg(target_os = "windows")]
const MOD_ALT: u32 = 0x0001;
#[cfg(target_os = "windows")]
const VK_TAB: u32 = 0x09;
#[cfg(target_os = "windows")]
const VK_RETURN: u32 = 0x0d;

/// Scancode winit reports for Pause; the key message form is a plain 0x45.
const SC_PAUSE_E1: u32 = 0xe11d;

const WHEEL_DELTA: i32 = 120;

pub struct WinitBackend {
    window: Option<Arc<Window>>,
    #[cfg_attr(not(target_os = "windows"), allow(dead_code))]
    hdc: isize,
    cursor_counter: i32,
    raw_registered: bool,
    /// Last known cursor position in screen coordinates.
    cursor: Option<(i32, i32)>,
    buttons: ButtonState,
    clipboard: Option<arboard::Clipboard>,
    epoch: Instant,
}

impl WinitBackend {
    pub fn new(window: Arc<Window>) -> Self {
        WinitBackend {
            window: Some(window),
            hdc: 0,
            cursor_counter: 0,
            raw_registered: false,
            cursor: None,
            buttons: ButtonState::default(),
            clipboard: None,
            epoch: Instant::now(),
        }
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }

    /// Milliseconds since the backend was created; the message time base.
    pub fn msg_time(&self) -> u32 {
        self.epoch.elapsed().as_millis() as u32
    }

    fn timed(&self, msg: NativeMsg) -> TimedMsg {
        TimedMsg::new(self.msg_time(), msg)
    }

    fn monitor(&self) -> Option<MonitorHandle> {
        let window = self.window.as_ref()?;
        window.current_monitor().or_else(|| window.primary_monitor())
    }

    fn client_origin(&self) -> (i32, i32) {
        self.window
            .as_ref()
            .and_then(|w| w.inner_position().ok())
            .map_or((0, 0), |p| (p.x, p.y))
    }

    #[cfg(target_os = "windows")]
    fn hwnd(&self) -> Option<isize> {
        use raw_window_handle::{HasWindowHandle, RawWindowHandle};

        let handle = self.window.as_ref()?.window_handle().ok()?;
        match handle.as_raw() {
            RawWindowHandle::Win32(win32) => Some(win32.hwnd.get()),
            _ => None,
        }
    }

    fn find_video_mode(&self, mode: &DisplaySettings) -> Option<VideoModeHandle> {
        self.monitor()?.video_modes().find(|vm| {
            let size = vm.size();
            size.width == mode.width
                && size.height == mode.height
                && mode.refresh_hz.map_or(true, |hz| millihertz_to_hz(vm.refresh_rate_millihertz()) == hz)
                && mode.bit_depth.map_or(true, |bpp| vm.bit_depth() as u32 == bpp)
        })
    }

    fn clipboard(&mut self) -> SysResult<&mut arboard::Clipboard> {
        if self.clipboard.is_none() {
            let cb = arboard::Clipboard::new().map_err(|e| SysError::Clipboard(e.to_string()))?;
            self.clipboard = Some(cb);
        }
        self.clipboard
            .as_mut()
            .ok_or_else(|| SysError::Clipboard("not available".into()))
    }

    // ============================================================
    // Event translation
    // ============================================================

    pub fn translate_window_event(&mut self, event: &WindowEvent) -> Option<TimedMsg> {
        let msg = match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let down = event.state == ElementState::Pressed;
                let (scancode, extended) = match event.physical_key.to_scancode()? {
                    SC_PAUSE_E1 => (0x45, false),
                    sc => (sc & 0xff, sc & 0xff00 == 0xe000),
                };
                NativeMsg::Key { scancode, extended, down }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let id = button_id(*button)?;
                let down = *state == ElementState::Pressed;
                self.buttons.set(id, down);
                if self.raw_registered {
                    let flags = if down {
                        RawButtonFlags::default().press(id)
                    } else {
                        RawButtonFlags::default().release(id)
                    };
                    NativeMsg::RawMouse(RawMouseUpdate { flags, motion: RawMotion::default() })
                } else {
                    NativeMsg::MouseButtons(self.buttons)
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (*x as f64, *y as f64),
                    MouseScrollDelta::PixelDelta(p) => (p.x, p.y),
                };
                let notch = |v: f64| if v > 0.0 { WHEEL_DELTA } else { -WHEEL_DELTA };
                if self.raw_registered {
                    let mut flags = RawButtonFlags::default();
                    if dy != 0.0 {
                        flags.wheel = Some(notch(dy) as i16);
                    } else if dx != 0.0 {
                        flags.hwheel = Some(notch(dx) as i16);
                    } else {
                        return None;
                    }
                    NativeMsg::RawMouse(RawMouseUpdate { flags, motion: RawMotion::default() })
                } else if dy != 0.0 {
                    NativeMsg::MouseWheel(notch(dy))
                } else if dx != 0.0 {
                    NativeMsg::MouseHWheel(notch(dx))
                } else {
                    return None;
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as i32, position.y as i32);
                let (ox, oy) = self.client_origin();
                self.cursor = Some((ox + x, oy + y));
                NativeMsg::MouseMove { x, y, buttons: self.buttons }
            }

            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                NativeMsg::NcMouseMove
            }

            WindowEvent::Focused(active) => {
                let minimized = self
                    .window
                    .as_ref()
                    .and_then(|w| w.is_minimized())
                    .unwrap_or(false);
                NativeMsg::Activate { active: *active, minimized }
            }

            WindowEvent::Moved(_) => {
                let size = self.window.as_ref()?.outer_size();
                NativeMsg::PosChanged(Some(WindowPos {
                    cx: size.width as i32,
                    cy: size.height as i32,
                    no_size: true,
                    no_move: false,
                }))
            }

            WindowEvent::Resized(size) => {
                if self.window.as_ref().is_some_and(|w| w.is_maximized()) {
                    // maximize box: undo and switch to fullscreen instead
                    if let Some(w) = &self.window {
                        w.set_maximized(false);
                    }
                    NativeMsg::SysCommand(SysCommand::Maximize)
                } else {
                    NativeMsg::PosChanged(Some(WindowPos {
                        cx: size.width as i32,
                        cy: size.height as i32,
                        no_size: false,
                        no_move: true,
                    }))
                }
            }

            WindowEvent::ThemeChanged(_) => NativeMsg::PosChanged(None),

            WindowEvent::CloseRequested => NativeMsg::Close,

            _ => return None,
        };

        Some(self.timed(msg))
    }

    /// Relative motion only arrives here once raw input is registered.
    pub fn translate_device_event(&mut self, event: &DeviceEvent) -> Option<TimedMsg> {
        if !self.raw_registered {
            return None;
        }
        match event {
            DeviceEvent::MouseMotion { delta: (dx, dy) } => {
                let update = RawMouseUpdate {
                    flags: RawButtonFlags::default(),
                    motion: RawMotion::Relative { dx: dx.round() as i32, dy: dy.round() as i32 },
                };
                Some(self.timed(NativeMsg::RawMouse(update)))
            }
            _ => None,
        }
    }
}

fn button_id(button: MouseButton) -> Option<ButtonId> {
    match button {
        MouseButton::Left => Some(BUTTON_LEFT),
        MouseButton::Right => Some(BUTTON_RIGHT),
        MouseButton::Middle => Some(BUTTON_MIDDLE),
        MouseButton::Back => Some(BUTTON_X1),
        MouseButton::Forward => Some(BUTTON_X2),
        MouseButton::Other(_) => None,
    }
}

fn millihertz_to_hz(mhz: u32) -> u32 {
    (mhz + 500) / 1000
}

// ============================================================
// Backend traits
// ============================================================

impl WindowSystem for WinitBackend {
    fn create_window(&mut self, title: &str) -> SysResult<()> {
        let window = self
            .window
            .as_ref()
            .ok_or_else(|| SysError::WindowCreation("no window attached".into()))?;
        window.set_title(title);
        Ok(())
    }

    fn acquire_device_context(&mut self) -> SysResult<()> {
        #[cfg(target_os = "windows")]
        {
            let hwnd = self.hwnd().ok_or(SysError::DeviceContext)?;
            // SAFETY: hwnd comes from the live winit window.
            let hdc = unsafe { GetDC(hwnd) };
            if hdc == 0 {
                return Err(SysError::DeviceContext);
            }
            self.hdc = hdc;
        }

        if self.window.is_none() {
            return Err(SysError::DeviceContext);
        }
        Ok(())
    }

    fn destroy_window(&mut self) {
        #[cfg(target_os = "windows")]
        if self.hdc != 0 {
            if let Some(hwnd) = self.hwnd() {
                unsafe {
                    ReleaseDC(hwnd, self.hdc);
                }
            }
        }
        self.hdc = 0;
        self.window = None;
    }

    fn place_window(&mut self, placement: &WindowPlacement) -> SysResult<()> {
        let window = self
            .window
            .as_ref()
            .ok_or_else(|| SysError::Window("no window".into()))?;

        // exclusive fullscreen owns the geometry
        if !placement.style.contains(WindowStyle::POPUP) {
            window.set_decorations(placement.style.contains(WindowStyle::CAPTION));
            window.set_resizable(placement.style.contains(WindowStyle::THICKFRAME));
            let _ = window.request_inner_size(PhysicalSize::new(placement.width, placement.height));
            window.set_outer_position(PhysicalPosition::new(placement.x, placement.y));
        }

        window.set_window_level(match placement.z_order {
            ZOrder::TopMost => WindowLevel::AlwaysOnTop,
            ZOrder::NoTopMost => WindowLevel::Normal,
        });
        window.set_visible(true);
        window.focus_window();
        Ok(())
    }

    fn non_client_size(&self, style: WindowStyle) -> (i32, i32) {
        if style.contains(WindowStyle::POPUP) {
            return (0, 0);
        }
        let Some(window) = &self.window else {
            return (0, 0);
        };
        let outer = window.outer_size();
        let inner = window.inner_size();
        (
            outer.width as i32 - inner.width as i32,
            outer.height as i32 - inner.height as i32,
        )
    }

    fn window_position(&self) -> (i32, i32) {
        self.window
            .as_ref()
            .and_then(|w| w.outer_position().ok())
            .map_or((0, 0), |p| (p.x, p.y))
    }

    fn client_rect_on_screen(&self) -> Rect {
        let Some(window) = &self.window else {
            return Rect::default();
        };
        let (x, y) = self.client_origin();
        let size = window.inner_size();
        Rect::from_origin_size(x, y, size.width, size.height)
    }

    fn set_title(&mut self, title: &str) {
        if let Some(w) = &self.window {
            w.set_title(title);
        }
    }

    fn show(&mut self, cmd: ShowCommand) {
        let Some(w) = &self.window else {
            return;
        };
        match cmd {
            ShowCommand::Show | ShowCommand::ShowNormal => w.set_visible(true),
            ShowCommand::Restore => w.set_minimized(false),
            ShowCommand::Minimize => w.set_minimized(true),
        }
    }

    fn set_foreground(&mut self) {
        if let Some(w) = &self.window {
            w.focus_window();
        }
    }
}

impl DisplayModeProvider for WinitBackend {
    fn desktop_mode(&self) -> Option<DisplaySettings> {
        let monitor = self.monitor()?;
        let size = monitor.size();
        let bit_depth = monitor
            .video_modes()
            .filter(|vm| vm.size() == size)
            .map(|vm| vm.bit_depth() as u32)
            .max();
        Some(DisplaySettings {
            width: size.width,
            height: size.height,
            refresh_hz: monitor.refresh_rate_millihertz().map(millihertz_to_hz),
            bit_depth,
            ..Default::default()
        })
    }

    fn enumerate_modes(&self) -> Vec<DisplaySettings> {
        let Some(monitor) = self.monitor() else {
            return Vec::new();
        };
        monitor
            .video_modes()
            .map(|vm| DisplaySettings {
                width: vm.size().width,
                height: vm.size().height,
                refresh_hz: Some(millihertz_to_hz(vm.refresh_rate_millihertz())),
                bit_depth: Some(vm.bit_depth() as u32),
                ..Default::default()
            })
            .collect()
    }

    fn apply_fullscreen(&mut self, mode: &DisplaySettings) -> SysResult<()> {
        let fail = |reason: &str| SysError::DisplayModeChange {
            width: mode.width,
            height: mode.height,
            reason: reason.to_string(),
        };

        let window = self.window.as_ref().ok_or_else(|| fail("no window"))?;
        let vm = self.find_video_mode(mode).ok_or_else(|| fail("no matching video mode"))?;
        debug!("apply_fullscreen: {:?}", vm);
        window.set_fullscreen(Some(Fullscreen::Exclusive(vm)));
        Ok(())
    }

    fn restore_desktop(&mut self) {
        if let Some(w) = &self.window {
            if w.fullscreen().is_some() {
                w.set_fullscreen(None);
            }
        }
    }
}

impl PointerDevice for WinitBackend {
    fn register_raw_mouse(&mut self) -> SysResult<()> {
        if self.window.is_none() {
            return Err(SysError::RawInputRegistration("no window".into()));
        }
        self.raw_registered = true;
        Ok(())
    }

    fn unregister_raw_mouse(&mut self) {
        self.raw_registered = false;
    }

    fn cursor_pos(&self) -> Option<(i32, i32)> {
        self.cursor
    }

    fn set_cursor_pos(&mut self, x: i32, y: i32) {
        let (ox, oy) = self.client_origin();
        if let Some(w) = &self.window {
            if let Err(e) = w.set_cursor_position(PhysicalPosition::new(x - ox, y - oy)) {
                debug!("set_cursor_position: {}", e);
                return;
            }
        }
        self.cursor = Some((x, y));
    }

    fn clip_cursor(&mut self, rect: Option<Rect>) {
        let Some(w) = &self.window else {
            return;
        };
        let result = match rect {
            Some(_) => w
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| w.set_cursor_grab(CursorGrabMode::Locked)),
            None => w.set_cursor_grab(CursorGrabMode::None),
        };
        if let Err(e) = result {
            warn!("set_cursor_grab: {}", e);
        }
    }

    // the cursor grab already routes all mouse input to the window
    fn set_capture(&mut self, _capture: bool) {}

    fn show_cursor(&mut self, show: bool) -> i32 {
        self.cursor_counter += if show { 1 } else { -1 };
        if let Some(w) = &self.window {
            w.set_cursor_visible(self.cursor_counter >= 0);
        }
        self.cursor_counter
    }

    fn mouse_params(&self) -> Option<[i32; 3]> {
        None
    }

    fn set_mouse_params(&mut self, _params: [i32; 3]) -> bool {
        false
    }

    fn wheel_scroll_lines(&self) -> u32 {
        3
    }
}

impl ShellIntegration for WinitBackend {
    #[cfg(target_os = "windows")]
    fn register_alt_tab_hotkeys(&mut self) -> bool {
        unsafe { RegisterHotKey(0, 0, MOD_ALT, VK_TAB) != 0 && RegisterHotKey(0, 1, MOD_ALT, VK_RETURN) != 0 }
    }

    #[cfg(not(target_os = "windows"))]
    fn register_alt_tab_hotkeys(&mut self) -> bool {
        false
    }

    fn unregister_alt_tab_hotkeys(&mut self) {
        #[cfg(target_os = "windows")]
        unsafe {
            UnregisterHotKey(0, 0);
            UnregisterHotKey(0, 1);
        }
    }

    fn install_winkey_hook(&mut self) -> SysResult<()> {
        Err(SysError::KeyboardHook("not available with this backend".into()))
    }

    fn remove_winkey_hook(&mut self) {}
}

impl GammaDevice for WinitBackend {
    fn get_gamma_ramp(&mut self) -> SysResult<GammaRamp> {
        #[cfg(target_os = "windows")]
        if self.hdc != 0 {
            let mut ramp = GammaRamp::default();
            // SAFETY: the ramp is exactly the 3x256 WORD array the call expects.
            if unsafe { GetDeviceGammaRamp(self.hdc, ramp.0.as_mut_ptr() as *mut _) } != 0 {
                return Ok(ramp);
            }
        }
        Err(SysError::GammaUnsupported)
    }

    fn set_gamma_ramp(&mut self, ramp: &GammaRamp) -> bool {
        #[cfg(target_os = "windows")]
        if self.hdc != 0 {
            return unsafe { SetDeviceGammaRamp(self.hdc, ramp.0.as_ptr() as *const _) } != 0;
        }
        let _ = ramp;
        false
    }
}

impl Clipboard for WinitBackend {
    fn get_text(&mut self) -> SysResult<Option<String>> {
        match self.clipboard()?.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(SysError::Clipboard(e.to_string())),
        }
    }

    fn set_text(&mut self, text: &str) -> SysResult<()> {
        self.clipboard()?
            .set_text(text)
            .map_err(|e| SysError::Clipboard(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_id() {
        assert_eq!(button_id(MouseButton::Left), Some(BUTTON_LEFT));
        assert_eq!(button_id(MouseButton::Forward), Some(BUTTON_X2));
        assert_eq!(button_id(MouseButton::Other(9)), None);
    }

    #[test]
    fn test_millihertz_rounding() {
        assert_eq!(millihertz_to_hz(59_940), 60);
        assert_eq!(millihertz_to_hz(144_000), 144);
        assert_eq!(millihertz_to_hz(0), 0);
    }
}
