// platform.rs -- the narrow interfaces the platform layer drives
//
// Everything that touches the operating system goes through one of these
// traits. The state machines in in_win / vid_win / win_state only ever see
// these types, which keeps them testable against a recording mock.

use bitflags::bitflags;

use crate::error::SysResult;
use crate::in_keys::LogicalKeyEvent;
use crate::in_mouse::MouseButtonEvent;

pub const PRODUCT: &str = "myq2";

// ============================================================
// Geometry
// ============================================================

/// Screen-space rectangle, right/bottom exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self::new(x, y, x + width as i32, y + height as i32)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    pub fn center(&self) -> (i32, i32) {
        ((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }
}

bitflags! {
    /// Window frame style bits.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct WindowStyle: u32 {
        const OVERLAPPED  = 1 << 0;
        const POPUP       = 1 << 1;
        const CAPTION     = 1 << 2;
        const SYSMENU     = 1 << 3;
        const MINIMIZEBOX = 1 << 4;
        const MAXIMIZEBOX = 1 << 5;
        const THICKFRAME  = 1 << 6;
        const DLGFRAME    = 1 << 7;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZOrder {
    TopMost,
    NoTopMost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowCommand {
    Show,
    ShowNormal,
    Restore,
    Minimize,
}

/// Everything needed to (re)place the main window in one call. The size is
/// the client area; the window system adds its own frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowPlacement {
    pub style: WindowStyle,
    pub z_order: ZOrder,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Data carried by a window-position notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowPos {
    pub cx: i32,
    pub cy: i32,
    pub no_size: bool,
    pub no_move: bool,
}

/// One entry as reported by display enumeration, before filtering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisplaySettings {
    pub width: u32,
    pub height: u32,
    pub refresh_hz: Option<u32>,
    pub bit_depth: Option<u32>,
    pub interlaced: bool,
    pub grayscale: bool,
}

/// Per-channel 16-bit gamma ramp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GammaRamp(pub [[u16; 256]; 3]);

impl Default for GammaRamp {
    fn default() -> Self {
        GammaRamp([[0; 256]; 3])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveState {
    Minimized,
    Activated,
    Restored,
}

// ============================================================
// Collaborators
// ============================================================

pub trait WindowSystem {
    fn create_window(&mut self, title: &str) -> SysResult<()>;
    /// Acquire the drawing context of the created window.
    fn acquire_device_context(&mut self) -> SysResult<()>;
    fn destroy_window(&mut self);
    /// Apply style, z-order, position and client size, then show and focus.
    fn place_window(&mut self, placement: &WindowPlacement) -> SysResult<()>;
    /// Width and height the frame adds around the client area for `style`.
    fn non_client_size(&self, style: WindowStyle) -> (i32, i32);
    /// Outer top-left corner in screen coordinates.
    fn window_position(&self) -> (i32, i32);
    /// Client area in screen coordinates.
    fn client_rect_on_screen(&self) -> Rect;
    fn set_title(&mut self, title: &str);
    fn show(&mut self, cmd: ShowCommand);
    fn set_foreground(&mut self);
}

pub trait DisplayModeProvider {
    /// The mode the desktop is configured for, if it can be queried.
    fn desktop_mode(&self) -> Option<DisplaySettings>;
    fn enumerate_modes(&self) -> Vec<DisplaySettings>;
    fn apply_fullscreen(&mut self, mode: &DisplaySettings) -> SysResult<()>;
    fn restore_desktop(&mut self);
}

pub trait PointerDevice {
    fn register_raw_mouse(&mut self) -> SysResult<()>;
    fn unregister_raw_mouse(&mut self);
    /// Cursor position in screen coordinates.
    fn cursor_pos(&self) -> Option<(i32, i32)>;
    fn set_cursor_pos(&mut self, x: i32, y: i32);
    fn clip_cursor(&mut self, rect: Option<Rect>);
    fn set_capture(&mut self, capture: bool);
    /// Adjust the OS cursor display counter; returns the new count. The
    /// cursor is visible while the count is non-negative.
    fn show_cursor(&mut self, show: bool) -> i32;
    /// Mouse acceleration thresholds and speed, if the system exposes them.
    fn mouse_params(&self) -> Option<[i32; 3]>;
    fn set_mouse_params(&mut self, params: [i32; 3]) -> bool;
    /// System setting for lines scrolled per wheel notch.
    fn wheel_scroll_lines(&self) -> u32;
}

pub trait ShellIntegration {
    fn register_alt_tab_hotkeys(&mut self) -> bool;
    fn unregister_alt_tab_hotkeys(&mut self);
    fn install_winkey_hook(&mut self) -> SysResult<()>;
    fn remove_winkey_hook(&mut self);
}

pub trait GammaDevice {
    fn get_gamma_ramp(&mut self) -> SysResult<GammaRamp>;
    fn set_gamma_ramp(&mut self, ramp: &GammaRamp) -> bool;
}

pub trait Clipboard {
    fn get_text(&mut self) -> SysResult<Option<String>>;
    fn set_text(&mut self, text: &str) -> SysResult<()>;
}

/// Everything the platform context needs from the OS side.
pub trait Backend:
    WindowSystem + DisplayModeProvider + PointerDevice + ShellIntegration + GammaDevice + Clipboard
{
}

impl<T> Backend for T where
    T: WindowSystem + DisplayModeProvider + PointerDevice + ShellIntegration + GammaDevice + Clipboard
{
}

// ============================================================
// Engine side
// ============================================================

/// The engine's input dispatcher. Receives events in emission order.
pub trait EventSink {
    fn key_event(&mut self, event: LogicalKeyEvent);
    fn button_event(&mut self, event: MouseButtonEvent);

    /// Cursor position in client coordinates, (-1, -1) when over the frame.
    fn cursor_event(&mut self, _x: i32, _y: i32) {}

    fn activate(&mut self, _state: ActiveState) {}

    fn quit(&mut self) {}

    /// Whether a console-like target has key focus (enables multi-line
    /// wheel scrolling).
    fn console_active(&self) -> bool {
        false
    }
}

/// Gets told when the client area size or fullscreen state changed.
pub trait ModeObserver {
    fn mode_changed(&mut self, width: u32, height: u32, fullscreen: bool);
}

/// Normalized input event, for sinks that just want a single ordered stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Key(LogicalKeyEvent),
    Button(MouseButtonEvent),
}

impl EventSink for Vec<InputEvent> {
    fn key_event(&mut self, event: LogicalKeyEvent) {
        self.push(InputEvent::Key(event));
    }

    fn button_event(&mut self, event: MouseButtonEvent) {
        self.push(InputEvent::Button(event));
    }
}
