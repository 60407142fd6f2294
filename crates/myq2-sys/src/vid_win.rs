// vid_win.rs -- window geometry and display mode reconciliation
//
// Owns the authoritative window rectangle, the client area in screen
// coordinates and the fullscreen flag. Window-position notifications only
// record what changed; the changes are applied once per pump cycle by
// apply_pending().

use bitflags::bitflags;
use log::{debug, error, warn};

use myq2_common::cvar::CvarContext;

use crate::error::SysResult;
use crate::in_win::clip_cursor_to;
use crate::platform::{
    DisplayModeProvider, DisplaySettings, ModeObserver, PointerDevice, Rect, ShowCommand, WindowPlacement,
    WindowPos, WindowStyle, WindowSystem, ZOrder,
};
use crate::vid_modes::{self, FullscreenSpec};

pub const MIN_WIDTH: u32 = 320;
pub const MIN_HEIGHT: u32 = 240;

bitflags! {
    /// What happened to the window since the last pump cycle.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ModeChanged: u8 {
        const SIZE       = 1 << 0;
        const POS        = 1 << 1;
        const STYLE      = 1 << 2;
        const REPOSITION = 1 << 3;
    }
}

/// Window origin and client area size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WinRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for WinRect {
    fn default() -> Self {
        WinRect { x: 0, y: 0, width: 640, height: 480 }
    }
}

/// Client area in screen coordinates and its center, the warp target of the
/// legacy mouse path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClientArea {
    pub screen_rc: Rect,
    pub center_x: i32,
    pub center_y: i32,
}

impl ClientArea {
    pub fn from_rect(screen_rc: Rect) -> Self {
        let (center_x, center_y) = screen_rc.center();
        ClientArea { screen_rc, center_x, center_y }
    }
}

/// Width rounds down to a multiple of 8, height to a multiple of 2, then
/// both are raised to the minimum window size.
pub fn align_client_size(width: i32, height: i32) -> (u32, u32) {
    let w = (width & !7).max(MIN_WIDTH as i32);
    let h = (height & !1).max(MIN_HEIGHT as i32);
    (w as u32, h as u32)
}

/// The window frame settings read from win_noresize, win_notitle and
/// win_alwaysontop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StyleOptions {
    pub noresize: bool,
    pub notitle: bool,
    pub alwaysontop: bool,
}

impl StyleOptions {
    pub fn from_cvars(cvars: &CvarContext) -> Self {
        StyleOptions {
            noresize: cvars.variable_integer("win_noresize") != 0,
            notitle: cvars.variable_integer("win_notitle") != 0,
            alwaysontop: cvars.variable_integer("win_alwaysontop") != 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct ModeReconciler {
    rc: WinRect,
    client: ClientArea,
    fullscreen: bool,
    style: WindowStyle,
    pending: ModeChanged,
    /// The fullscreen mode currently applied, if any.
    display: Option<DisplaySettings>,
}

impl ModeReconciler {
    pub fn geometry(&self) -> WinRect {
        self.rc
    }

    pub fn client_area(&self) -> &ClientArea {
        &self.client
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn pending(&self) -> ModeChanged {
        self.pending
    }

    pub fn current_display(&self) -> Option<&DisplaySettings> {
        self.display.as_ref()
    }

    /// Style and z-order for the current mode and frame options.
    pub fn window_placement(&self, opts: &StyleOptions) -> WindowPlacement {
        let (style, z_order) = if self.fullscreen {
            (WindowStyle::POPUP, ZOrder::TopMost)
        } else {
            let mut style = WindowStyle::OVERLAPPED;
            if opts.notitle {
                style |= if opts.noresize { WindowStyle::DLGFRAME } else { WindowStyle::THICKFRAME };
            } else {
                style |= WindowStyle::CAPTION | WindowStyle::SYSMENU | WindowStyle::MINIMIZEBOX | WindowStyle::MAXIMIZEBOX;
                if !opts.noresize {
                    style |= WindowStyle::THICKFRAME;
                }
            }
            let z = if opts.alwaysontop { ZOrder::TopMost } else { ZOrder::NoTopMost };
            (style, z)
        };

        WindowPlacement {
            style,
            z_order,
            x: self.rc.x,
            y: self.rc.y,
            width: self.rc.width,
            height: self.rc.height,
        }
    }

    /// Win_SetPosition
    pub fn set_position<W: WindowSystem>(&mut self, window: &mut W, opts: &StyleOptions) -> SysResult<()> {
        let placement = self.window_placement(opts);
        window.place_window(&placement)?;
        self.style = placement.style;
        self.client = ClientArea::from_rect(window.client_rect_on_screen());
        Ok(())
    }

    /// Target mode for vid_fullscreen: the configured list entry, else the
    /// desktop mode, else the current window size. Refresh rate and depth
    /// fall back to the desktop's.
    fn fullscreen_target(&self, display: &impl DisplayModeProvider, cvars: &CvarContext) -> DisplaySettings {
        let desktop = display.desktop_mode().filter(vid_modes::is_usable);
        let configured = vid_modes::fullscreen_mode(
            cvars.variable_string("vid_modelist"),
            cvars.variable_integer("vid_fullscreen"),
        );

        let mut dm = DisplaySettings::default();
        let mut explicit_freq = None;
        let mut explicit_depth = None;

        match (configured, desktop) {
            (Some(FullscreenSpec::Mode(m)), _) => {
                debug!("...setting fullscreen mode: {}x{}", m.width, m.height);
                dm.width = m.width;
                dm.height = m.height;
                explicit_freq = m.refresh_hz;
                explicit_depth = m.bit_depth;
            }
            (_, Some(d)) => {
                debug!("...falling back to desktop mode");
                dm.width = d.width;
                dm.height = d.height;
            }
            (_, None) => {
                debug!("...falling back to default mode");
                dm.width = self.rc.width;
                dm.height = self.rc.height;
            }
        }

        dm.refresh_hz = explicit_freq.or_else(|| {
            desktop
                .filter(|d| d.width == dm.width && d.height == dm.height)
                .and_then(|d| d.refresh_hz)
                .filter(|&f| f > 1)
        });
        dm.bit_depth = explicit_depth.or_else(|| desktop.and_then(|d| d.bit_depth));
        dm
    }

    /// Win_SetMode
    ///
    /// A failed fullscreen attempt resets vid_fullscreen and falls back to
    /// windowed mode with the geometry from vid_geometry; nothing of the
    /// failed target is kept.
    pub fn set_mode<B>(&mut self, backend: &mut B, cvars: &mut CvarContext) -> SysResult<()>
    where
        B: WindowSystem + DisplayModeProvider,
    {
        let opts = StyleOptions::from_cvars(cvars);

        if cvars.variable_integer("vid_fullscreen") > 0 {
            let target = self.fullscreen_target(&*backend, cvars);
            let saved = self.rc;
            match self.enter_fullscreen(backend, &target, &opts) {
                Ok(()) => {
                    self.display = Some(target);
                    self.pending = ModeChanged::empty();
                    return Ok(());
                }
                Err(e) => {
                    self.rc = saved;
                    self.fullscreen = false;
                    cvars.reset("vid_fullscreen");
                    warn!("Full screen mode {}x{} failed: {}", target.width, target.height, e);
                }
            }
        }

        backend.restore_desktop();

        if let Some(geom) = vid_modes::parse_geometry(cvars.variable_string("vid_geometry")) {
            self.rc.width = geom.width;
            self.rc.height = geom.height;
            if let Some((x, y)) = geom.pos {
                self.rc.x = x;
                self.rc.y = y;
            }
        }

        let (w, h) = align_client_size(self.rc.width as i32, self.rc.height as i32);
        self.rc.width = w;
        self.rc.height = h;

        debug!(
            "...setting windowed mode: {}x{}{:+}{:+}",
            self.rc.width, self.rc.height, self.rc.x, self.rc.y
        );

        self.display = None;
        self.fullscreen = false;
        self.set_position(backend, &opts)?;
        self.pending = ModeChanged::empty();

        cvars.set("vid_geometry", &self.geometry_string());
        Ok(())
    }

    fn enter_fullscreen<B>(&mut self, backend: &mut B, target: &DisplaySettings, opts: &StyleOptions) -> SysResult<()>
    where
        B: WindowSystem + DisplayModeProvider,
    {
        backend.apply_fullscreen(target)?;
        self.rc = WinRect { x: 0, y: 0, width: target.width, height: target.height };
        self.fullscreen = true;
        self.set_position(backend, opts)
    }

    pub fn geometry_string(&self) -> String {
        vid_modes::format_geometry(self.rc.width, self.rc.height, self.rc.x, self.rc.y)
    }

    /// Keep the client area of an interactively resized window aligned and
    /// above the minimum size.
    pub fn constrain_window_size<W: WindowSystem>(&self, window: &W, pos: &mut WindowPos) {
        if self.fullscreen || pos.no_size {
            return;
        }

        let (nc_w, nc_h) = window.non_client_size(self.style);
        let (w, h) = align_client_size(pos.cx - nc_w, pos.cy - nc_h);
        pos.cx = w as i32 + nc_w;
        pos.cy = h as i32 + nc_h;
    }

    /// Record a window-position notification. `None` means the frame style
    /// changed without a position record.
    pub fn pos_changed<W: WindowSystem>(&mut self, window: &W, pos: Option<&WindowPos>) {
        let (x, y) = window.window_position();
        let rc = window.client_rect_on_screen();

        self.rc.x = x;
        self.rc.y = y;
        self.rc.width = rc.width().max(0) as u32;
        self.rc.height = rc.height().max(0) as u32;
        self.client = ClientArea::from_rect(rc);

        // don't save geometry in fullscreen mode
        if self.fullscreen {
            return;
        }

        match pos {
            None => self.pending |= ModeChanged::STYLE,
            Some(p) => {
                if !p.no_size {
                    self.pending |= ModeChanged::SIZE;
                }
                if !p.no_move {
                    self.pending |= ModeChanged::POS;
                }
            }
        }
    }

    /// One of the frame style variables changed.
    pub fn request_reposition(&mut self) {
        if !self.fullscreen {
            self.pending |= ModeChanged::REPOSITION;
        }
    }

    /// Apply everything recorded since the last cycle and clear the pending
    /// set. Returns what was applied.
    pub fn apply_pending<B>(
        &mut self,
        backend: &mut B,
        cvars: &mut CvarContext,
        grabbed: bool,
        observer: &mut dyn ModeObserver,
    ) -> ModeChanged
    where
        B: WindowSystem + PointerDevice,
    {
        let changes = self.pending;
        if changes.is_empty() {
            return changes;
        }

        if changes.contains(ModeChanged::REPOSITION) {
            let opts = StyleOptions::from_cvars(cvars);
            if let Err(e) = self.set_position(backend, &opts) {
                error!("Couldn't reposition window: {}", e);
            }
        }

        if changes.intersects(ModeChanged::SIZE | ModeChanged::POS | ModeChanged::STYLE) {
            cvars.set("vid_geometry", &self.geometry_string());
        }

        // one clip for the whole batch
        if grabbed {
            clip_cursor_to(backend, &self.client);
        }

        if changes.contains(ModeChanged::SIZE) {
            observer.mode_changed(self.rc.width, self.rc.height, self.fullscreen);
        }

        self.pending = ModeChanged::empty();
        changes
    }

    /// Fullscreen half of activation handling: minimize when losing focus,
    /// optionally flipping back to the desktop mode.
    pub fn activate<B>(&mut self, backend: &mut B, active: bool, flip_on_switch: bool)
    where
        B: WindowSystem + DisplayModeProvider,
    {
        if !self.fullscreen {
            return;
        }

        if active {
            backend.show(ShowCommand::Restore);
        } else {
            backend.show(ShowCommand::Minimize);
        }

        if !flip_on_switch {
            return;
        }

        if active {
            if let Some(dm) = self.display {
                if let Err(e) = backend.apply_fullscreen(&dm) {
                    warn!("Couldn't restore fullscreen mode: {}", e);
                }
            }
        } else {
            backend.restore_desktop();
        }
    }

    pub fn shutdown<D: DisplayModeProvider>(&mut self, display: &mut D) {
        if self.fullscreen {
            display.restore_desktop();
        }
        *self = ModeReconciler::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{register_win_cvars, MockBackend, RecordingObserver};

    fn setup() -> (MockBackend, CvarContext, ModeReconciler) {
        let mut cvars = CvarContext::new();
        register_win_cvars(&mut cvars);
        (MockBackend::new(), cvars, ModeReconciler::default())
    }

    #[test]
    fn test_align_client_size() {
        assert_eq!(align_client_size(321, 241), (320, 240));
        assert_eq!(align_client_size(1023, 769), (1016, 768));
        assert_eq!(align_client_size(100, 50), (320, 240));
        assert_eq!(align_client_size(-5, -5), (320, 240));
    }

    #[test]
    fn test_window_style_variants() {
        let vid = ModeReconciler::default();
        let p = vid.window_placement(&StyleOptions::default());
        assert!(p.style.contains(WindowStyle::CAPTION | WindowStyle::THICKFRAME));
        assert_eq!(p.z_order, ZOrder::NoTopMost);

        let p = vid.window_placement(&StyleOptions { noresize: true, ..Default::default() });
        assert!(p.style.contains(WindowStyle::CAPTION));
        assert!(!p.style.contains(WindowStyle::THICKFRAME));

        let p = vid.window_placement(&StyleOptions { notitle: true, noresize: true, alwaysontop: true });
        assert_eq!(p.style, WindowStyle::OVERLAPPED | WindowStyle::DLGFRAME);
        assert_eq!(p.z_order, ZOrder::TopMost);

        let p = vid.window_placement(&StyleOptions { notitle: true, ..Default::default() });
        assert_eq!(p.style, WindowStyle::OVERLAPPED | WindowStyle::THICKFRAME);
    }

    #[test]
    fn test_windowed_mode_aligns_and_persists_geometry() {
        let (mut b, mut cvars, mut vid) = setup();
        cvars.set("vid_geometry", "321x241+10+20");
        vid.set_mode(&mut b, &mut cvars).unwrap();

        let g = vid.geometry();
        assert_eq!((g.width, g.height, g.x, g.y), (320, 240, 10, 20));
        assert!(!vid.is_fullscreen());
        assert_eq!(cvars.variable_string("vid_geometry"), "320x240+10+20");
        assert_eq!(b.placements.last().map(|p| (p.width, p.height)), Some((320, 240)));
        assert_eq!(vid.client_area().screen_rc, Rect::from_origin_size(10, 20, 320, 240));
        assert!(vid.pending().is_empty());
    }

    #[test]
    fn test_fullscreen_uses_modelist_entry() {
        let (mut b, mut cvars, mut vid) = setup();
        cvars.set("vid_modelist", "1024x768@75 800x600");
        cvars.set("vid_fullscreen", "1");
        vid.set_mode(&mut b, &mut cvars).unwrap();

        assert!(vid.is_fullscreen());
        let dm = vid.current_display().copied().unwrap();
        assert_eq!((dm.width, dm.height, dm.refresh_hz), (1024, 768, Some(75)));
        assert_eq!(dm.bit_depth, Some(32));
        assert_eq!(b.placements.last().map(|p| p.style), Some(WindowStyle::POPUP));
    }

    #[test]
    fn test_fullscreen_falls_back_to_desktop_mode() {
        let (mut b, mut cvars, mut vid) = setup();
        cvars.set("vid_modelist", "desktop");
        cvars.set("vid_fullscreen", "1");
        vid.set_mode(&mut b, &mut cvars).unwrap();

        let dm = vid.current_display().copied().unwrap();
        assert_eq!((dm.width, dm.height, dm.refresh_hz), (1920, 1080, Some(60)));
    }

    #[test]
    fn test_fullscreen_failure_falls_back_to_windowed() {
        let (mut b, mut cvars, mut vid) = setup();
        cvars.set("vid_geometry", "800x600+5+5");
        vid.set_mode(&mut b, &mut cvars).unwrap();

        b.fail_fullscreen = true;
        cvars.set("vid_modelist", "1024x768");
        cvars.set("vid_fullscreen", "1");
        vid.set_mode(&mut b, &mut cvars).unwrap();

        assert!(!vid.is_fullscreen());
        assert_eq!(cvars.variable_integer("vid_fullscreen"), 0);
        let g = vid.geometry();
        assert_eq!((g.width, g.height, g.x, g.y), (800, 600, 5, 5));
        assert_eq!(cvars.variable_string("vid_geometry"), "800x600+5+5");
        assert!(vid.current_display().is_none());
    }

    #[test]
    fn test_pos_changed_records_and_apply_clears() {
        let (mut b, mut cvars, mut vid) = setup();
        vid.set_mode(&mut b, &mut cvars).unwrap();

        b.move_window(100, 50, 800, 600);
        vid.pos_changed(&b, Some(&WindowPos { cx: 800, cy: 600, no_size: false, no_move: false }));
        assert_eq!(vid.pending(), ModeChanged::SIZE | ModeChanged::POS);

        let mut obs = RecordingObserver::default();
        let applied = vid.apply_pending(&mut b, &mut cvars, false, &mut obs);
        assert_eq!(applied, ModeChanged::SIZE | ModeChanged::POS);
        assert!(vid.pending().is_empty());
        assert_eq!(obs.changes, vec![(800, 600, false)]);
        assert_eq!(cvars.variable_string("vid_geometry"), "800x600+100+50");

        vid.pos_changed(&b, Some(&WindowPos { no_size: true, ..Default::default() }));
        let applied = vid.apply_pending(&mut b, &mut cvars, false, &mut obs);
        assert_eq!(applied, ModeChanged::POS);
        assert_eq!(obs.changes.len(), 1);
    }

    #[test]
    fn test_style_notification_and_reposition() {
        let (mut b, mut cvars, mut vid) = setup();
        vid.set_mode(&mut b, &mut cvars).unwrap();
        let placed = b.placements.len();

        vid.pos_changed(&b, None);
        vid.request_reposition();
        assert_eq!(vid.pending(), ModeChanged::STYLE | ModeChanged::REPOSITION);

        cvars.set("win_noresize", "1");
        let mut obs = RecordingObserver::default();
        vid.apply_pending(&mut b, &mut cvars, true, &mut obs);
        assert_eq!(b.placements.len(), placed + 1);
        assert!(!b.placements[placed].style.contains(WindowStyle::THICKFRAME));
        assert_eq!(b.clip, Some(vid.client_area().screen_rc));
        assert_eq!(b.clip_calls, 1);
        assert!(obs.changes.is_empty());
    }

    #[test]
    fn test_apply_pending_clips_once_per_batch() {
        let (mut b, mut cvars, mut vid) = setup();
        vid.set_mode(&mut b, &mut cvars).unwrap();

        b.move_window(40, 30, 800, 600);
        vid.pos_changed(&b, Some(&WindowPos { cx: 800, cy: 600, no_size: false, no_move: false }));
        vid.request_reposition();

        let mut obs = RecordingObserver::default();
        let applied = vid.apply_pending(&mut b, &mut cvars, true, &mut obs);
        assert!(applied.contains(ModeChanged::REPOSITION | ModeChanged::SIZE | ModeChanged::POS));
        assert_eq!(b.clip_calls, 1);

        // nothing pending, nothing clipped
        vid.apply_pending(&mut b, &mut cvars, true, &mut obs);
        assert_eq!(b.clip_calls, 1);
    }

    #[test]
    fn test_fullscreen_placement_failure_restores_desktop() {
        let (mut b, mut cvars, mut vid) = setup();
        cvars.set("vid_geometry", "800x600+5+5");
        vid.set_mode(&mut b, &mut cvars).unwrap();

        b.fail_popup_place = true;
        cvars.set("vid_fullscreen", "1");
        vid.set_mode(&mut b, &mut cvars).unwrap();

        assert!(!vid.is_fullscreen());
        assert!(vid.current_display().is_none());
        assert!(b.current_display.is_none());
        assert_eq!(cvars.variable_integer("vid_fullscreen"), 0);
        let g = vid.geometry();
        assert_eq!((g.width, g.height, g.x, g.y), (800, 600, 5, 5));
        assert!(!b.placements.last().unwrap().style.contains(WindowStyle::POPUP));
    }

    #[test]
    fn test_fullscreen_ignores_position_notifications() {
        let (mut b, mut cvars, mut vid) = setup();
        cvars.set("vid_fullscreen", "1");
        vid.set_mode(&mut b, &mut cvars).unwrap();

        vid.pos_changed(&b, Some(&WindowPos::default()));
        vid.request_reposition();
        assert!(vid.pending().is_empty());
    }

    #[test]
    fn test_constrain_window_size_adds_frame_back() {
        let (mut b, mut cvars, mut vid) = setup();
        vid.set_mode(&mut b, &mut cvars).unwrap();

        let (nc_w, nc_h) = b.nc_size;
        let mut pos = WindowPos { cx: 645 + nc_w, cy: 483 + nc_h, no_size: false, no_move: false };
        vid.constrain_window_size(&b, &mut pos);
        assert_eq!((pos.cx, pos.cy), (640 + nc_w, 482 + nc_h));

        let mut tiny = WindowPos { cx: 10, cy: 10, ..Default::default() };
        vid.constrain_window_size(&b, &mut tiny);
        assert_eq!((tiny.cx, tiny.cy), (320 + nc_w, 240 + nc_h));
    }

    #[test]
    fn test_activate_flips_display_mode() {
        let (mut b, mut cvars, mut vid) = setup();
        cvars.set("vid_fullscreen", "1");
        vid.set_mode(&mut b, &mut cvars).unwrap();
        let applied = b.applied_modes.len();

        vid.activate(&mut b, false, true);
        assert_eq!(b.shows.last(), Some(&ShowCommand::Minimize));
        assert!(b.current_display.is_none());

        vid.activate(&mut b, true, true);
        assert_eq!(b.shows.last(), Some(&ShowCommand::Restore));
        assert_eq!(b.applied_modes.len(), applied + 1);
        assert!(b.current_display.is_some());
    }
}
