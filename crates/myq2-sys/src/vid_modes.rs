// vid_modes.rs -- display mode list and geometry strings
//
// vid_modelist holds a space separated list of "WxH[@hz][:bpp]" entries
// (or the word "desktop"); vid_fullscreen picks one of them, 1-based.
// vid_geometry is "WxH[+X+Y]".

use log::debug;

use crate::platform::{DisplayModeProvider, DisplaySettings};

pub const VID_MODELIST: &str = "640x480 800x600 1024x768";

const MAX_MODES: usize = 256;

/// A usable fullscreen mode after filtering and deduplication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayModeDescriptor {
    pub width: u32,
    pub height: u32,
    /// 0 when the driver didn't report one.
    pub refresh_hz: u32,
    /// 0 when the driver didn't report one.
    pub bit_depth: u32,
    pub is_desktop_native: bool,
}

impl DisplayModeDescriptor {
    fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Has at least a sane width and height.
pub fn is_usable(dm: &DisplaySettings) -> bool {
    (64..=8192).contains(&dm.width) && (64..=8192).contains(&dm.height)
}

/// Sanity checks on one enumerated mode; returns (refresh, depth) if kept.
fn accept_mode(dm: &DisplaySettings, desktop: &DisplaySettings) -> Option<(u32, u32)> {
    if !is_usable(dm) || dm.interlaced || dm.grayscale {
        return None;
    }

    let freq = match dm.refresh_hz {
        Some(f) if f <= 1 || f > 1000 => return None,
        Some(f) => f,
        None => 0,
    };

    let depth = match dm.bit_depth {
        Some(d) if !(8..=32).contains(&d) => return None,
        // completely ignore non-desktop bit depths for now
        Some(d) if desktop.bit_depth.is_some_and(|dd| dd != d) => return None,
        Some(d) => d,
        None => 0,
    };

    Some((freq, depth))
}

/// Filter, deduplicate by resolution (keeping the highest refresh and depth
/// seen) and sort: desktop mode first, then by descending area.
pub fn build_mode_list(modes: &[DisplaySettings], desktop: &DisplaySettings) -> Vec<DisplayModeDescriptor> {
    let mut list: Vec<DisplayModeDescriptor> = Vec::new();

    for dm in modes {
        let Some((freq, depth)) = accept_mode(dm, desktop) else {
            continue;
        };

        if let Some(m) = list.iter_mut().find(|m| m.width == dm.width && m.height == dm.height) {
            m.refresh_hz = m.refresh_hz.max(freq);
            m.bit_depth = m.bit_depth.max(depth);
            continue;
        }

        if list.len() >= MAX_MODES {
            continue;
        }

        list.push(DisplayModeDescriptor {
            width: dm.width,
            height: dm.height,
            refresh_hz: freq,
            bit_depth: depth,
            is_desktop_native: dm.width == desktop.width && dm.height == desktop.height,
        });
    }

    list.sort_by(|a, b| {
        b.is_desktop_native
            .cmp(&a.is_desktop_native)
            .then_with(|| b.area().cmp(&a.area()))
    });
    list
}

/// Format a mode list; refresh and depth are only spelled out where they
/// differ from the desktop.
pub fn format_mode_list(list: &[DisplayModeDescriptor], desktop: &DisplaySettings) -> String {
    let entries: Vec<String> = list
        .iter()
        .map(|m| {
            let mut s = format!("{}x{}", m.width, m.height);
            if let Some(df) = desktop.refresh_hz {
                if m.refresh_hz != 0 && m.refresh_hz != df {
                    s.push_str(&format!("@{}", m.refresh_hz));
                }
            }
            if let Some(dd) = desktop.bit_depth {
                if m.bit_depth != 0 && m.bit_depth != dd {
                    s.push_str(&format!(":{}", m.bit_depth));
                }
            }
            s
        })
        .collect();
    entries.join(" ")
}

/// VID_GetDefaultModeList
pub fn default_mode_list(display: &impl DisplayModeProvider) -> String {
    let Some(desktop) = display.desktop_mode() else {
        return VID_MODELIST.to_string();
    };

    let list = build_mode_list(&display.enumerate_modes(), &desktop);
    if list.is_empty() {
        return VID_MODELIST.to_string();
    }
    format_mode_list(&list, &desktop)
}

// ============================================================
// String formats
// ============================================================

fn take_uint(s: &str) -> Option<(u32, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let v = s[..end].parse().ok()?;
    Some((v, &s[end..]))
}

fn take_signed(s: &str) -> Option<(i32, &str)> {
    let (neg, rest) = match s.as_bytes().first()? {
        b'+' => (false, &s[1..]),
        b'-' => (true, &s[1..]),
        _ => return None,
    };
    let (v, rest) = take_uint(rest)?;
    let v = i32::try_from(v).ok()?;
    Some((if neg { -v } else { v }, rest))
}

fn take_size(s: &str) -> Option<(u32, u32, &str)> {
    let (w, rest) = take_uint(s)?;
    let rest = rest.strip_prefix(['x', 'X'])?;
    let (h, rest) = take_uint(rest)?;
    Some((w, h, rest))
}

/// A single vid_modelist entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeSpec {
    pub width: u32,
    pub height: u32,
    pub refresh_hz: Option<u32>,
    pub bit_depth: Option<u32>,
}

pub fn parse_mode(s: &str) -> Option<ModeSpec> {
    let (width, height, mut rest) = take_size(s)?;
    let mut spec = ModeSpec { width, height, refresh_hz: None, bit_depth: None };

    if let Some(r) = rest.strip_prefix('@') {
        let (hz, r) = take_uint(r)?;
        spec.refresh_hz = Some(hz);
        rest = r;
    }
    if let Some(r) = rest.strip_prefix(':') {
        let (bpp, r) = take_uint(r)?;
        spec.bit_depth = Some(bpp);
        rest = r;
    }

    rest.is_empty().then_some(spec)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FullscreenSpec {
    Desktop,
    Mode(ModeSpec),
}

/// Pick entry `index` (1-based) of the mode list.
pub fn fullscreen_mode(modelist: &str, index: i32) -> Option<FullscreenSpec> {
    if index < 1 {
        return None;
    }
    let entry = modelist.split_whitespace().nth(index as usize - 1)?;
    if entry.eq_ignore_ascii_case("desktop") {
        return Some(FullscreenSpec::Desktop);
    }
    match parse_mode(entry) {
        Some(m) => Some(FullscreenSpec::Mode(m)),
        None => {
            debug!("fullscreen_mode: bad mode list entry \"{}\"", entry);
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometrySpec {
    pub width: u32,
    pub height: u32,
    pub pos: Option<(i32, i32)>,
}

pub fn parse_geometry(s: &str) -> Option<GeometrySpec> {
    let (width, height, rest) = take_size(s.trim())?;
    if rest.is_empty() {
        return Some(GeometrySpec { width, height, pos: None });
    }
    let (x, rest) = take_signed(rest)?;
    let (y, rest) = take_signed(rest)?;
    rest.is_empty().then_some(GeometrySpec { width, height, pos: Some((x, y)) })
}

pub fn format_geometry(width: u32, height: u32, x: i32, y: i32) -> String {
    format!("{}x{}{:+}{:+}", width, height, x, y)
}
