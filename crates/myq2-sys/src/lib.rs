#![allow(clippy::too_many_arguments, clippy::collapsible_if, clippy::collapsible_else_if)]

// Platform layer -- main window, display modes, mouse and keyboard input.
//
// Win (win_state.rs) is the single platform context. It drives the OS
// through the Backend traits in platform.rs; winit_backend.rs implements
// them on top of winit.

pub mod error;
pub mod platform;

pub mod in_keys;
pub mod in_mouse;
pub mod in_grab;
pub mod in_win;

pub mod vid_modes;
pub mod vid_win;

pub mod win_state;
pub mod sys_win;
pub mod winit_backend;

#[cfg(test)]
mod mock;

pub use error::{SysError, SysResult};
pub use win_state::Win;
