// error.rs -- platform layer error taxonomy

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SysError {
    /// The main window could not be created. Fatal at startup.
    #[error("couldn't create main window: {0}")]
    WindowCreation(String),

    /// No drawing context for the main window. Fatal at startup.
    #[error("couldn't get DC of the main window")]
    DeviceContext,

    #[error("RegisterRawInputDevices failed: {0}")]
    RawInputRegistration(String),

    #[error("display mode change to {width}x{height} failed: {reason}")]
    DisplayModeChange {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("hardware gamma not supported")]
    GammaUnsupported,

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("couldn't set low-level keyboard hook: {0}")]
    KeyboardHook(String),

    #[error("window system call failed: {0}")]
    Window(String),
}

impl SysError {
    /// True for errors after which the platform layer can't keep running.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SysError::WindowCreation(_) | SysError::DeviceContext)
    }
}

pub type SysResult<T> = Result<T, SysError>;
