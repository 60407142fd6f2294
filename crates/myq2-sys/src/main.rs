// Entry point -- window and input test harness
//
// Brings the platform layer up on a winit event loop and logs everything it
// produces: key and button events, mouse motion, activation and mode
// changes. Escape releases the mouse, a click grabs it again, F11 toggles
// fullscreen and F12 cycles the raw/legacy mouse path.
//
// Log level comes from RUST_LOG (default: info).

use std::sync::Arc;

use log::{error, info};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use myq2_common::cvar::CvarContext;
use myq2_common::keys::{K_ESCAPE, K_F11, K_F12, K_MOUSE1};
use myq2_sys::in_grab::GrabState;
use myq2_sys::in_keys::LogicalKeyEvent;
use myq2_sys::in_mouse::MouseButtonEvent;
use myq2_sys::platform::{ActiveState, EventSink, ModeObserver, PRODUCT};
use myq2_sys::sys_win::TimedMsg;
use myq2_sys::win_state::Win;
use myq2_sys::winit_backend::WinitBackend;

#[derive(Default)]
struct LogSink {
    active: bool,
    want_grab: bool,
    toggle_fullscreen: bool,
    toggle_rawmouse: bool,
    quit: bool,
}

impl EventSink for LogSink {
    fn key_event(&mut self, ev: LogicalKeyEvent) {
        info!("key {} {} @{}", ev.key, if ev.down { "down" } else { "up" }, ev.time);
        if !ev.down {
            return;
        }
        match ev.key {
            K_ESCAPE => self.want_grab = false,
            K_F11 => self.toggle_fullscreen = true,
            K_F12 => self.toggle_rawmouse = true,
            _ => {}
        }
    }

    fn button_event(&mut self, ev: MouseButtonEvent) {
        info!("button {} {} @{}", ev.keynum(), if ev.down { "down" } else { "up" }, ev.time);
        if ev.down && ev.keynum() == K_MOUSE1 {
            self.want_grab = true;
        }
    }

    fn activate(&mut self, state: ActiveState) {
        info!("activate: {:?}", state);
        self.active = state == ActiveState::Activated;
        self.want_grab = self.active;
    }

    fn quit(&mut self) {
        self.quit = true;
    }
}

struct LogRenderer;

impl ModeObserver for LogRenderer {
    fn mode_changed(&mut self, width: u32, height: u32, fullscreen: bool) {
        info!("mode changed: {}x{}{}", width, height, if fullscreen { " fullscreen" } else { "" });
    }
}

struct App {
    cvars: CvarContext,
    win: Option<Win<WinitBackend>>,
    queue: Vec<TimedMsg>,
    sink: LogSink,
    renderer: LogRenderer,
}

impl App {
    fn new() -> Self {
        App {
            cvars: CvarContext::new(),
            win: None,
            queue: Vec::new(),
            sink: LogSink::default(),
            renderer: LogRenderer,
        }
    }

    fn create(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn std::error::Error>> {
        let attrs = Window::default_attributes().with_title(PRODUCT).with_visible(false);
        let window = Arc::new(event_loop.create_window(attrs)?);

        let mut win = Win::init(WinitBackend::new(window), &mut self.cvars)?;
        win.set_mode(&mut self.cvars, &mut self.renderer);
        win.input_init(&mut self.cvars);
        self.win = Some(win);
        Ok(())
    }

    fn frame(&mut self) {
        let Some(win) = self.win.as_mut() else {
            return;
        };

        let msgs = std::mem::take(&mut self.queue);
        win.pump_events(msgs, &mut self.cvars, &mut self.sink, &mut self.renderer);

        if std::mem::take(&mut self.sink.toggle_fullscreen) {
            win.toggle_fullscreen(&mut self.cvars, &mut self.renderer);
        }
        if std::mem::take(&mut self.sink.toggle_rawmouse) {
            let value = if self.cvars.variable_integer("win_rawmouse") != 0 { "0" } else { "1" };
            self.cvars.set_notify("win_rawmouse", value, win);
            info!("mouse path: {:?}", win.input().mode());
        }

        let grab = if self.sink.active && self.sink.want_grab {
            GrabState::Grabbed
        } else {
            GrabState::Free
        };
        if grab != win.input().grab_state() {
            win.grab_mouse(grab, &self.cvars);
        }

        if let Some((dx, dy)) = win.mouse_motion() {
            if dx != 0 || dy != 0 {
                info!("motion {} {}", dx, dy);
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(win) = self.win.take() {
            win.shutdown(&mut self.cvars);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.win.is_some() {
            return;
        }
        if let Err(e) = self.create(event_loop) {
            error!("Couldn't initialize the platform layer: {}", e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(win) = self.win.as_mut() else {
            return;
        };
        if let Some(msg) = win.backend_mut().translate_window_event(&event) {
            self.queue.push(msg);
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(win) = self.win.as_mut() else {
            return;
        };
        if let Some(msg) = win.backend_mut().translate_device_event(&event) {
            self.queue.push(msg);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.frame();
        if self.sink.quit {
            self.shutdown();
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
        let mut out = Vec::new();
        if self.cvars.write_variables(&mut out).is_ok() {
            info!("archived variables:\n{}", String::from_utf8_lossy(&out));
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;
    Ok(())
}
