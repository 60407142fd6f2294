// in_grab.rs -- cursor grab state machine
//
// Decides what has to happen to the OS cursor when the requested grab
// state changes. Executing the steps is up to the input controller, which
// owns the pointer device.

/// Requested ownership of the pointer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GrabState {
    /// Cursor visible and free to leave the window.
    #[default]
    Free,
    /// Cursor hidden over the window but not confined.
    Hidden,
    /// Exclusive: cursor hidden, clipped to the client area and captured.
    Grabbed,
}

impl GrabState {
    /// Clipping and capture are active exactly in this state.
    pub fn is_exclusive(self) -> bool {
        self == GrabState::Grabbed
    }

    pub fn hides_cursor(self) -> bool {
        self != GrabState::Free
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorVisibility {
    Show,
    Hide,
}

/// Steps to perform for one grab request, in order:
/// release, acquire, visibility, then accumulator reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrabTransition {
    pub from: GrabState,
    pub to: GrabState,
    pub release_exclusive: bool,
    pub acquire_exclusive: bool,
    pub visibility: Option<CursorVisibility>,
}

impl GrabTransition {
    /// Same-state request: nothing changes except re-centering and
    /// clearing stale motion and button state.
    pub fn is_refresh(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GrabMachine {
    state: GrabState,
}

impl GrabMachine {
    pub fn state(&self) -> GrabState {
        self.state
    }

    /// Plan the transition to `requested` and commit the new state.
    pub fn request(&mut self, requested: GrabState) -> GrabTransition {
        let from = self.state;
        let t = plan(from, requested);
        self.state = requested;
        t
    }

    /// Forget the current state without planning any OS work. Used on
    /// shutdown after the cursor was already restored.
    pub fn reset(&mut self) {
        self.state = GrabState::Free;
    }
}

fn plan(from: GrabState, to: GrabState) -> GrabTransition {
    let mut t = GrabTransition {
        from,
        to,
        release_exclusive: false,
        acquire_exclusive: false,
        visibility: None,
    };

    if from == to {
        return t;
    }

    if to.is_exclusive() {
        t.acquire_exclusive = true;
        t.visibility = Some(CursorVisibility::Hide);
    } else {
        t.release_exclusive = from.is_exclusive();
        t.visibility = Some(if to.hides_cursor() {
            CursorVisibility::Hide
        } else {
            CursorVisibility::Show
        });
    }
    t
}
