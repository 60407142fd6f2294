// cvar.rs -- dynamic variable tracking
//
// Console variables double as the configuration store for the platform
// layer. Components that care about a variable subscribe to it and get a
// synchronous callback when `set_notify` changes its value.

use std::collections::HashMap;

use bitflags::bitflags;
use log::debug;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct CvarFlags: u32 {
        /// Written to the config file.
        const ARCHIVE = 1 << 0;
        /// Takes effect on the next video restart.
        const REFRESH = 1 << 1;
    }
}

/// Identifies a subscriber in a variable's notification list.
pub type ObserverId = u32;

/// A console variable.
#[derive(Clone, Debug)]
pub struct Cvar {
    pub name: String,
    pub string: String,
    pub default_string: String,
    pub flags: CvarFlags,
    pub integer: i32,
    /// Created by a plain `set` before any component registered it, so
    /// `default_string` is still the user's value.
    user_created: bool,
    subscribers: Vec<ObserverId>,
}

impl Cvar {
    fn new(name: &str, value: &str, flags: CvarFlags) -> Self {
        let mut var = Cvar {
            name: name.to_string(),
            string: String::new(),
            default_string: value.to_string(),
            flags,
            integer: 0,
            user_created: false,
            subscribers: Vec::new(),
        };
        var.assign(value);
        var
    }

    fn assign(&mut self, value: &str) {
        self.string = value.to_string();
        self.integer = value.trim().parse::<f32>().unwrap_or(0.0) as i32;
    }

    pub fn is_subscribed(&self, id: ObserverId) -> bool {
        self.subscribers.contains(&id)
    }
}

/// Receives change notifications for the variables it subscribed to.
///
/// The callback runs on the caller's thread before `set_notify` returns and
/// may freely read or write other variables through `cvars`.
pub trait CvarObserver {
    fn observer_id(&self) -> ObserverId;
    fn cvar_changed(&mut self, cvars: &mut CvarContext, name: &str);
}

/// The full cvar system context.
#[derive(Default)]
pub struct CvarContext {
    pub cvar_vars: Vec<Cvar>,
    /// O(1) cvar lookup by name -> index in cvar_vars
    cvar_index: HashMap<String, usize>,
}

impl CvarContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a cvar by name. O(1) via HashMap.
    pub fn find_var(&self, name: &str) -> Option<&Cvar> {
        self.cvar_index.get(name).map(|&idx| &self.cvar_vars[idx])
    }

    fn find_var_mut(&mut self, name: &str) -> Option<&mut Cvar> {
        match self.cvar_index.get(name) {
            Some(&idx) => Some(&mut self.cvar_vars[idx]),
            None => None,
        }
    }

    /// Get the integer value of a cvar. Returns 0 if not found.
    pub fn variable_integer(&self, name: &str) -> i32 {
        self.find_var(name).map_or(0, |v| v.integer)
    }

    /// Get the string value of a cvar. Returns "" if not found.
    pub fn variable_string(&self, name: &str) -> &str {
        self.find_var(name).map_or("", |v| v.string.as_str())
    }

    /// Get or create a cvar. If it already exists, the value is not changed
    /// but flags are OR'd in. A variable the user set before registration
    /// takes `value` as its default from here on.
    pub fn get_or_create(&mut self, name: &str, value: &str, flags: CvarFlags) -> usize {
        if let Some(&idx) = self.cvar_index.get(name) {
            let var = &mut self.cvar_vars[idx];
            var.flags |= flags;
            if var.user_created {
                var.default_string = value.to_string();
                var.user_created = false;
            }
            return idx;
        }

        let idx = self.cvar_vars.len();
        self.cvar_vars.push(Cvar::new(name, value, flags));
        self.cvar_index.insert(name.to_string(), idx);
        idx
    }

    /// Set a cvar value, creating it if needed. Returns true if the value
    /// changed. Never notifies observers.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        let var = match self.find_var_mut(name) {
            Some(var) => var,
            None => {
                let idx = self.get_or_create(name, value, CvarFlags::empty());
                self.cvar_vars[idx].user_created = true;
                debug!("{} created by set", name);
                return true;
            }
        };

        if value == var.string {
            return false; // not changed
        }

        var.assign(value);
        true
    }

    /// Restore a cvar to the value it was registered with.
    pub fn reset(&mut self, name: &str) -> bool {
        let default = match self.find_var(name) {
            Some(var) => var.default_string.clone(),
            None => return false,
        };
        self.set(name, &default)
    }

    /// Set a cvar and, if the value changed and `observer` is subscribed to
    /// it, deliver the change notification before returning.
    pub fn set_notify(&mut self, name: &str, value: &str, observer: &mut dyn CvarObserver) -> bool {
        if !self.set(name, value) {
            return false;
        }
        let subscribed = self
            .find_var(name)
            .is_some_and(|v| v.is_subscribed(observer.observer_id()));
        if subscribed {
            debug!("var = \"{}\"; notifying observer {}", name, observer.observer_id());
            observer.cvar_changed(self, name);
        }
        true
    }

    /// Add `id` to the notification list of `name`. Unknown names are ignored.
    pub fn subscribe(&mut self, name: &str, id: ObserverId) {
        if let Some(var) = self.find_var_mut(name) {
            if !var.subscribers.contains(&id) {
                var.subscribers.push(id);
            }
        }
    }

    /// Remove `id` from the notification list of `name`.
    pub fn unsubscribe(&mut self, name: &str, id: ObserverId) {
        if let Some(var) = self.find_var_mut(name) {
            var.subscribers.retain(|&s| s != id);
        }
    }

    /// Write all archived cvars to a writer.
    pub fn write_variables(&self, writer: &mut dyn std::io::Write) -> std::io::Result<()> {
        for var in &self.cvar_vars {
            if var.flags.contains(CvarFlags::ARCHIVE) {
                writeln!(writer, "set {} \"{}\"", var.name, var.string)?;
            }
        }
        Ok(())
    }
}

// ============================================================
// Tests
// ============================================================
