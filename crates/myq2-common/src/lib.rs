#![allow(clippy::manual_range_contains, clippy::new_without_default)]

pub mod cvar;
pub mod keys;
