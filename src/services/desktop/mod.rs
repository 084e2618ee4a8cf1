//! Desktop integration that follows session lifecycle.
//!
//! Writes a launcher entry for each exposed player so menus and sound
//! indicators can show the device name and icon, and cleans up after the
//! player goes away.

/// Launcher entry files
pub mod entry;
/// Session hook implementation
pub mod hooks;
/// Sound indicator player list
pub mod indicator;

pub use entry::*;
pub use hooks::*;
pub use indicator::*;
