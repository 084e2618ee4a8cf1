/// BlueZ media-control backend
pub mod bluez;
/// Session lifecycle and reconciliation
pub mod bridge;
/// Desktop integration side effects
pub mod desktop;
/// Exposed MPRIS surface
pub mod mpris;
