//! bluempris - Bluetooth AVRCP to MPRIS bridge.
//!
//! Watches BlueZ for `org.bluez.MediaPlayer1` objects and exposes each one
//! on the session bus as `org.mpris.MediaPlayer2.<name>`, so desktop media
//! widgets can show and control the remote player:
//!
//! - Periodic reconciliation of exposed sessions against BlueZ
//! - Translation of playback state, track metadata and transport commands
//! - Batched `PropertiesChanged` relay of backend changes
//! - Optional desktop entries and sound indicator cleanup
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bluempris::services::{
//!     bluez::BluezEnumerator,
//!     bridge::{BluezSessionFactory, NoHooks, Reconciler, SessionRegistry},
//!     mpris::SessionSettings,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let system = zbus::Connection::system().await?;
//! let reconciler = Reconciler::new(
//!     BluezEnumerator::new(system.clone()),
//!     BluezSessionFactory::new(system, SessionSettings::default()),
//!     NoHooks,
//!     SessionRegistry::new(),
//! );
//!
//! reconciler
//!     .run(std::time::Duration::from_secs(1), async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```

/// Command-line interface.
pub mod cli;

/// Configuration schema definitions and validation.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Backend, exposed surface and lifecycle services.
pub mod services;

/// Logging setup.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{BridgeError, Result};
