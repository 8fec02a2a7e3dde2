//! Driver layer for the check-in automation.
//!
//! This crate wraps the WebDriver protocol (via `fantoccini`) behind the
//! pieces the engine composes:
//!
//! - [`browser::session::Session`]: one owned browser process + client,
//!   released on every exit path
//! - [`browser::locate`]: the ordered-fallback element location strategies
//! - [`browser::evidence`]: best-effort screenshot/markup capture

pub mod browser;
