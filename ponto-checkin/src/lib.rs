//! The check-in engine: drive one browser session through login, find the
//! time-clock frame, trigger the control, and best-effort-confirm the
//! result.
//!
//! - [`auth`]: the multi-step, locale-tolerant login sequence
//! - [`frames`]: polling discovery of the dynamically-mounted frame
//! - [`action`]: ordered-fallback triggering of the check-in control
//! - [`outcome`]: best-effort confirmation polling
//! - [`run`]: the one linear flow tying it all together
//!
//! The engine's only entry point is [`run::run_checkin`]; everything it
//! needs arrives in a [`ponto_config::CheckinConfig`] value.

pub mod action;
pub mod auth;
pub mod frames;
pub mod outcome;
pub mod run;

pub use run::run_checkin;

use ponto_common::CheckinError;

/// Lift a WebDriver command failure into the shared taxonomy.
pub(crate) fn into_driver(err: fantoccini::error::CmdError) -> CheckinError {
    CheckinError::Driver(err.into())
}
