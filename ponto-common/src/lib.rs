//! Common types and utilities shared across the Ponto crates.
//!
//! This crate defines the error taxonomy, the run log, the bounded polling
//! helper, and centralised tracing initialisation. It is intentionally
//! lightweight so every other crate can depend on it without pulling in the
//! browser stack.
//!
//! # Overview
//!
//! - [`CheckinError`] and [`Result`]: shared error handling
//! - [`runlog::RunLog`]: the append-only narrative returned by a run
//! - [`wait`]: the bounded poll-until-predicate helper
//! - [`observability`]: tracing/logging initialisation

pub mod observability;
pub mod runlog;
pub mod wait;

/// Error types used across the check-in flow.
///
/// Every variant is fatal for the run that raises it; fallback chains live
/// inside the individual steps, never at the run level.
#[derive(thiserror::Error, Debug)]
pub enum CheckinError {
    /// Configuration was incomplete or invalid. Raised before any browser
    /// action, so a misconfigured run has zero side effects.
    #[error("configuration error: {0}")]
    Config(String),

    /// The browser process or WebDriver session could not be started.
    #[error("browser session could not be started: {0}")]
    Session(String),

    /// A login field matched none of its locator fallbacks within budget.
    #[error("login field not found: {0}")]
    AuthFieldNotFound(String),

    /// Not even the generic first-button fallback produced a submit control.
    #[error("no submit control found on the login page")]
    SubmitButtonNotFound,

    /// No post-login signal (URL, sibling window, or embedded frame) before
    /// the global deadline.
    #[error("post-login navigation not detected: {0}")]
    PostLoginNavigation(String),

    /// The target frame never appeared in the live frame set.
    #[error("time-clock frame not found after {attempts} scan(s)")]
    FrameNotFound { attempts: u32 },

    /// Every action locator strategy was exhausted without a click.
    #[error("check-in control not found: {0}")]
    ActionNotFound(String),

    /// A lower-level driver failure (WebDriver command, process spawn).
    #[error("driver error: {0}")]
    Driver(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`CheckinError`].
pub type Result<T> = std::result::Result<T, CheckinError>;
