//! Best-effort confirmation of the check-in.
//!
//! The platform does not render a toast for every session or locale, so a
//! missing confirmation is a warning, not a failure. This module never
//! raises; it only reports confirmed vs. unconfirmed.

use std::time::Duration;

use fantoccini::{Client, Locator};
use ponto_common::wait::poll_within;
use ponto_drivers::browser::locate::any_of;
use regex::Regex;

/// Poll the frame's visible text for any confirmation pattern. `true` on the
/// first hit, `false` once the deadline passes. Internal failures count as
/// "not seen yet".
pub async fn confirm(
    frame: &Client,
    patterns: &[String],
    deadline: Duration,
    interval: Duration,
) -> bool {
    let matcher = any_of(patterns);

    let result = poll_within(deadline, interval, || async {
        Ok(seen_confirmation(frame, &matcher).await.then_some(()))
    })
    .await;

    matches!(result, Ok(Some(())))
}

async fn seen_confirmation(frame: &Client, matcher: &Regex) -> bool {
    match frame.find_all(Locator::Css("body")).await {
        Ok(bodies) => {
            for body in bodies {
                if let Ok(text) = body.text().await {
                    if matcher.is_match(&text) {
                        return true;
                    }
                }
            }
            false
        }
        Err(_) => false,
    }
}
