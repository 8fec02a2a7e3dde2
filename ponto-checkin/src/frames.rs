//! Polling discovery of the time-clock frame.
//!
//! The microfrontend mounts asynchronously, sometimes only after a second
//! in-application navigation, so a single snapshot of the frame set is not
//! enough. Every tick re-enumerates the page's live frames from scratch:
//! navigation can replace the whole collection, which makes any cached
//! handle from a previous tick worthless.

use std::time::Duration;

use fantoccini::{elements::Element, Client, Locator};
use ponto_common::{wait::poll_ticks, CheckinError};
use tracing::trace;

/// The frame that matched, the tick it appeared on, and its URL.
pub struct FrameHit {
    pub element: Element,
    pub url: String,
    pub tick: u32,
}

impl FrameHit {
    /// Switch the session into the frame. The returned client runs every
    /// subsequent command inside the sub-document.
    pub async fn enter(self) -> anyhow::Result<Client> {
        self.element.enter_frame().await?;
        Ok(self.element.client())
    }
}

/// Case-insensitive substring match of a frame URL against the targets.
pub fn src_matches(src: &str, fragments: &[String]) -> bool {
    let lowered = src.to_lowercase();
    fragments
        .iter()
        .any(|fragment| lowered.contains(&fragment.to_lowercase()))
}

/// Scan for a matching frame, once per tick, for at most `max_attempts`
/// ticks. First match in enumeration order wins; no disambiguation beyond
/// that.
pub async fn locate(
    client: &Client,
    fragments: &[String],
    max_attempts: u32,
    interval: Duration,
) -> Result<FrameHit, CheckinError> {
    let hit = poll_ticks(max_attempts, interval, || scan_frames(client, fragments))
        .await
        .map_err(CheckinError::Driver)?;

    match hit {
        Some(polled) => {
            let (element, url) = polled.value;
            Ok(FrameHit {
                element,
                url,
                tick: polled.tick,
            })
        }
        None => Err(CheckinError::FrameNotFound {
            attempts: max_attempts,
        }),
    }
}

/// One pass over the live frame collection. Scan failures (mid-navigation,
/// detached elements) count as "nothing yet" rather than aborting the poll.
async fn scan_frames(
    client: &Client,
    fragments: &[String],
) -> anyhow::Result<Option<(Element, String)>> {
    let frames = match client.find_all(Locator::Css("iframe")).await {
        Ok(frames) => frames,
        Err(err) => {
            trace!(error = %err, "frame enumeration failed this tick");
            return Ok(None);
        }
    };

    let mut seen = Vec::new();
    for frame in frames {
        match frame.attr("src").await {
            Ok(Some(src)) => {
                if src_matches(&src, fragments) {
                    return Ok(Some((frame, src)));
                }
                seen.push(src);
            }
            Ok(None) => {}
            Err(err) => trace!(error = %err, "frame src read failed this tick"),
        }
    }
    trace!(?seen, "no frame matched this tick");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn src_matching_is_case_insensitive() {
        let fragments = vec!["pontomobile".to_string(), "clocking-event".to_string()];
        assert!(src_matches(
            "https://platform.example.com/HCM-PontoMobile/app",
            &fragments
        ));
        assert!(src_matches(
            "https://platform.example.com/x/#/Clocking-Event?r=0",
            &fragments
        ));
        assert!(!src_matches("https://platform.example.com/payroll", &fragments));
    }

    #[test]
    fn any_fragment_is_enough() {
        let fragments = vec!["never".to_string(), "hcm".to_string()];
        assert!(src_matches("https://host/hcm/view", &fragments));
    }

    #[test]
    fn empty_fragment_list_matches_nothing() {
        assert!(!src_matches("https://host/hcm/view", &[]));
    }
}
