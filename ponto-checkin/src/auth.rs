//! The multi-step login sequence.
//!
//! Every lookup is locale-tolerant (the tenant decides the UI language) and
//! fallback-chained; a step only fails once all of its fallbacks are spent.

use std::time::Duration;

use fantoccini::{Client, Locator};
use ponto_common::{runlog::RunLog, wait::poll_within, CheckinError};
use ponto_config::{CheckinConfig, Locators, Targets, Timing};
use ponto_drivers::browser::locate::{any_of, locate_first, Strategy};
use tracing::debug;

use crate::into_driver;

/// Run the whole login flow and wait for the application to come up.
pub async fn login(
    client: &Client,
    config: &CheckinConfig,
    log: &mut RunLog,
) -> Result<(), CheckinError> {
    let locators = &config.locators;
    let timing = &config.timing;

    // Default page-load wait only. Network idle is unreliable here: the SPA
    // keeps polling connections open indefinitely.
    client
        .goto(&config.targets.login_url)
        .await
        .map_err(into_driver)?;
    log.push("Login page loaded.");

    dismiss_consent_banner(client, locators, timing).await;

    let user_field = locate_first(
        client,
        &field_strategies(&locators.user_labels, timing.field_timeout()),
        timing.poll_interval(),
    )
    .await
    .map_err(CheckinError::Driver)?;
    let Some((user_field, _)) = user_field else {
        return Err(CheckinError::AuthFieldNotFound("user".into()));
    };
    user_field
        .send_keys(&config.credentials.user)
        .await
        .map_err(into_driver)?;
    log.push("User field filled.");

    advance_if_multi_step(client, locators, timing, log).await;

    let password_field = locate_first(
        client,
        &field_strategies(&locators.password_labels, timing.field_timeout()),
        timing.poll_interval(),
    )
    .await
    .map_err(CheckinError::Driver)?;
    let Some((password_field, _)) = password_field else {
        return Err(CheckinError::AuthFieldNotFound("password".into()));
    };
    password_field
        .send_keys(&config.credentials.password)
        .await
        .map_err(into_driver)?;
    log.push("Password field filled.");

    submit(client, locators, timing).await?;
    log.push("Credentials submitted. Waiting for the application…");

    wait_post_login(client, &config.targets, timing, log).await
}

/// Placeholder match first, associated label second. The order mirrors how
/// the login form has actually been shipped: placeholders are the stable
/// surface, labels appear on some tenants only.
fn field_strategies(labels: &[String], timeout: Duration) -> Vec<Strategy> {
    let pattern = any_of(labels);
    vec![
        Strategy::Placeholder {
            pattern: pattern.clone(),
            timeout,
        },
        Strategy::Label { pattern, timeout },
    ]
}

/// Some tenants interpose a consent banner before the form. Dismissing it is
/// opportunistic; absence is the common case.
async fn dismiss_consent_banner(client: &Client, locators: &Locators, timing: &Timing) {
    let strategies = [Strategy::Role {
        name: any_of(&locators.consent_labels),
        timeout: timing.button_timeout(),
    }];
    match locate_first(client, &strategies, timing.poll_interval()).await {
        Ok(Some((banner_button, _))) => {
            if banner_button.click().await.is_ok() {
                debug!("consent banner dismissed");
            }
        }
        Ok(None) => {}
        Err(err) => debug!(error = %err, "consent banner probe failed"),
    }
}

/// Click a next/continue control when the tenant uses a two-screen flow.
/// Candidates are tried in priority order; first match wins; finding none
/// after the whole list is a normal single-screen flow.
async fn advance_if_multi_step(
    client: &Client,
    locators: &Locators,
    timing: &Timing,
    log: &mut RunLog,
) {
    let mut strategies: Vec<Strategy> = locators
        .next_labels
        .iter()
        .map(|label| Strategy::Role {
            name: any_of(&[label.as_str()]),
            timeout: timing.button_timeout(),
        })
        .collect();
    // last resort: any button carrying one of the labels as visible text
    strategies.push(Strategy::CssWithText {
        selector: "button".into(),
        text: any_of(&locators.next_labels),
        timeout: timing.button_timeout(),
    });

    match locate_first(client, &strategies, timing.poll_interval()).await {
        Ok(Some((next_button, rank))) => {
            if next_button.click().await.is_ok() {
                log.push(format!("Next step control clicked ({}).", strategies[rank]));
                // give the second screen a moment to mount
                tokio::time::sleep(timing.settle()).await;
            }
        }
        Ok(None) => {
            log.push("No next/continue step; single-screen flow.");
        }
        Err(err) => debug!(error = %err, "next-step probe failed"),
    }
}

/// Submit the form: ordered localized labels first, then the page's first
/// generic button. Only a page with no button at all is an error.
async fn submit(client: &Client, locators: &Locators, timing: &Timing) -> Result<(), CheckinError> {
    let strategies: Vec<Strategy> = locators
        .submit_labels
        .iter()
        .map(|label| Strategy::Role {
            name: any_of(&[label.as_str()]),
            timeout: timing.button_timeout(),
        })
        .collect();

    if let Some((submit_button, rank)) = locate_first(client, &strategies, timing.poll_interval())
        .await
        .map_err(CheckinError::Driver)?
    {
        debug!(strategy = %strategies[rank], "submit control located");
        return submit_button.click().await.map_err(into_driver);
    }

    match client
        .find_all(Locator::Css("button"))
        .await
        .map_err(into_driver)?
        .into_iter()
        .next()
    {
        Some(first_button) => {
            debug!("submit labels exhausted, clicking the first generic button");
            first_button.click().await.map_err(into_driver)
        }
        None => Err(CheckinError::SubmitButtonNotFound),
    }
}

/// Wait for any signal that the application context is up: the page URL, a
/// sibling window opened by the platform, or an embedded frame.
async fn wait_post_login(
    client: &Client,
    targets: &Targets,
    timing: &Timing,
    log: &mut RunLog,
) -> Result<(), CheckinError> {
    let fragment = targets.post_login_fragment.to_lowercase();

    let signal = poll_within(timing.global_deadline(), timing.poll_interval(), || {
        post_login_signal(client, &fragment)
    })
    .await
    .map_err(CheckinError::Driver)?;

    match signal {
        Some(signal) => {
            log.push(format!("Login ok ({signal})."));
            Ok(())
        }
        None => Err(CheckinError::PostLoginNavigation(format!(
            "no '{}' url, window, or frame before the deadline",
            targets.post_login_fragment
        ))),
    }
}

async fn post_login_signal(client: &Client, fragment: &str) -> anyhow::Result<Option<String>> {
    if let Ok(url) = client.current_url().await {
        if url.as_str().to_lowercase().contains(fragment) {
            return Ok(Some(format!("url {url}")));
        }
    }

    // The platform sometimes opens the application in a sibling window.
    // If one matches, the session stays switched to it.
    if let Ok(handles) = client.windows().await {
        if handles.len() > 1 {
            if let Ok(original) = client.window().await {
                for handle in handles {
                    if client.switch_to_window(handle).await.is_err() {
                        continue;
                    }
                    if let Ok(url) = client.current_url().await {
                        if url.as_str().to_lowercase().contains(fragment) {
                            return Ok(Some(format!("window {url}")));
                        }
                    }
                }
                let _ = client.switch_to_window(original).await;
            }
        }
    }

    if let Ok(frames) = client.find_all(Locator::Css("iframe")).await {
        for frame in frames {
            if let Ok(Some(src)) = frame.attr("src").await {
                if src.to_lowercase().contains(fragment) {
                    return Ok(Some(format!("frame {src}")));
                }
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup_tries_placeholder_before_label() {
        let strategies = field_strategies(
            &["Usuário".to_string(), "User".to_string()],
            Duration::from_secs(5),
        );
        assert_eq!(strategies.len(), 2);
        assert!(matches!(strategies[0], Strategy::Placeholder { .. }));
        assert!(matches!(strategies[1], Strategy::Label { .. }));
        assert_eq!(strategies[0].timeout(), Duration::from_secs(5));
    }
}
