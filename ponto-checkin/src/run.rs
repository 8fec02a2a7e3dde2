//! The run: one session, one linear sequence of steps, evidence and release
//! on every exit path.

use fantoccini::Client;
use ponto_common::{runlog::RunLog, CheckinError};
use ponto_config::{BrowserConfig, CheckinConfig, EvidenceConfig};
use ponto_drivers::browser::{
    evidence::{self, EvidencePaths},
    session::{Session, SessionConfig},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{action, auth, frames, into_driver, outcome};

/// Perform one check-in. Returns the newline-joined run log on success, or
/// the first fatal error. The browser session is released and evidence is
/// captured no matter how the run ends; no step is ever retried at run
/// level.
pub async fn run_checkin(config: &CheckinConfig) -> Result<String, CheckinError> {
    // Fail before any browser action: a misconfigured run has no side effects.
    config.credentials.validate()?;

    let run_id = Uuid::new_v4();
    let mut log = RunLog::new();
    log.push("Check-in run started.");
    info!(%run_id, "checkin.run.start");

    let session = Session::acquire(&session_config(&config.browser))
        .await
        .map_err(|err| CheckinError::Session(err.to_string()))?;

    let outcome = drive(&session.client, config, &mut log).await;

    // Evidence first, release second; neither may mask the run's error.
    evidence::capture(&session.client, &evidence_paths(&config.evidence)).await;
    session.release().await;

    match outcome {
        Ok(()) => {
            log.push("Check-in flow finished.");
            info!(%run_id, "checkin.run.ok");
            Ok(log.join())
        }
        Err(err) => {
            warn!(%run_id, error = %err, "checkin.run.failed");
            Err(err)
        }
    }
}

/// The linear flow between session acquisition and cleanup.
async fn drive(
    client: &Client,
    config: &CheckinConfig,
    log: &mut RunLog,
) -> Result<(), CheckinError> {
    auth::login(client, config, log).await?;

    client
        .goto(&config.targets.clocking_url)
        .await
        .map_err(into_driver)?;
    log.push("Time-clock page opened.");

    // The deep link triggers a second in-application navigation; give it a
    // head start before scanning for the frame.
    tokio::time::sleep(config.timing.settle()).await;

    let hit = frames::locate(
        client,
        &config.targets.frame_fragments,
        config.timing.frame_attempts,
        config.timing.frame_interval(),
    )
    .await?;
    log.push(format!("Target frame found on tick {}: {}", hit.tick, hit.url));

    let frame = hit.enter().await.map_err(CheckinError::Driver)?;

    action::perform(&frame, &config.locators, &config.timing, log).await?;

    if outcome::confirm(
        &frame,
        &config.locators.success_patterns,
        config.timing.confirm_timeout(),
        config.timing.poll_interval(),
    )
    .await
    {
        log.push("Confirmation message found.");
    } else {
        log.push(
            "Warning: no explicit confirmation message; assuming success from the error-free flow.",
        );
    }

    Ok(())
}

fn session_config(browser: &BrowserConfig) -> SessionConfig {
    SessionConfig {
        headless: browser.headless,
        locale: browser.locale.clone(),
        timezone: browser.timezone.clone(),
        webdriver_url: browser.webdriver_url.clone(),
        chromedriver_bin: browser.chromedriver_bin.clone(),
        port: browser.webdriver_port,
        extra_args: browser.extra_args.clone(),
    }
}

fn evidence_paths(evidence: &EvidenceConfig) -> EvidencePaths {
    EvidencePaths {
        screenshot: evidence.screenshot_path.clone(),
        html: evidence.html_path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_credentials_fail_before_any_browser_action() {
        // an unreachable driver binary proves no session is ever attempted:
        // the configuration check must fire first
        let mut config = CheckinConfig::default();
        config.browser.chromedriver_bin = "/nonexistent/chromedriver".into();

        let err = run_checkin(&config).await.unwrap_err();
        assert!(matches!(err, CheckinError::Config(_)));
    }

    #[tokio::test]
    async fn missing_password_alone_is_still_a_config_error() {
        let mut config = CheckinConfig::default();
        config.credentials.user = "someone".into();
        config.browser.chromedriver_bin = "/nonexistent/chromedriver".into();

        let err = run_checkin(&config).await.unwrap_err();
        assert!(matches!(err, CheckinError::Config(_)));
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn session_config_carries_locale_and_timezone() {
        let browser = BrowserConfig::default();
        let session = session_config(&browser);
        assert_eq!(session.locale, "pt-BR");
        assert_eq!(session.timezone, "America/Sao_Paulo");
        assert!(session.headless);
        assert_eq!(session.port, 9515);
    }
}
