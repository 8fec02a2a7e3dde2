//! Session acquisition and release.
//!
//! A [`Session`] exclusively owns one chromedriver child process and one
//! WebDriver session for the duration of a run. Locale and timezone are
//! bound at acquisition (`--lang` + `intl.accept_languages` for the locale,
//! `TZ` on the child process for the timezone) and stay fixed until release.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use fantoccini::{Client, ClientBuilder};
use ponto_common::wait::poll_within;
use serde_json::json;
use tokio::process::{Child, Command};
use tracing::{debug, warn};
use webdriver::capabilities::Capabilities;

/// How long to keep retrying the first connection while the driver boots.
const CONNECT_DEADLINE: Duration = Duration::from_secs(10);
const CONNECT_INTERVAL: Duration = Duration::from_millis(250);

/// Launch settings for one browser session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub headless: bool,
    pub locale: String,
    pub timezone: String,
    /// Connect to an already-running WebDriver instead of spawning one.
    pub webdriver_url: Option<String>,
    pub chromedriver_bin: String,
    pub port: u16,
    pub extra_args: Vec<String>,
}

/// One browser process + one WebDriver session, owned by a single run.
pub struct Session {
    pub client: Client,
    driver: Option<Child>,
}

impl Session {
    /// Spawn (or connect to) the WebDriver service and open a session.
    pub async fn acquire(config: &SessionConfig) -> Result<Self> {
        let (url, driver) = match &config.webdriver_url {
            Some(url) => {
                // An external service keeps its own environment; the run's
                // timezone cannot be enforced there.
                debug!(%url, "connecting to external webdriver");
                (url.clone(), None)
            }
            None => {
                let child = Command::new(&config.chromedriver_bin)
                    .arg(format!("--port={}", config.port))
                    .env("TZ", &config.timezone)
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .kill_on_drop(true)
                    .spawn()
                    .with_context(|| {
                        format!("failed to start {}", config.chromedriver_bin)
                    })?;
                debug!(port = config.port, "chromedriver spawned");
                (format!("http://localhost:{}", config.port), Some(child))
            }
        };

        let caps = chrome_capabilities(config);
        let client = poll_within(CONNECT_DEADLINE, CONNECT_INTERVAL, || {
            let url = url.clone();
            let caps = caps.clone();
            async move {
                match ClientBuilder::native().capabilities(caps).connect(&url).await {
                    Ok(client) => Ok(Some(client)),
                    Err(err) => {
                        tracing::trace!(error = %err, "webdriver not ready yet");
                        Ok(None)
                    }
                }
            }
        })
        .await?
        .ok_or_else(|| anyhow!("could not open a webdriver session at {url}"))?;

        Ok(Self { client, driver })
    }

    /// Close the session and reap the driver process. Best-effort on both:
    /// release runs on every exit path and must not replace the run's error.
    pub async fn release(self) {
        let Session { client, driver } = self;
        if let Err(err) = client.close().await {
            warn!(error = %err, "webdriver session close failed");
        }
        if let Some(mut child) = driver {
            if let Err(err) = child.kill().await {
                warn!(error = %err, "chromedriver kill failed");
            }
        }
    }
}

/// Chromium capabilities for a constrained execution host: sandbox off,
/// headless, shared-memory workaround, locale pinned.
fn chrome_capabilities(config: &SessionConfig) -> Capabilities {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        format!("--lang={}", config.locale),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    args.extend(config.extra_args.iter().cloned());

    let mut chrome_opts = serde_json::Map::new();
    chrome_opts.insert("args".to_string(), json!(args));
    chrome_opts.insert(
        "prefs".to_string(),
        json!({ "intl.accept_languages": config.locale }),
    );

    let mut caps = Capabilities::new();
    caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SessionConfig {
        SessionConfig {
            headless: true,
            locale: "pt-BR".into(),
            timezone: "America/Sao_Paulo".into(),
            webdriver_url: None,
            chromedriver_bin: "chromedriver".into(),
            port: 9515,
            extra_args: vec!["--window-size=1280,800".into()],
        }
    }

    fn chrome_args(caps: &Capabilities) -> Vec<String> {
        caps["goog:chromeOptions"]["args"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn capabilities_pin_sandbox_and_locale() {
        let caps = chrome_capabilities(&test_config());
        let args = chrome_args(&caps);

        assert!(args.contains(&"--no-sandbox".to_string()));
        assert!(args.contains(&"--disable-dev-shm-usage".to_string()));
        assert!(args.contains(&"--lang=pt-BR".to_string()));
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--window-size=1280,800".to_string()));
        assert_eq!(
            caps["goog:chromeOptions"]["prefs"]["intl.accept_languages"],
            "pt-BR"
        );
    }

    #[test]
    fn headful_mode_drops_the_headless_flags() {
        let mut config = test_config();
        config.headless = false;
        let args = chrome_args(&chrome_capabilities(&config));

        assert!(!args.iter().any(|a| a.starts_with("--headless")));
        assert!(!args.contains(&"--disable-gpu".to_string()));
        assert!(args.contains(&"--no-sandbox".to_string()));
    }
}
