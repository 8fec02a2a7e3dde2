//! Loader for the check-in run configuration: YAML file + `PONTO_`-prefixed
//! environment overlays, with recursive `${VAR}` expansion.
//!
//! Everything except the credentials has a usable default, so a deployment
//! can run purely on two environment variables:
//! `PONTO_CREDENTIALS__USER` and `PONTO_CREDENTIALS__PASSWORD`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use ponto_common::CheckinError;
use serde::Deserialize;
use serde_json::Value;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Everything one check-in run needs, resolved up front and passed into the
/// entry operation as a value. No component reads ambient process state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckinConfig {
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub targets: Targets,
    #[serde(default)]
    pub locators: Locators,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub evidence: EvidenceConfig,
}

/// The identifier/secret pair. Never logged verbatim; `Debug` redacts both.
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    /// Reject empty or whitespace-only values before any browser action.
    pub fn validate(&self) -> Result<(), CheckinError> {
        let mut missing = Vec::new();
        if self.user.trim().is_empty() {
            missing.push("credentials.user");
        }
        if self.password.trim().is_empty() {
            missing.push("credentials.password");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CheckinError::Config(format!(
                "missing {} (set PONTO_CREDENTIALS__USER / PONTO_CREDENTIALS__PASSWORD)",
                missing.join(" and ")
            )))
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// URLs and URL fragments that identify the platform's pages and frames.
#[derive(Debug, Clone, Deserialize)]
pub struct Targets {
    /// Login entry point.
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Deep link to the time-clock view, opened after login.
    #[serde(default = "default_clocking_url")]
    pub clocking_url: String,
    /// Substring that marks a post-login URL (page, window, or frame).
    #[serde(default = "default_post_login_fragment")]
    pub post_login_fragment: String,
    /// Substrings identifying the time-clock microfrontend's frame URL.
    #[serde(default = "default_frame_fragments")]
    pub frame_fragments: Vec<String>,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            clocking_url: default_clocking_url(),
            post_login_fragment: default_post_login_fragment(),
            frame_fragments: default_frame_fragments(),
        }
    }
}

/// Localized labels and selectors the locator strategies run over. The order
/// of each list is the priority order the fallbacks are tried in.
#[derive(Debug, Clone, Deserialize)]
pub struct Locators {
    #[serde(default = "default_consent_labels")]
    pub consent_labels: Vec<String>,
    #[serde(default = "default_user_labels")]
    pub user_labels: Vec<String>,
    #[serde(default = "default_password_labels")]
    pub password_labels: Vec<String>,
    #[serde(default = "default_next_labels")]
    pub next_labels: Vec<String>,
    #[serde(default = "default_submit_labels")]
    pub submit_labels: Vec<String>,
    /// CSS selector for the check-in control, narrowed by `action_labels`.
    #[serde(default = "default_action_selector")]
    pub action_selector: String,
    #[serde(default = "default_action_labels")]
    pub action_labels: Vec<String>,
    /// Prefix of the control's generated `id` attribute.
    #[serde(default = "default_action_id_prefix")]
    pub action_id_prefix: String,
    #[serde(default = "default_success_patterns")]
    pub success_patterns: Vec<String>,
}

impl Default for Locators {
    fn default() -> Self {
        Self {
            consent_labels: default_consent_labels(),
            user_labels: default_user_labels(),
            password_labels: default_password_labels(),
            next_labels: default_next_labels(),
            submit_labels: default_submit_labels(),
            action_selector: default_action_selector(),
            action_labels: default_action_labels(),
            action_id_prefix: default_action_id_prefix(),
            success_patterns: default_success_patterns(),
        }
    }
}

/// Browser/WebDriver launch settings. Locale and timezone are bound at
/// session acquisition and stay fixed for the run.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Connect to an already-running WebDriver instead of spawning one.
    #[serde(default)]
    pub webdriver_url: Option<String>,
    #[serde(default = "default_chromedriver_bin")]
    pub chromedriver_bin: String,
    #[serde(default = "default_webdriver_port")]
    pub webdriver_port: u16,
    /// Extra chromium arguments appended verbatim.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            locale: default_locale(),
            timezone: default_timezone(),
            webdriver_url: None,
            chromedriver_bin: default_chromedriver_bin(),
            webdriver_port: default_webdriver_port(),
            extra_args: Vec::new(),
        }
    }
}

/// Timeout and polling knobs. The global deadline tolerates a slow third-
/// party SPA; the per-step budgets keep individual fallbacks bounded.
#[derive(Debug, Clone, Deserialize)]
pub struct Timing {
    #[serde(default = "default_global_deadline_secs")]
    pub global_deadline_secs: u64,
    #[serde(default = "default_field_timeout_secs")]
    pub field_timeout_secs: u64,
    #[serde(default = "default_button_timeout_secs")]
    pub button_timeout_secs: u64,
    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,
    #[serde(default = "default_frame_attempts")]
    pub frame_attempts: u32,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            global_deadline_secs: default_global_deadline_secs(),
            field_timeout_secs: default_field_timeout_secs(),
            button_timeout_secs: default_button_timeout_secs(),
            action_timeout_secs: default_action_timeout_secs(),
            frame_attempts: default_frame_attempts(),
            frame_interval_ms: default_frame_interval_ms(),
            confirm_timeout_secs: default_confirm_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Timing {
    pub fn global_deadline(&self) -> Duration {
        Duration::from_secs(self.global_deadline_secs)
    }
    pub fn field_timeout(&self) -> Duration {
        Duration::from_secs(self.field_timeout_secs)
    }
    pub fn button_timeout(&self) -> Duration {
        Duration::from_secs(self.button_timeout_secs)
    }
    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Where the per-run evidence artifacts land. Overwritten every run.
#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceConfig {
    #[serde(default = "default_screenshot_path")]
    pub screenshot_path: PathBuf,
    #[serde(default = "default_html_path")]
    pub html_path: PathBuf,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            screenshot_path: default_screenshot_path(),
            html_path: default_html_path(),
        }
    }
}

fn default_login_url() -> String {
    "https://platform.senior.com.br/login/?redirectTo=https%3A%2F%2Fplatform.senior.com.br%2Fsenior-x%2F&tenant=g4f.com.br".into()
}
fn default_clocking_url() -> String {
    "https://platform.senior.com.br/senior-x/#/Gest%C3%A3o%20de%20Pessoas%20%7C%20HCM/1/res:%2F%2Fsenior.com.br%2Fhcm%2Fpontomobile%2FclockingEvent?category=frame&link=https:%2F%2Fplatform.senior.com.br%2Fhcm-pontomobile%2Fhcm%2Fpontomobile%2F%23%2Fclocking-event&withCredentials=true&r=0".into()
}
fn default_post_login_fragment() -> String {
    "senior-x".into()
}
fn default_frame_fragments() -> Vec<String> {
    ["pontomobile", "clocking-event", "hcm-pontomobile", "hcm"]
        .map(String::from)
        .to_vec()
}
fn default_consent_labels() -> Vec<String> {
    ["Aceitar", "Aceito", "Concordo", "Entendi", "Accept", "OK"]
        .map(String::from)
        .to_vec()
}
fn default_user_labels() -> Vec<String> {
    ["Usuário", "Usuario", "E-mail", "Email", "User"]
        .map(String::from)
        .to_vec()
}
fn default_password_labels() -> Vec<String> {
    ["Senha", "Password"].map(String::from).to_vec()
}
fn default_next_labels() -> Vec<String> {
    ["Próximo", "Próxima", "Continuar", "Avançar", "Next", "Continue"]
        .map(String::from)
        .to_vec()
}
fn default_submit_labels() -> Vec<String> {
    [
        "Entrar",
        "Acessar",
        "Login",
        "Continuar",
        "Entrar na plataforma",
        "Autenticar",
    ]
    .map(String::from)
    .to_vec()
}
fn default_action_selector() -> String {
    "button".into()
}
fn default_action_labels() -> Vec<String> {
    ["Registrar Ponto", "Registrar ponto"].map(String::from).to_vec()
}
fn default_action_id_prefix() -> String {
    "btn-clocking-event-".into()
}
fn default_success_patterns() -> Vec<String> {
    [
        "Ponto registrado com sucesso",
        "Registro efetuado",
        "Marcação realizada",
        "Seu ponto foi registrado",
        "Operação realizada com sucesso",
    ]
    .map(String::from)
    .to_vec()
}
fn default_true() -> bool {
    true
}
fn default_locale() -> String {
    "pt-BR".into()
}
fn default_timezone() -> String {
    "America/Sao_Paulo".into()
}
fn default_chromedriver_bin() -> String {
    "chromedriver".into()
}
fn default_webdriver_port() -> u16 {
    9515
}
fn default_global_deadline_secs() -> u64 {
    120
}
fn default_field_timeout_secs() -> u64 {
    5
}
fn default_button_timeout_secs() -> u64 {
    3
}
fn default_action_timeout_secs() -> u64 {
    8
}
fn default_frame_attempts() -> u32 {
    20
}
fn default_frame_interval_ms() -> u64 {
    1000
}
fn default_confirm_timeout_secs() -> u64 {
    8
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_settle_ms() -> u64 {
    1500
}
fn default_screenshot_path() -> PathBuf {
    PathBuf::from("evidence/last-run.png")
}
fn default_html_path() -> PathBuf {
    PathBuf::from("evidence/last-run.html")
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut current = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&current) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => current.clone(),
                    };
                    if expanded == current {
                        break;
                    }
                    current = expanded;
                }
                *s = current;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(expand_env_in_value),
        Value::Object(fields) => fields.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct CheckinConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for CheckinConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckinConfigLoader {
    /// Start empty; files are opt-in and the `PONTO_` env overlay is always
    /// merged last so environment variables win over file values.
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a configuration file that must exist.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a configuration file that may be absent, so headless
    /// deployments can rely purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet (tests, CLI overrides).
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder, expand `${VAR}` placeholders, and deserialize the
    /// merged sources into the typed configuration.
    pub fn load(self) -> Result<CheckinConfig, ConfigError> {
        let merged = self
            .builder
            .add_source(
                Environment::with_prefix("PONTO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut value: Value = merged.try_deserialize()?;
        expand_env_in_value(&mut value);

        let typed: CheckinConfig =
            serde_json::from_value(value).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
