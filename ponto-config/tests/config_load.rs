use ponto_config::CheckinConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn defaults_cover_everything_but_credentials() {
    let config = CheckinConfigLoader::new().load().expect("load defaults");

    assert!(config.credentials.validate().is_err());
    assert!(config.targets.login_url.contains("login"));
    assert!(!config.targets.frame_fragments.is_empty());
    assert_eq!(config.timing.frame_attempts, 20);
    assert_eq!(config.timing.global_deadline_secs, 120);
    assert!(config.browser.headless);
    assert_eq!(config.browser.locale, "pt-BR");
    assert_eq!(
        config.evidence.screenshot_path,
        PathBuf::from("evidence/last-run.png")
    );
}

#[test]
#[serial]
fn file_values_override_defaults() {
    let tmp = TempDir::new().unwrap();
    let file_yaml = r#"
credentials:
  user: "someone"
  password: "${PONTO_TEST_SECRET}"
targets:
  post_login_fragment: "dashboard"
timing:
  frame_attempts: 5
  frame_interval_ms: 100
browser:
  headless: false
"#;
    let path = write_yaml(&tmp, "ponto.yaml", file_yaml);

    temp_env::with_var("PONTO_TEST_SECRET", Some("s3cr3t"), || {
        let config = CheckinConfigLoader::new()
            .with_file(&path)
            .load()
            .expect("load yaml config");

        assert!(config.credentials.validate().is_ok());
        assert_eq!(config.credentials.password, "s3cr3t");
        assert_eq!(config.targets.post_login_fragment, "dashboard");
        assert_eq!(config.timing.frame_attempts, 5);
        assert_eq!(config.timing.frame_interval_ms, 100);
        assert!(!config.browser.headless);
        // untouched sections keep their defaults
        assert_eq!(config.timing.poll_interval_ms, 500);
    });
}

#[test]
#[serial]
fn environment_overlays_win_over_files() {
    let tmp = TempDir::new().unwrap();
    let path = write_yaml(
        &tmp,
        "ponto.yaml",
        "credentials:\n  user: from-file\n  password: from-file\n",
    );

    temp_env::with_vars(
        [
            ("PONTO_CREDENTIALS__USER", Some("from-env")),
            ("PONTO_TIMING__CONFIRM_TIMEOUT_SECS", Some("2")),
        ],
        || {
            let config = CheckinConfigLoader::new()
                .with_file(&path)
                .load()
                .expect("load with env overlay");

            assert_eq!(config.credentials.user, "from-env");
            assert_eq!(config.credentials.password, "from-file");
            assert_eq!(config.timing.confirm_timeout_secs, 2);
        },
    );
}

#[test]
#[serial]
fn optional_file_may_be_absent() {
    let config = CheckinConfigLoader::new()
        .with_optional_file("does-not-exist.yaml")
        .load()
        .expect("absent optional file is fine");
    assert_eq!(config.browser.webdriver_port, 9515);
}

#[test]
#[serial]
fn required_file_must_exist() {
    let result = CheckinConfigLoader::new()
        .with_file("does-not-exist.yaml")
        .load();
    assert!(result.is_err());
}

#[test]
#[serial]
fn inline_yaml_snippets_merge() {
    let config = CheckinConfigLoader::new()
        .with_yaml_str(
            r#"
locators:
  action_labels: ["Bater Ponto"]
  action_id_prefix: "clock-btn-"
"#,
        )
        .load()
        .expect("inline yaml");

    assert_eq!(config.locators.action_labels, vec!["Bater Ponto"]);
    assert_eq!(config.locators.action_id_prefix, "clock-btn-");
    // sibling fields in the same section keep defaults
    assert_eq!(config.locators.action_selector, "button");
}
