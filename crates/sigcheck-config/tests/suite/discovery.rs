use std::ffi::OsString;
use std::sync::Mutex;

use sigcheck_config::{
    discover_config_path, load_for_workspace, FailOn, SigcheckConfig, SIGCHECK_CONFIG_ENV_VAR,
};
use tempfile::tempdir;

static ENV_LOCK: Mutex<()> = Mutex::new(());

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: impl Into<OsString>) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value.into());
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn discovers_sigcheck_toml_in_workspace_root() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(SIGCHECK_CONFIG_ENV_VAR);

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("sigcheck.toml");
    std::fs::write(&config_path, "[detection]\nfail_on = \"warning\"\n").unwrap();

    let discovered = discover_config_path(dir.path()).expect("sigcheck.toml should be found");
    assert_eq!(
        discovered,
        config_path.canonicalize().unwrap_or(config_path)
    );
}

#[test]
fn plain_name_wins_over_dotfile() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(SIGCHECK_CONFIG_ENV_VAR);

    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(".sigcheck.toml"), "").unwrap();
    let discovered = discover_config_path(dir.path()).unwrap();
    assert!(discovered.ends_with(".sigcheck.toml"));

    std::fs::write(dir.path().join("sigcheck.toml"), "").unwrap();
    let discovered = discover_config_path(dir.path()).unwrap();
    assert!(discovered.ends_with("sigcheck.toml"));
    assert!(!discovered.ends_with(".sigcheck.toml"));
}

#[test]
fn env_override_wins_over_workspace_file() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");

    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("sigcheck.toml"),
        "[detection]\nfail_on = \"error\"\n",
    )
    .unwrap();
    let override_path = dir.path().join("override.toml");
    std::fs::write(&override_path, "[detection]\nfail_on = \"warning\"\n").unwrap();

    let _env = EnvVarGuard::set(SIGCHECK_CONFIG_ENV_VAR, "override.toml");

    let (config, path) = load_for_workspace(dir.path()).unwrap();
    assert_eq!(config.detection.fail_on, FailOn::Warning);
    assert_eq!(
        path.expect("resolved config path"),
        override_path.canonicalize().unwrap_or(override_path)
    );
}

#[test]
fn env_override_accepts_absolute_path() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");

    let workspace = tempdir().unwrap();
    let elsewhere = tempdir().unwrap();
    let override_path = elsewhere.path().join("ci.toml");
    std::fs::write(&override_path, "[logging]\nlevel = \"debug\"\n").unwrap();

    let _env = EnvVarGuard::set(SIGCHECK_CONFIG_ENV_VAR, override_path.as_os_str());

    let (config, path) = load_for_workspace(workspace.path()).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert!(path.is_some());
}

#[test]
fn missing_config_returns_defaults() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(SIGCHECK_CONFIG_ENV_VAR);

    let dir = tempdir().unwrap();
    let (config, path) = load_for_workspace(dir.path()).unwrap();
    assert_eq!(path, None);
    assert_eq!(config, SigcheckConfig::default());
}

#[test]
fn missing_override_file_is_an_io_error() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");

    let dir = tempdir().unwrap();
    let _env = EnvVarGuard::set(SIGCHECK_CONFIG_ENV_VAR, "does-not-exist.toml");

    let err = load_for_workspace(dir.path()).unwrap_err();
    assert!(
        err.to_string().starts_with("failed to read config file"),
        "unexpected error: {err}"
    );
}
