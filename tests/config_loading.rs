//! Configuration loading from files and the environment.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rstest::rstest;
use tasktrack::config::{AppConfig, CONFIG_PATH_VAR, LogFormat};
use tasktrack::notification::services::FailurePolicy;
use uuid::Uuid;

/// Every variable these tests read. Each test starts with all of them unset.
const MANAGED_VARS: [&str; 5] = [
    CONFIG_PATH_VAR,
    "TASKTRACK__BROKER__PREFETCH",
    "TASKTRACK__NOTIFICATIONS__NOTIFY_ON_COMMENT",
    "TASKTRACK__NOTIFICATIONS__FAILURE_POLICY",
    "TASKTRACK__LOGGING__FORMAT",
];

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Holds the process environment for one test and puts it back on drop.
struct ConfigEnv {
    saved: Vec<(&'static str, Option<OsString>)>,
    _serial: MutexGuard<'static, ()>,
}

impl ConfigEnv {
    fn with(overrides: &[(&str, &str)]) -> Self {
        let serial = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let saved = MANAGED_VARS
            .iter()
            .map(|key| (*key, env::var_os(key)))
            .collect();
        for key in MANAGED_VARS {
            // SAFETY: ENV_LOCK serialises every environment change in this binary.
            unsafe { env::remove_var(key) };
        }
        for (key, value) in overrides {
            assert!(
                MANAGED_VARS.iter().any(|managed| managed == key),
                "{key} is not a managed variable"
            );
            // SAFETY: as above.
            unsafe { env::set_var(key, value) };
        }
        Self {
            saved,
            _serial: serial,
        }
    }
}

impl Drop for ConfigEnv {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..) {
            // SAFETY: the lock is still held until this guard is gone.
            unsafe {
                match value {
                    Some(original) => env::set_var(key, original),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

struct TempConfig(PathBuf);

impl TempConfig {
    fn write(contents: &str) -> Self {
        let path = std::env::temp_dir().join(format!("tasktrack-{}.toml", Uuid::new_v4()));
        std::fs::write(&path, contents).expect("temporary config should be writable");
        Self(path)
    }
}

impl Drop for TempConfig {
    fn drop(&mut self) {
        std::fs::remove_file(&self.0).ok();
    }
}

#[rstest]
fn environment_overrides_defaults() {
    let _env = ConfigEnv::with(&[
        ("TASKTRACK__BROKER__PREFETCH", "25"),
        ("TASKTRACK__NOTIFICATIONS__NOTIFY_ON_COMMENT", "true"),
        ("TASKTRACK__NOTIFICATIONS__FAILURE_POLICY", "requeue"),
        ("TASKTRACK__LOGGING__FORMAT", "json"),
    ]);

    let config = AppConfig::load().expect("configuration should load");

    assert_eq!(config.broker.prefetch, 25);
    assert!(config.notifications.notify_on_comment);
    assert_eq!(config.notifications.failure_policy, FailurePolicy::Requeue);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.broker.exchange, "tasks.events");
}

#[rstest]
fn explicit_file_is_layered_under_the_environment() {
    let file = TempConfig::write(
        "[broker]\nprefetch = 4\nexchange = \"staging.events\"\n\n[gateway]\nrequest_timeout_ms = 1500\n",
    );
    let path = file.0.to_string_lossy().into_owned();
    let _env = ConfigEnv::with(&[
        ("TASKTRACK__BROKER__PREFETCH", "8"),
        (CONFIG_PATH_VAR, path.as_str()),
    ]);

    let config = AppConfig::load().expect("configuration should load");

    assert_eq!(config.broker.exchange, "staging.events");
    assert_eq!(config.broker.prefetch, 8);
    assert_eq!(config.gateway.request_timeout().as_millis(), 1500);
}

#[rstest]
fn missing_explicit_file_is_an_error() {
    let _env = ConfigEnv::with(&[(CONFIG_PATH_VAR, "/nonexistent/tasktrack-missing.toml")]);

    assert!(AppConfig::load().is_err());
}

#[rstest]
fn unset_environment_yields_defaults() {
    let _env = ConfigEnv::with(&[]);

    let config = AppConfig::load().expect("configuration should load");

    assert_eq!(config.broker.prefetch, 10);
    assert_eq!(config.notifications.failure_policy, FailurePolicy::Acknowledge);
}
