use infirmary_gateway::{
    AppConfig,
    config::{DEFAULT_COOKIE_NAME, Env},
    error::ConfigError,
};
use serial_test::serial;
use std::{env, panic};

const VARS: [&str; 6] = [
    "APP_ENV",
    "ACCESS_TOKEN_SECRET",
    "ACCESS_TOKEN_COOKIE",
    "ACCESS_TOKEN_COOKIE_DOMAIN",
    "UPSTREAM_URL",
    "BIND_ADDR",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with exactly the given variables set (all others in `VARS`
/// cleared), then restores the original environment.
fn run_with_env<T, R>(vars: &[(&str, &str)], test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> =
        VARS.iter().map(|&var| (var, env::var(var).ok())).collect();

    unsafe {
        for var in VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_missing_secret_is_a_configuration_error() {
    let result = run_with_env(&[("APP_ENV", "local")], AppConfig::try_load);
    assert_eq!(result.err(), Some(ConfigError::MissingSecretConfiguration));
}

#[test]
#[serial]
fn test_blank_secret_counts_as_missing() {
    let result = run_with_env(&[("ACCESS_TOKEN_SECRET", "   ")], AppConfig::try_load);
    assert_eq!(result.err(), Some(ConfigError::MissingSecretConfiguration));
}

#[test]
#[serial]
fn test_load_panics_without_secret() {
    let result = run_with_env(&[("APP_ENV", "production")], || {
        panic::catch_unwind(AppConfig::load)
    });
    assert!(
        result.is_err(),
        "Config loading should panic on a missing secret"
    );
}

#[test]
#[serial]
fn test_local_env_defaults() {
    let config = run_with_env(&[("ACCESS_TOKEN_SECRET", "s3cr3t")], AppConfig::try_load).unwrap();

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.jwt_secret, "s3cr3t");
    assert_eq!(config.cookie_name, DEFAULT_COOKIE_NAME);
    assert_eq!(config.cookie_domain, None);
    assert_eq!(config.upstream_url, "http://localhost:3001");
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
}

#[test]
#[serial]
fn test_production_requires_upstream() {
    let result = run_with_env(
        &[("APP_ENV", "production"), ("ACCESS_TOKEN_SECRET", "s3cr3t")],
        AppConfig::try_load,
    );
    assert_eq!(result.err(), Some(ConfigError::MissingVariable("UPSTREAM_URL")));
}

#[test]
#[serial]
fn test_production_overrides() {
    let config = run_with_env(
        &[
            ("APP_ENV", "production"),
            ("ACCESS_TOKEN_SECRET", "s3cr3t"),
            ("ACCESS_TOKEN_COOKIE", "infirmaryToken"),
            ("ACCESS_TOKEN_COOKIE_DOMAIN", ".infirmary.example.edu"),
            ("UPSTREAM_URL", "http://ui:3001"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ],
        AppConfig::try_load,
    )
    .unwrap();

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.cookie_name, "infirmaryToken");
    assert_eq!(config.cookie_domain.as_deref(), Some(".infirmary.example.edu"));
    assert_eq!(config.upstream_url, "http://ui:3001");
    assert_eq!(config.bind_addr, "127.0.0.1:8080");
}

#[test]
#[serial]
fn test_blank_cookie_domain_counts_as_unset() {
    let config = run_with_env(
        &[("ACCESS_TOKEN_SECRET", "s3cr3t"), ("ACCESS_TOKEN_COOKIE_DOMAIN", " ")],
        AppConfig::try_load,
    )
    .unwrap();
    assert_eq!(config.cookie_domain, None);
}
