use std::env;

use crate::error::ConfigError;

/// Cookie that carries the signed access token issued by the auth service.
pub const DEFAULT_COOKIE_NAME: &str = "accessToken";

/// AppConfig
///
/// Holds the gateway's entire configuration state. Loaded once at startup and
/// immutable afterwards; it is pulled into request handling via FromRef as part
/// of the Unified State Pattern.
#[derive(Clone)]
pub struct AppConfig {
    // Runtime environment marker. Selects the log format and upstream defaults.
    pub env: Env,
    // Symmetric HS256 secret used to verify every access token.
    pub jwt_secret: String,
    // Name of the cookie holding the access token.
    pub cookie_name: String,
    // Domain attribute the auth service sets on that cookie, if any. Clearing
    // the cookie only works when the same domain is sent back.
    pub cookie_domain: Option<String>,
    // Base URL of the UI rendering service that allowed requests are forwarded to.
    pub upstream_url: String,
    // Socket address the HTTP listener binds to.
    pub bind_addr: String,
}

/// Env
///
/// Defines the runtime context: pretty logs and local defaults vs. JSON logs
/// and mandatory infrastructure settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test state scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_domain: None,
            upstream_url: "http://localhost:3001".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// try_load
    ///
    /// Reads every parameter from the environment. The access token secret is
    /// required in every environment: without it no credential can be verified,
    /// so there is no meaningful way to serve a gated request.
    pub fn try_load() -> Result<Self, ConfigError> {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = env::var("ACCESS_TOKEN_SECRET")
            .ok()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or(ConfigError::MissingSecretConfiguration)?;

        let cookie_name = env::var("ACCESS_TOKEN_COOKIE")
            .ok()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());

        let cookie_domain = env::var("ACCESS_TOKEN_COOKIE_DOMAIN")
            .ok()
            .filter(|domain| !domain.trim().is_empty());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let upstream_url = match env {
            Env::Production => {
                env::var("UPSTREAM_URL").map_err(|_| ConfigError::MissingVariable("UPSTREAM_URL"))?
            }
            Env::Local => {
                env::var("UPSTREAM_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
            }
        };

        Ok(Self {
            env,
            jwt_secret,
            cookie_name,
            cookie_domain,
            upstream_url,
            bind_addr,
        })
    }

    /// load
    ///
    /// Fail-fast wrapper around [`AppConfig::try_load`].
    ///
    /// # Panics
    /// Panics if a required variable is missing, so the gateway never starts
    /// with an incomplete or insecure configuration.
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(config) => config,
            Err(err) => panic!("FATAL: {err}"),
        }
    }
}
