use std::sync::Arc;

use crate::{
    auth::{Claims, CredentialVerifier, Role},
    error::AccessError,
    routes::table::{CALLBACK_PARAM, ORDINARY_HOME, RouteClass, SIGN_IN_ROUTE, classify},
};

/// Shared handle to the gate, pulled out of `AppState` via FromRef.
pub type GateState = Arc<AccessGate>;

/// GateDecision
///
/// What should happen to a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    RedirectTo(String),
}

/// GateOutcome
///
/// The decision plus everything the caller needs to act on it.
#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub decision: GateDecision,
    /// The stored credential is unusable and must be deleted from the client.
    pub clear_credential: bool,
    /// Why the request was redirected, or why a presented credential was ignored.
    pub reason: Option<AccessError>,
    /// Verified claims, when the credential passed verification.
    pub claims: Option<Claims>,
}

impl GateOutcome {
    fn allow() -> Self {
        Self {
            decision: GateDecision::Allow,
            clear_credential: false,
            reason: None,
            claims: None,
        }
    }

    fn redirect(location: impl Into<String>) -> Self {
        Self {
            decision: GateDecision::RedirectTo(location.into()),
            ..Self::allow()
        }
    }

    fn because(mut self, reason: AccessError) -> Self {
        self.reason = Some(reason);
        self
    }

    fn with_claims(mut self, claims: Claims) -> Self {
        self.claims = Some(claims);
        self
    }
}

/// AccessGate
///
/// Request-time authorization: classifies the target path, verifies the
/// credential and decides between letting the request through and sending the
/// user somewhere sensible. Holds only immutable state, so one instance is
/// shared by every concurrent request.
pub struct AccessGate {
    verifier: CredentialVerifier,
}

impl AccessGate {
    pub fn new(verifier: CredentialVerifier) -> Self {
        Self { verifier }
    }

    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    /// Evaluates one navigation to `path` with an optional raw credential.
    pub fn evaluate(&self, path: &str, credential: Option<&str>) -> GateOutcome {
        let class = classify(path);

        if !class.is_protected() {
            return self.evaluate_public(path, credential);
        }

        let Some(token) = credential else {
            return GateOutcome::redirect(sign_in_location(path))
                .because(AccessError::CredentialAbsent);
        };

        let claims = match self.verifier.verify(token) {
            Ok(claims) => claims,
            Err(reason) => {
                tracing::info!(path, %reason, "clearing unusable credential on protected route");
                let mut outcome =
                    GateOutcome::redirect(sign_in_location(path)).because(reason.into());
                outcome.clear_credential = true;
                return outcome;
            }
        };

        let role = claims.role();
        let root_denied = path == "/" && role != Role::Privileged;
        if (class == RouteClass::Privileged && role != Role::Privileged) || root_denied {
            tracing::debug!(
                path,
                user_type = claims.user_type.as_str(),
                "role not authorized for route"
            );
            return GateOutcome::redirect(ORDINARY_HOME)
                .because(AccessError::RoleNotAuthorizedForRoute)
                .with_claims(claims);
        }

        GateOutcome::allow().with_claims(claims)
    }

    fn evaluate_public(&self, path: &str, credential: Option<&str>) -> GateOutcome {
        let Some(token) = credential else {
            return GateOutcome::allow();
        };

        match self.verifier.verify(token) {
            // A stale token on an auth page is harmless: treat the visitor as
            // anonymous and leave the cookie alone.
            Err(reason) => {
                tracing::debug!(path, %reason, "ignoring invalid credential on public route");
                GateOutcome::allow().because(reason.into())
            }
            Ok(claims) => {
                let home = claims.role().home();
                let outcome = if path == home {
                    GateOutcome::allow()
                } else {
                    GateOutcome::redirect(home)
                };
                outcome.with_claims(claims)
            }
        }
    }
}

/// `/sign-in?callbackUrl=<path>`, with the path form-urlencoded.
pub fn sign_in_location(path: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(CALLBACK_PARAM, path)
        .finish();
    format!("{SIGN_IN_ROUTE}?{query}")
}
