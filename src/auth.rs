use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    config::AppConfig,
    error::VerifyError,
    gate::GateState,
    routes::table::{ORDINARY_HOME, PRIVILEGED_HOME},
};

/// Audience every access token must be issued for.
pub const TOKEN_AUDIENCE: &str = "user";

/// UserType
///
/// The fine-grained account type carried in the `userType` claim. Display and
/// per-screen authorization elsewhere in the system work with this; the access
/// gate only cares about the [`Role`] it reduces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum UserType {
    /// Health assistant: infirmary operational staff.
    #[serde(rename = "HA")]
    HealthAssistant,
    Student,
    Faculty,
    Staff,
    Guest,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::HealthAssistant => "HA",
            UserType::Student => "STUDENT",
            UserType::Faculty => "FACULTY",
            UserType::Staff => "STAFF",
            UserType::Guest => "GUEST",
        }
    }

    pub fn role(self) -> Role {
        match self {
            UserType::HealthAssistant => Role::Privileged,
            _ => Role::Ordinary,
        }
    }
}

/// Role
///
/// Binary split used by the access gate: privileged infirmary staff vs.
/// everyone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Privileged,
    Ordinary,
}

impl Role {
    /// The landing route for an authenticated user holding this role.
    pub fn home(self) -> &'static str {
        match self {
            Role::Privileged => PRIVILEGED_HOME,
            Role::Ordinary => ORDINARY_HOME,
        }
    }
}

/// Claims
///
/// Payload of the access token issued by the external auth service at login.
/// Signed with HS256 and validated (signature, audience, expiry) on every
/// gated request; never cached between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub session_id: String,
    pub user_type: UserType,
    /// Audience (aud): always `"user"` for tokens this gateway accepts.
    /// Defaulted: a token without `aud` is an audience failure, not a
    /// malformed payload.
    #[serde(default)]
    pub aud: String,
    /// Expiration Time (exp): seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<usize>,
}

impl Claims {
    pub fn role(&self) -> Role {
        self.user_type.role()
    }
}

/// CredentialVerifier
///
/// Owns the decoding key and validation rules, built once from the configured
/// secret and shared read-only by every concurrent evaluation.
#[derive(Clone)]
pub struct CredentialVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl CredentialVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "aud"]);
        validation.validate_exp = true;
        // Expiry is a server-set deadline; no grace window.
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verifies the raw token and returns its claims, or the specific reason it
    /// was rejected.
    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => VerifyError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    VerifyError::BadSignature
                }
                ErrorKind::InvalidAudience => VerifyError::WrongAudience,
                ErrorKind::MissingRequiredClaim(claim) if claim == "aud" => {
                    VerifyError::WrongAudience
                }
                // Bad base64, bad JSON, unknown userType, missing exp, ...
                _ => VerifyError::Malformed,
            })
    }
}

/// Extracts the named cookie's value from the request headers.
///
/// Browsers may split cookies over several `Cookie` headers; all of them are
/// searched. An empty value counts as no credential at all.
pub fn credential_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Session
///
/// The verified identity behind a request. Used by the local API, which sits
/// outside the gate and therefore verifies the cookie itself.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub session_id: String,
    pub user_type: UserType,
    pub exp: usize,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            session_id: claims.session_id,
            user_type: claims.user_type,
            exp: claims.exp,
        }
    }
}

/// Session Extractor
///
/// Reads the access token cookie and verifies it with the gate's verifier.
/// Rejects with 401 on a missing or invalid credential; the specific reason is
/// logged but never returned to the client.
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    GateState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = GateState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = credential_from_headers(&parts.headers, &config.cookie_name)
            .ok_or(StatusCode::UNAUTHORIZED)?;

        match gate.verifier().verify(&token) {
            Ok(claims) => Ok(Session::from(claims)),
            Err(reason) => {
                tracing::debug!(%reason, "session lookup rejected credential");
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}
