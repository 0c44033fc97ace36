use thiserror::Error;

/// ConfigError
///
/// Raised while loading `AppConfig` at startup. Every variant is fatal: the
/// process must not begin serving requests with an incomplete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("ACCESS_TOKEN_SECRET must be set to a non-empty value")]
    MissingSecretConfiguration,

    #[error("{0} must be set in production")]
    MissingVariable(&'static str),
}

/// VerifyError
///
/// The reason a raw credential failed verification. The gate treats all of
/// these the same way, but they stay distinct so they can be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("credential is malformed")]
    Malformed,

    #[error("credential has expired")]
    Expired,

    #[error("credential signature is invalid")]
    BadSignature,

    #[error("credential audience does not match")]
    WrongAudience,
}

/// AccessError
///
/// Observable reasons behind a gate decision. None of these reach the user as
/// an error page; each one resolves to a redirect (or an anonymous `Allow` on
/// public routes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("no credential was presented")]
    CredentialAbsent,

    #[error("credential is malformed")]
    CredentialMalformed,

    #[error("credential has expired")]
    CredentialExpired,

    #[error("credential signature is invalid")]
    CredentialSignatureInvalid,

    #[error("credential audience does not match")]
    CredentialAudienceMismatch,

    #[error("role is not authorized for this route")]
    RoleNotAuthorizedForRoute,
}

impl From<VerifyError> for AccessError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Malformed => AccessError::CredentialMalformed,
            VerifyError::Expired => AccessError::CredentialExpired,
            VerifyError::BadSignature => AccessError::CredentialSignatureInvalid,
            VerifyError::WrongAudience => AccessError::CredentialAudienceMismatch,
        }
    }
}
