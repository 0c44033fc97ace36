#![allow(dead_code)]

use infirmary_gateway::{
    AccessGate, AppConfig, AppState, MockUpstream, UpstreamState,
    auth::{Claims, CredentialVerifier, TOKEN_AUDIENCE, UserType},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use std::{sync::Arc, time::SystemTime};

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub fn claims_for(user_type: UserType, exp_offset: i64) -> Claims {
    let now = now();
    Claims {
        user_id: "64f1c0ffee0000000000abcd".to_string(),
        session_id: "sess-42".to_string(),
        user_type,
        aud: TOKEN_AUDIENCE.to_string(),
        exp: (now as i64 + exp_offset) as usize,
        iat: Some(now as usize),
    }
}

pub fn sign(claims: &Claims, secret: &str) -> String {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &key).unwrap()
}

/// A token valid for the next hour.
pub fn token(user_type: UserType) -> String {
    sign(&claims_for(user_type, 3600), TEST_JWT_SECRET)
}

pub fn expired_token(user_type: UserType) -> String {
    sign(&claims_for(user_type, -3600), TEST_JWT_SECRET)
}

pub fn gate() -> AccessGate {
    AccessGate::new(CredentialVerifier::new(TEST_JWT_SECRET))
}

pub fn test_state(upstream: Arc<MockUpstream>) -> AppState {
    let config = AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };
    AppState::new(config, upstream as UpstreamState)
}
