use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::auth::{Role, Session, UserType};

/// SessionResponse
///
/// The decoded identity behind the caller's access token, returned by
/// `GET /api/session`. The UI uses it to pick navigation and greet the user
/// without decoding the token client-side.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionResponse {
    pub user_id: String,
    pub session_id: String,
    pub user_type: UserType,
    // Binary split derived from user_type.
    pub role: Role,
    // Where this user lands after sign-in.
    pub home: String,
    #[ts(type = "string | null")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        let role = session.user_type.role();
        Self {
            user_id: session.user_id,
            session_id: session.session_id,
            user_type: session.user_type,
            role,
            home: role.home().to_string(),
            expires_at: i64::try_from(session.exp)
                .ok()
                .and_then(|exp| DateTime::from_timestamp(exp, 0)),
        }
    }
}
