use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use crate::{
    gate::{AuthStatus, Decision},
    route::RouteGroup,
};

// --- Session Schemas (Mapped to the auth provider's tables) ---

/// SessionUser
///
/// The user record behind a session, read from the auth provider's `"user"` table.
/// The id is the provider's opaque text id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    // Avatar URL, if the provider has one.
    pub image: Option<String>,
}

/// ResolvedSession
///
/// A session the server has verified against the store (cookie) or the signing secret
/// (bearer token). This is also the body of `GET /api/auth/get-session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ResolvedSession {
    pub user: SessionUser,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
}

/// SessionReply
///
/// The part of a `get-session` reply the client relies on. The auth provider answers
/// `{ "session": { ..., "expiresAt": ... }, "user": { ... } }` while this server answers
/// with a `ResolvedSession`; both carry `user`, and every other field is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionReply {
    pub user: SessionUser,
}

/// SessionRow
///
/// Joined `"session"` + `"user"` row used internally by the repository.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl From<SessionRow> for ResolvedSession {
    fn from(row: SessionRow) -> Self {
        Self {
            user: SessionUser {
                id: row.id,
                name: row.name,
                email: row.email,
                image: row.image,
            },
            expires_at: row.expires_at,
        }
    }
}

// --- Gate Schemas ---

/// GateQuery
///
/// Query parameters for `GET /api/gate`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct GateQuery {
    /// The route the client is about to show, e.g. `/(protected)/todos`.
    #[param(example = "/(protected)")]
    pub path: String,
}

/// GateResponse
///
/// The gate's verdict for the caller's session on the requested route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct GateResponse {
    pub auth_status: AuthStatus,
    pub route_group: RouteGroup,
    pub decision: Decision,
    /// Where to `replace()` to, present only for redirect decisions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}
