#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use route_gate::{
    AppConfig, AppState,
    auth::Claims,
    models::{ResolvedSession, SessionUser},
    repository::SessionRepository,
};
use std::{collections::HashMap, sync::Arc};

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
pub const ALICE_TOKEN: &str = "tok_alice";
pub const STALE_TOKEN: &str = "tok_stale";

// --- Mock Session Store ---

/// In-memory stand-in for the auth provider's session tables.
#[derive(Default)]
pub struct MockSessionRepo {
    pub sessions: HashMap<String, ResolvedSession>,
    pub users: HashMap<String, SessionUser>,
    /// When true, every lookup fails like a dropped database connection.
    pub fail: bool,
}

#[async_trait]
impl SessionRepository for MockSessionRepo {
    async fn find_session(&self, token: &str) -> Result<Option<ResolvedSession>, sqlx::Error> {
        if self.fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self
            .sessions
            .get(token)
            .filter(|s| s.expires_at > Utc::now())
            .cloned())
    }

    async fn get_user(&self, id: &str) -> Result<Option<SessionUser>, sqlx::Error> {
        if self.fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.users.get(id).cloned())
    }
}

pub fn alice() -> SessionUser {
    SessionUser {
        id: "usr_alice".to_string(),
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        image: None,
    }
}

/// Store holding Alice with one live session and one expired session.
pub fn seeded_repo() -> MockSessionRepo {
    let mut repo = MockSessionRepo::default();
    repo.users.insert(alice().id, alice());
    repo.sessions.insert(
        ALICE_TOKEN.to_string(),
        ResolvedSession {
            user: alice(),
            expires_at: Utc::now() + TimeDelta::hours(1),
        },
    );
    repo.sessions.insert(
        STALE_TOKEN.to_string(),
        ResolvedSession {
            user: alice(),
            expires_at: Utc::now() - TimeDelta::hours(1),
        },
    );
    repo
}

pub fn app_state(repo: MockSessionRepo, config: AppConfig) -> AppState {
    AppState {
        repo: Arc::new(repo),
        config: AppConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            ..config
        },
    }
}

pub fn session_cookie(token: &str) -> String {
    format!("better-auth.session_token={}.signature", token)
}

/// Signs a bearer token for `sub`; a negative offset yields an expired token.
pub fn create_token(sub: &str, exp_offset_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        iat: now as usize,
        exp: (now + exp_offset_secs) as usize,
    };
    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}
