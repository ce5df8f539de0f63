use std::sync::Arc;

use tokio::sync::watch;

use crate::{gate::AuthStatus, models::SessionUser};

/// SessionSnapshot
///
/// What a session provider currently knows: whether a lookup is in flight, and the
/// user from the last completed lookup (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub pending: bool,
    pub user: Option<SessionUser>,
}

impl SessionSnapshot {
    pub fn pending() -> Self {
        Self {
            pending: true,
            user: None,
        }
    }

    pub fn resolved(user: Option<SessionUser>) -> Self {
        Self {
            pending: false,
            user,
        }
    }

    /// auth_status
    ///
    /// A pending snapshot is `Unknown` even when it still carries the user from a
    /// previous lookup: protected content is never shown on a stale session.
    pub fn auth_status(&self) -> AuthStatus {
        match (self.pending, &self.user) {
            (true, _) => AuthStatus::Unknown,
            (false, Some(_)) => AuthStatus::Authenticated,
            (false, None) => AuthStatus::Unauthenticated,
        }
    }
}

/// SessionProvider
///
/// The authoritative source of "is there a signed-in user right now". The gate only
/// reads from it; it never stores or guesses session state on its own.
pub trait SessionProvider: Send + Sync {
    fn current(&self) -> SessionSnapshot;

    /// Receiver that is notified on every published snapshot.
    fn subscribe(&self) -> watch::Receiver<SessionSnapshot>;
}

impl<T: SessionProvider + ?Sized> SessionProvider for Arc<T> {
    fn current(&self) -> SessionSnapshot {
        (**self).current()
    }

    fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        (**self).subscribe()
    }
}

/// WatchSessionProvider
///
/// Session provider backed by a `tokio::sync::watch` channel. Starts pending, as the
/// first lookup has not completed yet.
#[derive(Debug)]
pub struct WatchSessionProvider {
    tx: watch::Sender<SessionSnapshot>,
}

impl Default for WatchSessionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchSessionProvider {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::pending());
        Self { tx }
    }

    /// Marks a lookup as in flight. The cached user is kept so the host can still
    /// show who was signed in, but the status becomes `Unknown`.
    pub fn begin_revalidation(&self) {
        self.tx.send_modify(|snapshot| snapshot.pending = true);
    }

    /// Publishes the result of a completed lookup.
    pub fn resolve(&self, user: Option<SessionUser>) {
        self.tx.send_replace(SessionSnapshot::resolved(user));
    }
}

impl SessionProvider for WatchSessionProvider {
    fn current(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }
}
