use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    error::GateError,
    navigator::Navigator,
    route::{RouteGroup, RouteMap},
    session::SessionProvider,
};

/// AuthStatus
///
/// `Unknown` only while the session provider has not answered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum AuthStatus {
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// NavigationState
///
/// The two signals the gate looks at. Derived on every evaluation, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NavigationState {
    pub auth_status: AuthStatus,
    pub route_group: RouteGroup,
}

/// Decision
///
/// `Pending` means "no decision": the host shows its loading state and waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum Decision {
    Pending,
    Allow,
    RedirectToPublic,
    RedirectToProtected,
}

impl Decision {
    /// The root a redirect decision lands on; `None` for `Pending` and `Allow`.
    pub fn target<'a>(&self, routes: &'a RouteMap) -> Option<&'a str> {
        match self {
            Decision::RedirectToPublic => Some(routes.public_root()),
            Decision::RedirectToProtected => Some(routes.protected_root()),
            Decision::Pending | Decision::Allow => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Decision::RedirectToPublic | Decision::RedirectToProtected)
    }
}

/// decide
///
/// The gate's decision function. Pure and total.
pub fn decide(state: NavigationState) -> Decision {
    match (state.auth_status, state.route_group) {
        (AuthStatus::Unknown, _) => Decision::Pending,
        (AuthStatus::Unauthenticated, RouteGroup::Protected) => Decision::RedirectToPublic,
        (AuthStatus::Authenticated, RouteGroup::Public) => Decision::RedirectToProtected,
        _ => Decision::Allow,
    }
}

/// decide_path
///
/// `decide` for a raw path. Paths the route map does not gate are allowed once the
/// session is known; while it is unknown nothing is decided for any path.
pub fn decide_path(
    auth_status: AuthStatus,
    path: &str,
    routes: &RouteMap,
) -> (Option<RouteGroup>, Decision) {
    let group = routes.group_of(path);
    let decision = match (auth_status, group) {
        (AuthStatus::Unknown, _) => Decision::Pending,
        (_, None) => Decision::Allow,
        (auth_status, Some(route_group)) => decide(NavigationState {
            auth_status,
            route_group,
        }),
    };
    (group, decision)
}

/// Evaluation
///
/// Result of one `AccessGate::evaluate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: Decision,
    /// Set only when this evaluation actually called `replace`.
    pub redirected_to: Option<String>,
}

/// AccessGate
///
/// Binds the decision function to a live session provider and router. Each call to
/// `evaluate` issues at most one `replace`, and a given (status, path) transition is
/// redirected only once.
pub struct AccessGate<P, N> {
    provider: P,
    navigator: N,
    routes: RouteMap,
    last_redirect: Option<(AuthStatus, String)>,
}

impl<P: SessionProvider, N: Navigator> AccessGate<P, N> {
    pub fn new(provider: P, navigator: N, routes: RouteMap) -> Self {
        Self {
            provider,
            navigator,
            routes,
            last_redirect: None,
        }
    }

    pub fn routes(&self) -> &RouteMap {
        &self.routes
    }

    /// evaluate
    ///
    /// Reads both signals, decides, and performs the redirect if one is due.
    ///
    /// # Errors
    /// Returns `GateError::Navigation` if the router refuses the redirect target. The
    /// same transition is not attempted again.
    pub fn evaluate(&mut self) -> Result<Evaluation, GateError> {
        let auth_status = self.provider.current().auth_status();
        let path = self.navigator.current_path();
        let (_, decision) = decide_path(auth_status, &path, &self.routes);

        let Some(target) = decision.target(&self.routes) else {
            self.last_redirect = None;
            return Ok(Evaluation {
                decision,
                redirected_to: None,
            });
        };

        let transition = (auth_status, path);
        if self.last_redirect.as_ref() == Some(&transition) {
            return Ok(Evaluation {
                decision,
                redirected_to: None,
            });
        }

        tracing::debug!(
            from = %transition.1,
            to = %target,
            ?decision,
            "access gate redirect"
        );
        self.last_redirect = Some(transition);
        self.navigator.replace(target).map_err(|e| {
            tracing::error!(error = %e, "access gate redirect rejected by router");
            e
        })?;

        // Only a router that did not move is still on a path we already redirected
        // away from. Anything that later lands on a protected path again is a new
        // transition and must be redirected again.
        self.last_redirect = Some((auth_status, self.navigator.current_path()));

        Ok(Evaluation {
            decision,
            redirected_to: Some(target.to_string()),
        })
    }

    /// run
    ///
    /// Re-evaluates on every change of the session provider or the active route until
    /// `shutdown` flips (or either signal source goes away). Dropping the shutdown
    /// sender without sending does not stop the driver.
    pub async fn run(
        mut self,
        mut route_rx: watch::Receiver<String>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(), GateError> {
        let mut session_rx = self.provider.subscribe();
        let mut shutdown_open = true;

        loop {
            session_rx.borrow_and_update();
            route_rx.borrow_and_update();

            let evaluation = self.evaluate()?;
            if evaluation.decision == Decision::Pending {
                tracing::trace!("session unresolved, waiting");
            }

            tokio::select! {
                biased;
                changed = shutdown_rx.changed(), if shutdown_open => {
                    if changed.is_err() {
                        tracing::debug!("access gate: shutdown sender dropped, running until signals close");
                        shutdown_open = false;
                        continue;
                    }
                    tracing::debug!("access gate: shutdown signal, stopping");
                    break;
                }
                changed = session_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = route_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use super::*;
    use crate::{
        error::NavigationError,
        models::SessionUser,
        navigator::MemoryNavigator,
        session::{SessionSnapshot, WatchSessionProvider},
    };

    const ALL_STATUSES: [AuthStatus; 3] = [
        AuthStatus::Unknown,
        AuthStatus::Authenticated,
        AuthStatus::Unauthenticated,
    ];
    const ALL_GROUPS: [RouteGroup; 2] = [RouteGroup::Public, RouteGroup::Protected];

    fn user() -> SessionUser {
        SessionUser {
            id: "usr_1".to_string(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            image: None,
        }
    }

    /// Fixed-answer provider.
    struct FakeProvider(watch::Sender<SessionSnapshot>);

    impl FakeProvider {
        fn new(snapshot: SessionSnapshot) -> Self {
            Self(watch::channel(snapshot).0)
        }
    }

    impl SessionProvider for FakeProvider {
        fn current(&self) -> SessionSnapshot {
            self.0.borrow().clone()
        }
        fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
            self.0.subscribe()
        }
    }

    /// Router that never moves, counting how often it is asked to.
    struct StuckNavigator {
        path: String,
        replaces: AtomicUsize,
    }

    impl Navigator for StuckNavigator {
        fn current_path(&self) -> String {
            self.path.clone()
        }
        fn replace(&self, _path: &str) -> Result<(), NavigationError> {
            self.replaces.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn gate(
        snapshot: SessionSnapshot,
        path: &str,
    ) -> AccessGate<FakeProvider, Arc<MemoryNavigator>> {
        AccessGate::new(
            FakeProvider::new(snapshot),
            Arc::new(MemoryNavigator::new(path)),
            RouteMap::app(),
        )
    }

    #[test]
    fn test_decision_table() {
        for auth_status in ALL_STATUSES {
            for route_group in ALL_GROUPS {
                let decision = decide(NavigationState {
                    auth_status,
                    route_group,
                });
                let expected = match (auth_status, route_group) {
                    (AuthStatus::Unknown, _) => Decision::Pending,
                    (AuthStatus::Unauthenticated, RouteGroup::Protected) => {
                        Decision::RedirectToPublic
                    }
                    (AuthStatus::Authenticated, RouteGroup::Public) => {
                        Decision::RedirectToProtected
                    }
                    _ => Decision::Allow,
                };
                assert_eq!(decision, expected, "{auth_status:?} on {route_group:?}");
            }
        }
    }

    #[test]
    fn test_redirect_target_is_stable() {
        // Whatever a redirect lands on must evaluate to Allow for the same status.
        let routes = RouteMap::app();
        for auth_status in ALL_STATUSES {
            for route_group in ALL_GROUPS {
                let decision = decide(NavigationState {
                    auth_status,
                    route_group,
                });
                if let Some(target) = decision.target(&routes) {
                    let (_, next) = decide_path(auth_status, target, &routes);
                    assert_eq!(next, Decision::Allow);
                }
            }
        }
    }

    #[test]
    fn test_unknown_waits_on_protected_route() {
        let mut gate = gate(SessionSnapshot::pending(), "/(protected)");
        let evaluation = gate.evaluate().unwrap();

        assert_eq!(evaluation.decision, Decision::Pending);
        assert_eq!(evaluation.redirected_to, None);
        assert_eq!(gate.navigator.current_path(), "/(protected)");
    }

    #[test]
    fn test_unauthenticated_on_protected_goes_public() {
        let mut gate = gate(SessionSnapshot::resolved(None), "/(protected)");
        let evaluation = gate.evaluate().unwrap();

        assert_eq!(evaluation.decision, Decision::RedirectToPublic);
        assert_eq!(evaluation.redirected_to.as_deref(), Some("/(public)"));
        assert_eq!(gate.navigator.current_path(), "/(public)");
    }

    #[test]
    fn test_authenticated_on_login_goes_protected() {
        let mut gate = gate(SessionSnapshot::resolved(Some(user())), "/(public)/login");
        let evaluation = gate.evaluate().unwrap();

        assert_eq!(evaluation.decision, Decision::RedirectToProtected);
        assert_eq!(gate.navigator.current_path(), "/(protected)");
    }

    #[test]
    fn test_authenticated_on_protected_is_allowed() {
        let mut gate = gate(SessionSnapshot::resolved(Some(user())), "/(protected)");
        let evaluation = gate.evaluate().unwrap();

        assert_eq!(evaluation.decision, Decision::Allow);
        assert_eq!(gate.navigator.history(), vec!["/(protected)"]);
    }

    #[test]
    fn test_second_evaluation_after_redirect_allows() {
        let mut gate = gate(SessionSnapshot::resolved(None), "/(protected)/todos");
        assert!(gate.evaluate().unwrap().decision.is_redirect());

        let again = gate.evaluate().unwrap();
        assert_eq!(again.decision, Decision::Allow);
        assert_eq!(again.redirected_to, None);
        assert_eq!(gate.navigator.history(), vec!["/(public)"]);
    }

    #[test]
    fn test_unchanged_transition_redirects_once() {
        let navigator = Arc::new(StuckNavigator {
            path: "/(protected)".to_string(),
            replaces: AtomicUsize::new(0),
        });
        let mut gate = AccessGate::new(
            FakeProvider::new(SessionSnapshot::resolved(None)),
            Arc::clone(&navigator),
            RouteMap::app(),
        );

        for _ in 0..3 {
            assert_eq!(gate.evaluate().unwrap().decision, Decision::RedirectToPublic);
        }
        assert_eq!(navigator.replaces.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_returning_to_protected_route_redirects_again() {
        let mut gate = gate(SessionSnapshot::resolved(None), "/(protected)/todos");
        assert_eq!(
            gate.evaluate().unwrap().redirected_to.as_deref(),
            Some("/(public)")
        );

        // Back press or deep link before the gate looked at the public root.
        gate.navigator.navigate("/(protected)/todos");
        let second = gate.evaluate().unwrap();

        assert_eq!(second.decision, Decision::RedirectToPublic);
        assert_eq!(second.redirected_to.as_deref(), Some("/(public)"));
        assert_eq!(gate.navigator.current_path(), "/(public)");
    }

    #[test]
    fn test_router_rejection_surfaces_and_is_not_retried() {
        let navigator = Arc::new(MemoryNavigator::new("/(protected)").rejecting(&["/(public)"]));
        let mut gate = AccessGate::new(
            FakeProvider::new(SessionSnapshot::resolved(None)),
            Arc::clone(&navigator),
            RouteMap::app(),
        );

        assert!(matches!(gate.evaluate(), Err(GateError::Navigation(_))));
        let retry = gate.evaluate().unwrap();
        assert_eq!(retry.redirected_to, None);
        assert_eq!(navigator.current_path(), "/(protected)");
    }

    #[test]
    fn test_ungated_web_path_is_allowed_once_resolved() {
        let routes = RouteMap::web();
        assert_eq!(
            decide_path(AuthStatus::Unauthenticated, "/about", &routes),
            (None, Decision::Allow)
        );
        assert_eq!(
            decide_path(AuthStatus::Unknown, "/about", &routes),
            (None, Decision::Pending)
        );
    }

    #[tokio::test]
    async fn test_driver_follows_session_changes() {
        let provider = Arc::new(WatchSessionProvider::new());
        let navigator = Arc::new(MemoryNavigator::new("/(protected)/todos"));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut route_rx = navigator.subscribe();

        let gate = AccessGate::new(Arc::clone(&provider), Arc::clone(&navigator), RouteMap::app());
        let handle = tokio::spawn(gate.run(navigator.subscribe(), shutdown_rx));

        // Still loading: the driver must not move.
        tokio::task::yield_now().await;
        assert_eq!(navigator.current_path(), "/(protected)/todos");

        provider.resolve(None);
        route_rx.changed().await.unwrap();
        assert_eq!(*route_rx.borrow_and_update(), "/(public)");

        navigator.navigate("/(public)/login");
        provider.resolve(Some(user()));
        loop {
            route_rx.changed().await.unwrap();
            if *route_rx.borrow_and_update() == "/(protected)" {
                break;
            }
        }

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(navigator.history(), vec!["/(public)", "/(protected)"]);
    }

    async fn next_path(rx: &mut watch::Receiver<String>) -> String {
        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("driver did not navigate")
            .unwrap();
        rx.borrow_and_update().clone()
    }

    #[tokio::test]
    async fn test_driver_redirects_again_after_merged_route_changes() {
        let provider = Arc::new(WatchSessionProvider::new());
        provider.resolve(None);
        let navigator = Arc::new(MemoryNavigator::new("/(protected)/todos"));
        let mut nav_rx = navigator.subscribe();

        // The driver only wakes when this channel says so, which lets the redirect
        // and the return to the protected route arrive as a single change.
        let (route_tx, route_rx) = watch::channel(navigator.current_path());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let gate = AccessGate::new(Arc::clone(&provider), Arc::clone(&navigator), RouteMap::app());
        let handle = tokio::spawn(gate.run(route_rx, shutdown_rx));

        assert_eq!(next_path(&mut nav_rx).await, "/(public)");

        navigator.navigate("/(protected)/todos");
        nav_rx.borrow_and_update();
        route_tx.send_replace(navigator.current_path());

        assert_eq!(next_path(&mut nav_rx).await, "/(public)");

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(navigator.current_path(), "/(public)");
    }

    #[tokio::test]
    async fn test_driver_outlives_dropped_shutdown_sender() {
        let provider = Arc::new(WatchSessionProvider::new());
        let navigator = Arc::new(MemoryNavigator::new("/(protected)"));
        let mut nav_rx = navigator.subscribe();
        let (route_tx, route_rx) = watch::channel(navigator.current_path());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let gate = AccessGate::new(Arc::clone(&provider), Arc::clone(&navigator), RouteMap::app());
        let handle = tokio::spawn(gate.run(route_rx, shutdown_rx));
        drop(shutdown_tx);
        tokio::task::yield_now().await;

        provider.resolve(None);
        assert_eq!(next_path(&mut nav_rx).await, "/(public)");

        // Closing a signal source still ends the loop.
        drop(route_tx);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("driver did not stop")
            .unwrap()
            .unwrap();
    }
}
