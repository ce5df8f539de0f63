use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::error::NavigationError;

/// Navigator
///
/// The router as seen by the gate: where are we, and a `replace` primitive.
/// The gate calls `replace` and nothing else that changes navigation.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;

    /// Swaps the current entry for `path` (no new history entry).
    fn replace(&self, path: &str) -> Result<(), NavigationError>;
}

impl<T: Navigator + ?Sized> Navigator for Arc<T> {
    fn current_path(&self) -> String {
        (**self).current_path()
    }

    fn replace(&self, path: &str) -> Result<(), NavigationError> {
        (**self).replace(path)
    }
}

/// MemoryNavigator
///
/// In-memory router with a history stack. Every change of the current path is
/// published on a watch channel so a gate driver can react to it.
#[derive(Debug)]
pub struct MemoryNavigator {
    history: Mutex<Vec<String>>,
    rejected: Vec<String>,
    tx: watch::Sender<String>,
}

impl MemoryNavigator {
    pub fn new(initial: impl Into<String>) -> Self {
        let initial = initial.into();
        let (tx, _rx) = watch::channel(initial.clone());
        Self {
            history: Mutex::new(vec![initial]),
            rejected: Vec::new(),
            tx,
        }
    }

    /// Makes `replace` refuse the given targets, the way a router refuses a route
    /// that does not exist.
    pub fn rejecting(mut self, targets: &[&str]) -> Self {
        self.rejected = targets.iter().map(|t| t.to_string()).collect();
        self
    }

    /// User-initiated navigation: pushes a new entry.
    pub fn navigate(&self, path: &str) {
        self.lock().push(path.to_string());
        self.tx.send_replace(path.to_string());
    }

    pub fn history(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.lock().last().cloned().unwrap_or_else(|| "/".to_string())
    }

    fn replace(&self, path: &str) -> Result<(), NavigationError> {
        if self.rejected.iter().any(|r| r == path) {
            return Err(NavigationError::Rejected {
                target: path.to_string(),
                reason: "no such route".to_string(),
            });
        }

        {
            let mut history = self.lock();
            history.pop();
            history.push(path.to_string());
        }
        self.tx.send_replace(path.to_string());
        Ok(())
    }
}
