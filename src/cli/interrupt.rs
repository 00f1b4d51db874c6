//! Process-wide Ctrl-C handling.
//!
//! One listener is installed for the life of the process. Each Ctrl-C cancels
//! the innermost open [`InterruptScope`]; with no scope open the process exits
//! with status 130.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Exit status used when Ctrl-C arrives with nothing to cancel.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// What a single Ctrl-C did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// The innermost open scope was cancelled.
    CancelledOperation,
    /// Nothing was running; the process should exit.
    Exit,
}

#[derive(Default)]
struct Scopes {
    next_id: u64,
    open: Vec<(u64, CancellationToken)>,
}

/// Shared registry of cancellable scopes, innermost last.
#[derive(Clone, Default)]
pub struct Interrupts {
    scopes: Arc<Mutex<Scopes>>,
}

impl Interrupts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the Ctrl-C listener. Call once, from `main`.
    pub fn listen(&self) {
        let interrupts = self.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                match interrupts.interrupt() {
                    InterruptAction::CancelledOperation => {
                        warn!("Interrupted; cancelling the current operation");
                    }
                    InterruptAction::Exit => std::process::exit(INTERRUPTED_EXIT_CODE),
                }
            }
        });
    }

    /// Open a scope whose token fires on the next Ctrl-C. Closing it (drop)
    /// hands Ctrl-C back to the enclosing scope.
    pub fn scope(&self) -> InterruptScope {
        let token = CancellationToken::new();
        let mut scopes = self.lock();
        let id = scopes.next_id;
        scopes.next_id += 1;
        scopes.open.push((id, token.clone()));
        InterruptScope {
            id,
            token,
            owner: self.clone(),
        }
    }

    /// Handle one Ctrl-C.
    pub fn interrupt(&self) -> InterruptAction {
        match self.lock().open.pop() {
            Some((_, token)) => {
                token.cancel();
                InterruptAction::CancelledOperation
            }
            None => InterruptAction::Exit,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Scopes> {
        self.scopes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Interrupts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interrupts")
            .field("open", &self.lock().open.len())
            .finish()
    }
}

/// An open cancellation scope. See [`Interrupts::scope`].
#[derive(Debug)]
pub struct InterruptScope {
    id: u64,
    token: CancellationToken,
    owner: Interrupts,
}

impl InterruptScope {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for InterruptScope {
    fn drop(&mut self) {
        self.owner.lock().open.retain(|(id, _)| *id != self.id);
    }
}
