use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Exit status a shell reports for a process ended by SIGINT.
const SIGINT_EXIT_CODE: i32 = 130;

/// Routes Ctrl-C to the operation that is currently running (a streaming
/// answer or an archive load). With nothing running, Ctrl-C ends the process.
#[derive(Clone, Default)]
pub struct InterruptRouter {
    active: Arc<Mutex<Option<CancellationToken>>>,
}

impl InterruptRouter {
    /// Create a router and spawn the single process-wide Ctrl-C listener.
    /// Must be called from inside a tokio runtime.
    pub fn install() -> Self {
        let router = Self::default();
        let listener = router.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !listener.interrupt() {
                    std::process::exit(SIGINT_EXIT_CODE);
                }
            }
        });
        router
    }

    /// Mark a new operation as active. It stays interruptible until the
    /// returned guard is dropped.
    pub fn begin(&self) -> ActiveOperation {
        let token = CancellationToken::new();
        *self.slot() = Some(token.clone());
        ActiveOperation {
            router: self.clone(),
            token,
        }
    }

    /// Cancel the active operation. Returns false when nothing was running.
    pub fn interrupt(&self) -> bool {
        match self.slot().as_ref() {
            Some(token) => {
                debug!("interrupt received, cancelling active operation");
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct ActiveOperation {
    router: InterruptRouter,
    token: CancellationToken,
}

impl ActiveOperation {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for ActiveOperation {
    fn drop(&mut self) {
        *self.router.slot() = None;
    }
}
