//! Flush-on-termination hook.

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, Once};
use tokio::signal;
use tracing::{error, info, warn};

use super::error::CheckpointError;
use super::store::CheckpointStore;

/// The hook currently supervising a run. At most one per process.
static ACTIVE: Mutex<Option<TerminationHook>> = Mutex::new(None);

static PANIC_HOOK: Once = Once::new();

fn active() -> MutexGuard<'static, Option<TerminationHook>> {
    ACTIVE.lock().unwrap_or_else(|e| e.into_inner())
}

/// Chains a panic hook that terminates through the active hook, if any.
/// Only the first call installs it.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            previous(panic_info);
            let hook = active().clone();
            if let Some(hook) = hook {
                hook.terminate(TerminationReason::Fault);
            }
        }));
    });
}

/// Releases the process-wide slot when supervision ends.
struct ActiveSlot;

impl ActiveSlot {
    fn claim(hook: &TerminationHook) -> Result<Self, CheckpointError> {
        let mut slot = active();
        if slot.is_some() {
            warn!("Termination hook already active");
            return Err(CheckpointError::HookActive);
        }
        *slot = Some(hook.clone());
        Ok(ActiveSlot)
    }
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        active().take();
    }
}

/// Process exit action. Replaced in tests.
pub type ExitFn = Arc<dyn Fn(i32) + Send + Sync>;

/// Why the process is terminating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    Interrupt,
    Terminate,
    User1,
    User2,
    /// Unhandled panic.
    Fault,
}

impl TerminationReason {
    /// Signals are an orderly early exit; a fault is not.
    pub fn exit_code(&self) -> i32 {
        match self {
            TerminationReason::Fault => 101,
            _ => 0,
        }
    }
}

/// Flushes the checkpoint when the process is told to stop, then exits.
///
/// The hook supervises the build future: on a signal the future is dropped
/// first, which kills any child processes it owns, and only then is the
/// checkpoint written.
#[derive(Clone)]
pub struct TerminationHook {
    store: CheckpointStore,
    path: PathBuf,
    exit: ExitFn,
}

impl TerminationHook {
    pub fn new(store: CheckpointStore, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
            exit: Arc::new(|code| std::process::exit(code)),
        }
    }

    /// Replaces the exit action.
    pub fn with_exit(mut self, exit: ExitFn) -> Self {
        self.exit = exit;
        self
    }

    /// Drives `work` to completion unless SIGINT, SIGTERM, SIGUSR1 or SIGUSR2
    /// arrives first. A panic anywhere in the process also terminates through
    /// this hook while it is active.
    pub async fn supervise<F>(self, work: F) -> Result<F::Output, CheckpointError>
    where
        F: Future,
    {
        self.supervise_with(work, wait_for_signal()).await
    }

    /// Like [`supervise`](Self::supervise), but waits on `trigger` instead of
    /// OS signals.
    ///
    /// Fails with [`CheckpointError::HookActive`] if another hook is already
    /// supervising, and with [`CheckpointError::Stopped`] if the trigger won
    /// and the exit action returned.
    pub async fn supervise_with<F, S>(
        self,
        work: F,
        trigger: S,
    ) -> Result<F::Output, CheckpointError>
    where
        F: Future,
        S: Future<Output = TerminationReason>,
    {
        let _slot = ActiveSlot::claim(&self)?;
        install_panic_hook();

        let mut work = Box::pin(work);
        let reason = tokio::select! {
            output = &mut work => return Ok(output),
            reason = trigger => reason,
        };

        info!("Received {:?}, stopping build and saving checkpoint", reason);
        drop(work);
        self.terminate(reason);
        Err(CheckpointError::Stopped(reason))
    }

    /// Flushes the checkpoint and invokes the exit action.
    ///
    /// A flush that already happened is not repeated. A failed flush exits with 1.
    pub fn terminate(&self, reason: TerminationReason) {
        match self.store.flush(&self.path) {
            Ok(_) => (self.exit)(reason.exit_code()),
            Err(e) => {
                error!("Failed to save checkpoint to {:?}: {}", self.path, e);
                (self.exit)(1)
            }
        }
    }
}

/// Resolves on the first recognized termination signal.
pub async fn wait_for_signal() -> TerminationReason {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use signal::unix::SignalKind;

        tokio::select! {
            _ = ctrl_c => TerminationReason::Interrupt,
            _ = unix_signal(SignalKind::terminate()) => TerminationReason::Terminate,
            _ = unix_signal(SignalKind::user_defined1()) => TerminationReason::User1,
            _ = unix_signal(SignalKind::user_defined2()) => TerminationReason::User2,
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        TerminationReason::Interrupt
    }
}

#[cfg(unix)]
async fn unix_signal(kind: signal::unix::SignalKind) {
    match signal::unix::signal(kind) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            error!("Failed to install {:?} handler: {}", kind, e);
            std::future::pending::<()>().await;
        }
    }
}
