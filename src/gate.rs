//! One-shot bootstrap gate: the route table is not consulted while the gate
//! is in `Splash`. The transition to `Ready` fires once, after a fixed delay,
//! or immediately when the caller skips the splash. There is no way back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Observed splash duration of the portal's startup screen.
pub const SPLASH_DELAY: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Splash,
    Ready,
}

/// Cheap cloneable probe handed to request handlers. Reads are lock-free.
#[derive(Debug, Clone)]
pub struct GateHandle {
    ready: Arc<AtomicBool>,
}

impl GateHandle {
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn state(&self) -> GateState {
        if self.is_ready() { GateState::Ready } else { GateState::Splash }
    }
}

/// Owner of the one-shot timer. Dropping the gate before the delay elapses
/// aborts the timer task, so a completion firing after teardown is a no-op:
/// the handle simply never leaves `Splash`.
pub struct BootstrapGate {
    handle: GateHandle,
    timer: Option<JoinHandle<()>>,
}

impl BootstrapGate {
    /// Arm the gate; it flips to `Ready` once `delay` has elapsed.
    pub fn start(delay: Duration) -> Self {
        let ready = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ready);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            flag.store(true, Ordering::Release);
            debug!(target: "gate", delay_ms = delay.as_millis() as u64, "bootstrap gate ready");
        });
        BootstrapGate { handle: GateHandle { ready }, timer: Some(timer) }
    }

    /// Skip the splash entirely.
    pub fn ready_now() -> Self {
        BootstrapGate { handle: GateHandle { ready: Arc::new(AtomicBool::new(true)) }, timer: None }
    }

    pub fn handle(&self) -> GateHandle {
        self.handle.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.handle.is_ready()
    }
}

impl Drop for BootstrapGate {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
