//! Shutdown coordination.

use tokio::sync::watch;

/// How urgently the process must go away.
///
/// The three process-level fault paths differ only in exit urgency, so they
/// share one shutdown routine parameterized by this mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Process state is untrustworthy: exit now, no drain.
    Immediate,
    /// A background task failed: drain in-flight requests, then exit non-zero.
    Drain,
    /// Operator-requested: drain, then exit clean.
    Graceful,
}

impl ShutdownMode {
    pub fn exit_code(self) -> i32 {
        match self {
            ShutdownMode::Immediate | ShutdownMode::Drain => 1,
            ShutdownMode::Graceful => 0,
        }
    }

    /// Whether in-flight requests are allowed to finish.
    pub fn drains(self) -> bool {
        !matches!(self, ShutdownMode::Immediate)
    }
}

/// Coordinator for graceful shutdown.
///
/// Wraps a watch channel holding the requested mode. The first trigger wins;
/// later triggers are ignored, giving the fire-once-per-process contract.
#[derive(Clone)]
pub struct Shutdown {
    tx: watch::Sender<Option<ShutdownMode>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Request shutdown in the given mode. Only the first request sticks.
    pub fn trigger(&self, mode: ShutdownMode) {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(mode);
                true
            } else {
                false
            }
        });
    }

    /// The mode that was requested, if any.
    pub fn requested(&self) -> Option<ShutdownMode> {
        *self.tx.borrow()
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        while rx.borrow_and_update().is_none() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_urgency() {
        assert_eq!(ShutdownMode::Immediate.exit_code(), 1);
        assert_eq!(ShutdownMode::Drain.exit_code(), 1);
        assert_eq!(ShutdownMode::Graceful.exit_code(), 0);
        assert!(!ShutdownMode::Immediate.drains());
        assert!(ShutdownMode::Drain.drains());
        assert!(ShutdownMode::Graceful.drains());
    }

    #[test]
    fn first_trigger_wins() {
        let shutdown = Shutdown::new();
        assert_eq!(shutdown.requested(), None);
        shutdown.trigger(ShutdownMode::Graceful);
        shutdown.trigger(ShutdownMode::Drain);
        assert_eq!(shutdown.requested(), Some(ShutdownMode::Graceful));
    }

    #[tokio::test]
    async fn wait_resolves_after_trigger() {
        let shutdown = Shutdown::new();
        let waiter = shutdown.clone();
        let task = tokio::spawn(async move { waiter.wait().await });
        shutdown.trigger(ShutdownMode::Drain);
        task.await.unwrap();
        assert_eq!(shutdown.requested(), Some(ShutdownMode::Drain));
    }
}
