//! Background/foreground lifecycle for outstanding cache operations
//!
//! When the host process is backgrounded, tracked operations are demoted to
//! background priority and given a grace window to drain. Anything still
//! running when the window closes is cancelled. Returning to the foreground
//! releases the pending cancellation.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationPriority {
    UserInitiated,
    Background,
}

struct TrackedOperation {
    name: String,
    priority: OperationPriority,
    cancel_token: CancellationToken,
}

pub struct OperationTracker {
    operations: DashMap<Uuid, TrackedOperation>,
    grace: Duration,
    in_background: AtomicBool,
    /// Pending hard-cancel task, held while backgrounded
    drain_task: Mutex<Option<JoinHandle<()>>>,
}

impl OperationTracker {
    pub fn new(grace: Duration) -> Self {
        Self {
            operations: DashMap::new(),
            grace,
            in_background: AtomicBool::new(false),
            drain_task: Mutex::new(None),
        }
    }

    /// Track an operation until the returned guard drops
    pub fn register(self: &Arc<Self>, name: impl Into<String>) -> OperationGuard {
        let id = Uuid::new_v4();
        let cancel_token = CancellationToken::new();
        let priority = if self.in_background.load(Ordering::SeqCst) {
            OperationPriority::Background
        } else {
            OperationPriority::UserInitiated
        };

        self.operations.insert(
            id,
            TrackedOperation {
                name: name.into(),
                priority,
                cancel_token: cancel_token.clone(),
            },
        );

        OperationGuard {
            id,
            cancel_token,
            tracker: Arc::clone(self),
        }
    }

    pub fn priority(&self, id: Uuid) -> Option<OperationPriority> {
        self.operations.get(&id).map(|op| op.priority)
    }

    pub fn outstanding(&self) -> usize {
        self.operations.len()
    }

    pub fn is_in_background(&self) -> bool {
        self.in_background.load(Ordering::SeqCst)
    }

    /// Demote every tracked operation and cancel survivors after the grace window
    pub fn enter_background(self: &Arc<Self>) {
        if self.in_background.swap(true, Ordering::SeqCst) {
            return;
        }

        for mut op in self.operations.iter_mut() {
            op.priority = OperationPriority::Background;
        }
        log::info!(
            "Entering background with {} outstanding operation(s)",
            self.operations.len()
        );

        let tracker = Arc::clone(self);
        let grace = self.grace;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            tracker.cancel_all();
        });

        if let Ok(mut slot) = self.drain_task.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Release the pending cancellation
    pub fn enter_foreground(&self) {
        self.in_background.store(false, Ordering::SeqCst);
        if let Ok(mut slot) = self.drain_task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
                log::debug!("Released background drain window");
            }
        }
    }

    fn cancel_all(&self) {
        let ids: Vec<Uuid> = self.operations.iter().map(|op| *op.key()).collect();
        for id in ids {
            if let Some((_, op)) = self.operations.remove(&id) {
                log::warn!("Cancelling '{}' after background grace window", op.name);
                op.cancel_token.cancel();
            }
        }
    }
}

/// Handle for a tracked operation; deregisters on drop
pub struct OperationGuard {
    id: Uuid,
    cancel_token: CancellationToken,
    tracker: Arc<OperationTracker>,
}

impl OperationGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.tracker.operations.remove(&self.id);
    }
}
