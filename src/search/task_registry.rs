//! Search task registry - tracks in-flight search tasks per scope

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Scope shared by user-issued searches; a new one supersedes the last
pub const USER_SEARCH_SCOPE: &str = "user-search";

/// Active search task
pub struct SearchTask {
    pub task_id: Uuid,
    pub scope: String,
    pub cancel_token: CancellationToken,
}

/// Registry of active search tasks (keyed by task id)
#[derive(Default)]
pub struct SearchTaskRegistry {
    tasks: DashMap<Uuid, SearchTask>,
}

impl SearchTaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel whatever runs in `scope`, then register a fresh task there
    pub fn supersede(&self, scope: &str) -> (Uuid, CancellationToken) {
        self.cancel_scope(scope);
        let task_id = Uuid::new_v4();
        let cancel_token = CancellationToken::new();
        self.tasks.insert(
            task_id,
            SearchTask {
                task_id,
                scope: scope.to_string(),
                cancel_token: cancel_token.clone(),
            },
        );
        (task_id, cancel_token)
    }

    pub fn remove_task(&self, task_id: &Uuid) {
        self.tasks.remove(task_id);
    }

    /// Cancel and remove tasks in a scope
    pub fn cancel_scope(&self, scope: &str) -> usize {
        let to_cancel: Vec<Uuid> = self
            .tasks
            .iter()
            .filter(|entry| entry.scope == scope)
            .map(|entry| entry.task_id)
            .collect();

        let mut cancelled = 0;
        for task_id in to_cancel {
            if let Some((_, task)) = self.tasks.remove(&task_id) {
                task.cancel_token.cancel();
                cancelled += 1;
            }
        }
        cancelled
    }

    pub fn cancel_all(&self) {
        self.tasks.iter().for_each(|entry| entry.cancel_token.cancel());
        self.tasks.clear();
    }

    pub fn is_scope_active(&self, scope: &str) -> bool {
        self.tasks.iter().any(|entry| entry.scope == scope)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supersede_cancels_previous() {
        let registry = SearchTaskRegistry::new();
        let (first_id, first) = registry.supersede(USER_SEARCH_SCOPE);
        let (_, other_scope) = registry.supersede("locations");
        let (second_id, second) = registry.supersede(USER_SEARCH_SCOPE);

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!other_scope.is_cancelled());
        assert_ne!(first_id, second_id);
        assert_eq!(registry.len(), 2);

        registry.remove_task(&second_id);
        assert!(!registry.is_scope_active(USER_SEARCH_SCOPE));
        assert!(registry.is_scope_active("locations"));
    }

    #[test]
    fn test_cancel_all() {
        let registry = SearchTaskRegistry::new();
        let (_, a) = registry.supersede("a");
        let (_, b) = registry.supersede("b");
        registry.cancel_all();
        assert!(a.is_cancelled() && b.is_cancelled());
        assert!(registry.is_empty());
    }
}
