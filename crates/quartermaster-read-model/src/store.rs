//! Projection storage.
//!
//! Every projection owns one `ProjectionStore`. Rows and the per-aggregate
//! cursor sit behind the same lock, so checking for a redelivered event and
//! applying a fresh one is a single critical section. Two projections never
//! share a store.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use quartermaster_core::error::DomainError;

use crate::dto::{InventoryItemDetailsDto, InventoryItemListDto};
use crate::projection::ProjectionOutcome;

#[derive(Debug, Default)]
struct State<T> {
    rows: T,
    /// Last applied version per aggregate.
    cursors: HashMap<Uuid, i64>,
}

/// Rows of one projection plus its delivery cursor.
#[derive(Debug, Default)]
pub struct ProjectionStore<T> {
    state: RwLock<State<T>>,
}

/// Storage of the list projection, in creation order.
pub type InventoryListStore = ProjectionStore<Vec<InventoryItemListDto>>;

/// Storage of the details projection.
pub type InventoryDetailsStore = ProjectionStore<HashMap<Uuid, InventoryItemDetailsDto>>;

impl<T: Default> ProjectionStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }
}

impl<T> ProjectionStore<T> {
    /// Runs `update` unless `version` of `aggregate_id` was already applied.
    ///
    /// The cursor only advances when `update` succeeds.
    ///
    /// # Errors
    ///
    /// Returns whatever `update` returns; the rows it touched before failing
    /// are left as they are.
    pub async fn apply_once<F>(
        &self,
        aggregate_id: Uuid,
        version: i64,
        update: F,
    ) -> Result<ProjectionOutcome, DomainError>
    where
        F: FnOnce(&mut T) -> Result<(), DomainError> + Send,
    {
        let mut state = self.state.write().await;
        if state
            .cursors
            .get(&aggregate_id)
            .is_some_and(|last| version <= *last)
        {
            return Ok(ProjectionOutcome::DuplicateSkipped);
        }

        update(&mut state.rows)?;
        state.cursors.insert(aggregate_id, version);
        Ok(ProjectionOutcome::Applied)
    }

    /// Runs `read` against the rows under a shared lock.
    pub async fn read<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.state.read().await.rows)
    }

    /// Last version applied for `aggregate_id`, if any.
    pub async fn last_applied(&self, aggregate_id: Uuid) -> Option<i64> {
        self.state.read().await.cursors.get(&aggregate_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_apply_once_skips_versions_at_or_below_cursor() {
        // Arrange
        let store: ProjectionStore<Vec<i64>> = ProjectionStore::new();
        let id = Uuid::new_v4();

        // Act
        let first = store
            .apply_once(id, 1, |rows| {
                rows.push(1);
                Ok(())
            })
            .await
            .unwrap();
        let replayed = store
            .apply_once(id, 1, |rows| {
                rows.push(1);
                Ok(())
            })
            .await
            .unwrap();

        // Assert
        assert_eq!(first, ProjectionOutcome::Applied);
        assert_eq!(replayed, ProjectionOutcome::DuplicateSkipped);
        assert_eq!(store.read(Vec::len).await, 1);
        assert_eq!(store.last_applied(id).await, Some(1));
    }

    #[tokio::test]
    async fn test_failed_update_leaves_cursor_in_place() {
        let store: ProjectionStore<Vec<i64>> = ProjectionStore::new();
        let id = Uuid::new_v4();

        let result = store
            .apply_once(id, 1, |_| Err(DomainError::NotFound(id)))
            .await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
        assert_eq!(store.last_applied(id).await, None);
    }

    #[tokio::test]
    async fn test_cursors_are_per_aggregate() {
        let store: ProjectionStore<Vec<i64>> = ProjectionStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store.apply_once(a, 3, |_| Ok(())).await.unwrap();
        let outcome = store.apply_once(b, 1, |_| Ok(())).await.unwrap();

        assert_eq!(outcome, ProjectionOutcome::Applied);
        assert_eq!(store.last_applied(a).await, Some(3));
        assert_eq!(store.last_applied(b).await, Some(1));
    }
}
