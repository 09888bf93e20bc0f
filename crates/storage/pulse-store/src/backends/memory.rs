//! In-memory event store for testing and development

use super::{group, group_actions, next_id, select, summarize};
use crate::error::Result;
use crate::traits::{
    ActionGroup, EventFilter, EventStore, GroupBy, ReplacementGroup, ReplacementTally,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use pulse_core::{
    Clock, ErrorEvent, EventId, NewError, NewReplacement, NewUserAction, ReplacementEvent,
    UserActionEvent,
};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Tables {
    replacements: Vec<ReplacementEvent>,
    errors: Vec<ErrorEvent>,
    user_actions: Vec<UserActionEvent>,
}

/// In-memory event store.
///
/// Each table is a vector in id order. Appends take the single write lock,
/// so id assignment and insertion happen together.
#[derive(Clone)]
pub struct MemoryEventStore {
    tables: Arc<RwLock<Tables>>,
    clock: Arc<dyn Clock>,
}

impl MemoryEventStore {
    /// Create an empty store stamping events with `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            clock,
        }
    }
}

impl std::fmt::Debug for MemoryEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.tables.read();
        f.debug_struct("MemoryEventStore")
            .field("replacements", &tables.replacements.len())
            .field("errors", &tables.errors.len())
            .field("user_actions", &tables.user_actions.len())
            .finish()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn append_replacement(&self, event: NewReplacement) -> Result<EventId> {
        let mut tables = self.tables.write();
        let id = next_id(tables.replacements.last().map(|e| e.id));
        tables
            .replacements
            .push(event.into_event(id, self.clock.now()));
        Ok(id)
    }

    async fn append_error(&self, event: NewError) -> Result<EventId> {
        let mut tables = self.tables.write();
        let id = next_id(tables.errors.last().map(|e| e.id));
        tables.errors.push(event.into_event(id, self.clock.now()));
        Ok(id)
    }

    async fn append_user_action(&self, event: NewUserAction) -> Result<EventId> {
        let mut tables = self.tables.write();
        let id = next_id(tables.user_actions.last().map(|e| e.id));
        tables
            .user_actions
            .push(event.into_event(id, self.clock.now()));
        Ok(id)
    }

    async fn replacements(&self, filter: &EventFilter) -> Result<Vec<ReplacementEvent>> {
        let tables = self.tables.read();
        let rows = tables
            .replacements
            .iter()
            .filter(|e| filter.contains(e.timestamp))
            .cloned();
        Ok(select(rows, filter))
    }

    async fn errors(&self, filter: &EventFilter) -> Result<Vec<ErrorEvent>> {
        let tables = self.tables.read();
        let rows = tables
            .errors
            .iter()
            .filter(|e| filter.contains(e.timestamp))
            .cloned();
        Ok(select(rows, filter))
    }

    async fn user_actions(&self, filter: &EventFilter) -> Result<Vec<UserActionEvent>> {
        let tables = self.tables.read();
        let rows = tables
            .user_actions
            .iter()
            .filter(|e| filter.contains(e.timestamp))
            .cloned();
        Ok(select(rows, filter))
    }

    async fn count_replacements(&self, filter: &EventFilter) -> Result<u64> {
        let tables = self.tables.read();
        Ok(tables
            .replacements
            .iter()
            .filter(|e| filter.contains(e.timestamp))
            .count() as u64)
    }

    async fn count_errors(&self, filter: &EventFilter) -> Result<u64> {
        let tables = self.tables.read();
        Ok(tables
            .errors
            .iter()
            .filter(|e| filter.contains(e.timestamp))
            .count() as u64)
    }

    async fn count_user_actions(&self, filter: &EventFilter) -> Result<u64> {
        let tables = self.tables.read();
        Ok(tables
            .user_actions
            .iter()
            .filter(|e| filter.contains(e.timestamp))
            .count() as u64)
    }

    async fn summarize_replacements(&self, filter: &EventFilter) -> Result<ReplacementTally> {
        let tables = self.tables.read();
        Ok(summarize(
            tables
                .replacements
                .iter()
                .filter(|e| filter.contains(e.timestamp)),
        ))
    }

    async fn group_replacements(
        &self,
        filter: &EventFilter,
        by: GroupBy,
    ) -> Result<Vec<ReplacementGroup>> {
        let tables = self.tables.read();
        Ok(group(
            tables
                .replacements
                .iter()
                .filter(|e| filter.contains(e.timestamp)),
            by,
        ))
    }

    async fn group_user_actions(&self, filter: &EventFilter) -> Result<Vec<ActionGroup>> {
        let tables = self.tables.read();
        Ok(group_actions(
            tables
                .user_actions
                .iter()
                .filter(|e| filter.contains(e.timestamp)),
        ))
    }
}
