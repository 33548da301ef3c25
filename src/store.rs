//! Collection Store
//!
//! Authoritative in-memory list of one resource type plus its load status.
//! Loads are ticketed so that only the most recently issued one applies.

use crate::config::AuthFallback;
use crate::gateway::{Failure, FailureKind, GatewayResult};
use crate::schema::{Entity, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Error,
}

/// Identifies one issued load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Collection replaced with the server's entities
    Loaded(usize),
    /// Credentials rejected; fixtures substituted
    FellBack(Failure),
    Failed(Failure),
    /// A newer load was issued; this result was dropped
    Stale,
}

#[derive(Debug)]
pub struct CollectionStore<E> {
    entities: Vec<E>,
    status: LoadStatus,
    last_error: Option<FailureKind>,
    issued: u64,
    /// Highest id ever held; local ids are allocated above it
    high_water: EntityId,
}

impl<E: Entity> Default for CollectionStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> CollectionStore<E> {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            status: LoadStatus::Idle,
            last_error: None,
            issued: 0,
            high_water: 0,
        }
    }

    pub fn entities(&self) -> &[E] {
        &self.entities
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<FailureKind> {
        self.last_error
    }

    pub fn get(&self, id: EntityId) -> Option<&E> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // ========================
    // Loading
    // ========================

    /// Mark the store loading; any earlier ticket becomes stale
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        self.status = LoadStatus::Loading;
        LoadTicket(self.issued)
    }

    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: GatewayResult<Vec<E>>,
        fallback: AuthFallback,
    ) -> LoadOutcome {
        if ticket.0 != self.issued {
            log::debug!("[STORE] {} dropping stale load #{} (latest #{})", E::schema().resource, ticket.0, self.issued);
            return LoadOutcome::Stale;
        }

        match result {
            Ok(entities) => {
                let count = entities.len();
                self.replace(entities);
                self.status = LoadStatus::Idle;
                self.last_error = None;
                log::info!("[STORE] {} loaded {} entities", E::schema().resource, count);
                LoadOutcome::Loaded(count)
            }
            Err(failure) => {
                self.status = LoadStatus::Error;
                self.last_error = Some(failure.kind);
                if failure.is_unauthorized() && fallback.uses_fixtures() {
                    log::warn!("[STORE] {} unauthorized, substituting fixtures", E::schema().resource);
                    self.replace(E::fixtures());
                    LoadOutcome::FellBack(failure)
                } else {
                    log::warn!("[STORE] {} load failed: {}", E::schema().resource, failure);
                    LoadOutcome::Failed(failure)
                }
            }
        }
    }

    fn replace(&mut self, entities: Vec<E>) {
        self.raise_high_water(entities.iter().map(Entity::id).max().unwrap_or(0));
        self.entities = entities;
    }

    fn raise_high_water(&mut self, id: EntityId) {
        self.high_water = self.high_water.max(id);
    }

    // ========================
    // Mutators
    // ========================

    /// Replace by id or append. Returns true when appended.
    pub fn upsert(&mut self, entity: E) -> bool {
        self.raise_high_water(entity.id());
        match self.entities.iter_mut().find(|existing| existing.id() == entity.id()) {
            Some(existing) => {
                *existing = entity;
                false
            }
            None => {
                self.entities.push(entity);
                true
            }
        }
    }

    pub fn remove(&mut self, id: EntityId) -> Option<E> {
        let index = self.entities.iter().position(|entity| entity.id() == id)?;
        Some(self.entities.remove(index))
    }

    /// Fresh id for an entity that only exists locally. Never reused.
    pub fn next_local_id(&mut self) -> EntityId {
        self.high_water += 1;
        self.high_water
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Degree;

    fn degree(id: EntityId, name: &str) -> Degree {
        Degree::new(name, name, "UG", "CS").with_id(id)
    }

    #[test]
    fn test_load_replaces_collection() {
        let mut store = CollectionStore::new();
        store.upsert(degree(9, "Old"));

        let ticket = store.begin_load();
        assert_eq!(store.status(), LoadStatus::Loading);

        let outcome = store.finish_load(ticket, Ok(vec![degree(1, "A"), degree(2, "B")]), AuthFallback::Fixtures);
        assert_eq!(outcome, LoadOutcome::Loaded(2));
        assert_eq!(store.status(), LoadStatus::Idle);
        assert!(!store.contains(9));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_last_issued_load_wins() {
        let mut store: CollectionStore<Degree> = CollectionStore::new();
        let first = store.begin_load();
        let second = store.begin_load();

        let newer = store.finish_load(second, Ok(vec![degree(2, "Newer")]), AuthFallback::Fixtures);
        let older = store.finish_load(first, Ok(vec![degree(1, "Older")]), AuthFallback::Fixtures);

        assert_eq!(newer, LoadOutcome::Loaded(1));
        assert_eq!(older, LoadOutcome::Stale);
        assert_eq!(store.entities()[0].name, "Newer");
    }

    #[test]
    fn test_unauthorized_load_substitutes_fixtures() {
        let mut store: CollectionStore<Degree> = CollectionStore::new();
        let ticket = store.begin_load();
        let outcome = store.finish_load(ticket, Err(Failure::unauthorized(None)), AuthFallback::Fixtures);

        assert!(matches!(outcome, LoadOutcome::FellBack(_)));
        assert_eq!(store.status(), LoadStatus::Error);
        assert_eq!(store.last_error(), Some(FailureKind::Unauthorized));
        assert_eq!(store.entities(), Degree::fixtures().as_slice());
    }

    #[test]
    fn test_unauthorized_without_fallback_keeps_collection() {
        let mut store = CollectionStore::new();
        store.upsert(degree(3, "Kept"));
        let ticket = store.begin_load();
        let outcome = store.finish_load(ticket, Err(Failure::unauthorized(None)), AuthFallback::Disabled);

        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.entities()[0].name, "Kept");
    }

    #[test]
    fn test_other_failure_sets_error_status() {
        let mut store: CollectionStore<Degree> = CollectionStore::new();
        let ticket = store.begin_load();
        store.finish_load(ticket, Err(Failure::from_status(500, None)), AuthFallback::Fixtures);

        assert_eq!(store.status(), LoadStatus::Error);
        assert_eq!(store.last_error(), Some(FailureKind::Other));
        assert!(store.is_empty());
    }

    #[test]
    fn test_upsert_replaces_or_appends() {
        let mut store = CollectionStore::new();
        assert!(store.upsert(degree(1, "A")));
        assert!(store.upsert(degree(2, "B")));
        assert!(!store.upsert(degree(1, "A2")));

        let names: Vec<&str> = store.entities().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["A2", "B"]);
    }

    #[test]
    fn test_remove_targets_one_id() {
        let mut store = CollectionStore::new();
        store.upsert(degree(1, "A"));
        store.upsert(degree(2, "B"));

        assert_eq!(store.remove(1).map(|d| d.id), Some(1));
        assert_eq!(store.remove(1), None);
        assert_eq!(store.len(), 1);
        assert!(store.contains(2));
    }

    #[test]
    fn test_local_ids_never_reused() {
        let mut store = CollectionStore::new();
        store.upsert(degree(5, "A"));
        let first = store.next_local_id();
        store.remove(5);
        let second = store.next_local_id();

        assert_eq!(first, 6);
        assert_eq!(second, 7);
    }
}
