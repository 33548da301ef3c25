//! In-Memory Gateway
//!
//! Backend stand-in holding records in memory, with scripted failures.
//! Used by the offline console and by tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use async_trait::async_trait;

use super::{Failure, Gateway, GatewayResult};
use crate::schema::{Entity, EntityId};

pub struct MemoryGateway<E> {
    records: RefCell<Vec<E>>,
    next_id: Cell<EntityId>,
    failures: RefCell<VecDeque<Failure>>,
    calls: Cell<usize>,
}

impl<E: Entity> MemoryGateway<E> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Seed the backend; new ids continue after the highest seeded id
    pub fn with_records(records: Vec<E>) -> Self {
        let next_id = records.iter().map(Entity::id).max().unwrap_or(0) + 1;
        Self {
            records: RefCell::new(records),
            next_id: Cell::new(next_id),
            failures: RefCell::new(VecDeque::new()),
            calls: Cell::new(0),
        }
    }

    /// Make the next call fail with `failure` (queued in order)
    pub fn fail_next(&self, failure: Failure) {
        self.failures.borrow_mut().push_back(failure);
    }

    /// Number of calls received, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn records(&self) -> Vec<E> {
        self.records.borrow().clone()
    }

    fn begin_call(&self) -> GatewayResult<()> {
        self.calls.set(self.calls.get() + 1);
        match self.failures.borrow_mut().pop_front() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn not_found(id: EntityId) -> Failure {
        Failure::from_status(404, Some(format!("{} {} not found", E::schema().label, id)))
    }
}

impl<E: Entity> Default for MemoryGateway<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl<E: Entity> Gateway<E> for MemoryGateway<E> {
    async fn list(&self) -> GatewayResult<Vec<E>> {
        self.begin_call()?;
        Ok(self.records())
    }

    async fn create(&self, payload: &E) -> GatewayResult<E> {
        self.begin_call()?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let created = payload.clone().with_id(id);
        self.records.borrow_mut().push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: EntityId, payload: &E) -> GatewayResult<E> {
        self.begin_call()?;
        let mut records = self.records.borrow_mut();
        let slot = records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        *slot = payload.clone().with_id(id);
        Ok(slot.clone())
    }

    async fn delete(&self, id: EntityId) -> GatewayResult<()> {
        self.begin_call()?;
        let mut records = self.records.borrow_mut();
        let before = records.len();
        records.retain(|record| record.id() != id);
        if records.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Degree;

    #[tokio::test]
    async fn test_create_assigns_fresh_ids() {
        let gateway = MemoryGateway::with_records(Degree::fixtures());
        let highest = Degree::fixtures().iter().map(Entity::id).max().unwrap();

        let created = gateway.create(&Degree::new("Physics", "BSC-PHY", "UG", "Physics")).await.unwrap();
        assert_eq!(created.id, highest + 1);
        assert_eq!(gateway.records().len(), Degree::fixtures().len() + 1);
    }

    #[tokio::test]
    async fn test_scripted_failure_is_consumed_once() {
        let gateway: MemoryGateway<Degree> = MemoryGateway::new();
        gateway.fail_next(Failure::unauthorized(None));

        assert!(gateway.list().await.unwrap_err().is_unauthorized());
        assert!(gateway.list().await.unwrap().is_empty());
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_return_not_found() {
        let gateway: MemoryGateway<Degree> = MemoryGateway::new();
        let payload = Degree::new("Physics", "BSC-PHY", "UG", "Physics");

        assert_eq!(gateway.update(9, &payload).await.unwrap_err().status, Some(404));
        assert_eq!(gateway.delete(9).await.unwrap_err().status, Some(404));
    }
}
