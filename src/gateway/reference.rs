//! Reference Collections
//!
//! Read-only datasets side-loaded by form sessions to resolve dependent
//! fields (parent entities, child options).

use std::collections::BTreeMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Gateway, GatewayResult};
use crate::schema::Entity;

/// One option-bearing record, reduced to textual attributes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub attributes: BTreeMap<String, String>,
}

impl ReferenceRecord {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

#[async_trait(?Send)]
pub trait ReferenceSource {
    async fn list(&self) -> GatewayResult<Vec<ReferenceRecord>>;
}

/// Serves a resource gateway's collection as reference records
pub struct GatewayReferences<E, G> {
    gateway: G,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, G: Gateway<E>> GatewayReferences<E, G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway, _entity: PhantomData }
    }
}

#[async_trait(?Send)]
impl<E: Entity, G: Gateway<E>> ReferenceSource for GatewayReferences<E, G> {
    async fn list(&self) -> GatewayResult<Vec<ReferenceRecord>> {
        let entities = self.gateway.list().await?;
        Ok(entities.iter().map(Entity::reference).collect())
    }
}
