//! Remote Resource Gateway
//!
//! Abstract CRUD bindings against the backend, organized by transport.

mod memory;
mod reference;
mod rest;

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;

use crate::schema::{Entity, EntityId};

pub use memory::MemoryGateway;
pub use reference::{GatewayReferences, ReferenceRecord, ReferenceSource};
pub use rest::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, RestGateway, Transport};

// ========================
// Failures
// ========================

/// Failure classification the controller acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Unauthorized,
    Other,
}

/// A classified gateway failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub status: Option<u16>,
    pub message: Option<String>,
}

impl Failure {
    pub fn unauthorized(message: Option<String>) -> Self {
        Self { kind: FailureKind::Unauthorized, status: Some(401), message }
    }

    pub fn other(message: Option<String>) -> Self {
        Self { kind: FailureKind::Other, status: None, message }
    }

    /// Classify an HTTP status. Only 401 counts as an authentication failure.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        let kind = if status == 401 { FailureKind::Unauthorized } else { FailureKind::Other };
        Self { kind, status: Some(status), message }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == FailureKind::Unauthorized
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            FailureKind::Unauthorized => "Unauthorized",
            FailureKind::Other => "Request failed",
        };
        match (self.status, &self.message) {
            (Some(status), Some(msg)) => write!(f, "{} ({}): {}", label, status, msg),
            (Some(status), None) => write!(f, "{} ({})", label, status),
            (None, Some(msg)) => write!(f, "{}: {}", label, msg),
            (None, None) => f.write_str(label),
        }
    }
}

impl std::error::Error for Failure {}

/// Common result type for gateway calls
pub type GatewayResult<T> = Result<T, Failure>;

// ========================
// Gateway Trait
// ========================

/// CRUD against the remote collection of one resource type
///
/// Futures are not `Send`: the controller runs on a single UI thread.
#[async_trait(?Send)]
pub trait Gateway<E: Entity> {
    /// Full collection
    async fn list(&self) -> GatewayResult<Vec<E>>;

    /// Persist a new entity; the result carries the server-assigned id
    async fn create(&self, payload: &E) -> GatewayResult<E>;

    /// Replace an existing entity
    async fn update(&self, id: EntityId, payload: &E) -> GatewayResult<E>;

    /// Delete entity by ID
    async fn delete(&self, id: EntityId) -> GatewayResult<()>;
}

#[async_trait(?Send)]
impl<E: Entity, G: Gateway<E> + ?Sized> Gateway<E> for Rc<G> {
    async fn list(&self) -> GatewayResult<Vec<E>> {
        (**self).list().await
    }

    async fn create(&self, payload: &E) -> GatewayResult<E> {
        (**self).create(payload).await
    }

    async fn update(&self, id: EntityId, payload: &E) -> GatewayResult<E> {
        (**self).update(id, payload).await
    }

    async fn delete(&self, id: EntityId) -> GatewayResult<()> {
        (**self).delete(id).await
    }
}
