//! Timetable Admin UI Core
//!
//! Headless controllers behind the academic-scheduling admin dashboard:
//! resource collections, filtering, dependent-field forms, and guarded
//! mutations against the backend.

pub mod config;
pub mod confirm;
pub mod context;
pub mod controller;
pub mod draft;
pub mod error;
pub mod events;
pub mod filter;
pub mod form;
pub mod gateway;
pub mod models;
pub mod mutation;
pub mod schema;
pub mod store;

pub use config::{AdminConfig, AuthFallback};
pub use confirm::{ConfirmationGate, DeleteDialog};
pub use context::AuthContext;
pub use controller::{ControllerOptions, FormStart, ResourceController};
pub use error::ControllerError;
pub use events::{EventLog, EventSink, UiEvent};
pub use filter::FilterSet;
pub use form::{FormSession, OptionItem};
pub use gateway::{Failure, FailureKind, Gateway, MemoryGateway, RestGateway};
pub use mutation::{MutationState, Origin, Persisted};
pub use schema::{Entity, EntityId, Schema};
pub use store::{CollectionStore, LoadOutcome, LoadStatus};
