//! Mutation Coordinator
//!
//! Sequences create/update/delete around the gateway call: validation up
//! front, then the success / auth-fallback / failure split afterwards.
//! The coordinator never awaits; the controller drives the gateway between
//! `begin_*` and `finish_*`.

use std::rc::Rc;

use crate::config::AuthFallback;
use crate::confirm::DeleteDialog;
use crate::error::ControllerError;
use crate::events::{EventSink, UiEvent};
use crate::form::{FormMode, FormSession};
use crate::gateway::{Failure, GatewayResult};
use crate::schema::{Entity, EntityId};
use crate::store::{CollectionStore, LoadOutcome};

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
const SESSION_EXPIRED_LOCAL: &str = "Session expired. Changes are shown locally; please sign in again.";
const SESSION_EXPIRED_FIXTURES: &str = "Session expired. Showing sample data; please sign in again.";
const SESSION_EXPIRED: &str = "Session expired. Please sign in again.";

/// Lifecycle of one mutation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Where a mutation's result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Remote,
    /// Applied locally after the backend rejected our credentials
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Persisted<E> {
    pub entity: E,
    pub origin: Origin,
}

/// Validated payload waiting for its gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitRequest<E> {
    Create(E),
    Update(EntityId, E),
}

impl<E> SubmitRequest<E> {
    pub fn payload(&self) -> &E {
        match self {
            SubmitRequest::Create(entity) | SubmitRequest::Update(_, entity) => entity,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            SubmitRequest::Create(_) => "created",
            SubmitRequest::Update(..) => "updated",
        }
    }
}

pub struct MutationCoordinator {
    fallback: AuthFallback,
    events: Rc<dyn EventSink>,
}

impl MutationCoordinator {
    pub fn new(fallback: AuthFallback, events: Rc<dyn EventSink>) -> Self {
        Self { fallback, events }
    }

    pub fn fallback(&self) -> AuthFallback {
        self.fallback
    }

    // ========================
    // Submit
    // ========================

    /// Reject while in flight, validate, then enter `Submitting`
    ///
    /// A validation failure leaves the session state untouched.
    pub fn begin_submit<E: Entity>(
        &self,
        session: &mut FormSession<E>,
    ) -> Result<SubmitRequest<E>, ControllerError> {
        if session.is_submitting() {
            log::debug!("[MUTATION] {} submit rejected: already in flight", E::schema().resource);
            return Err(ControllerError::Busy);
        }

        let violations = session.validate();
        if !violations.is_empty() {
            log::debug!("[MUTATION] {} submit blocked by {:?}", E::schema().resource, violations);
            return Err(ControllerError::Validation(violations));
        }

        let payload = E::from_draft(session.draft()).map_err(ControllerError::Validation)?;
        session.set_state(MutationState::Submitting);
        Ok(match session.mode() {
            FormMode::Create => SubmitRequest::Create(payload),
            FormMode::Edit(id) => SubmitRequest::Update(id, payload.with_id(id)),
        })
    }

    pub fn finish_submit<E: Entity>(
        &self,
        session: &mut FormSession<E>,
        store: &mut CollectionStore<E>,
        request: SubmitRequest<E>,
        result: GatewayResult<E>,
    ) -> Result<Persisted<E>, ControllerError> {
        let label = E::schema().label;
        match result {
            Ok(entity) => {
                log::info!("[MUTATION] {} {} {}", label, entity.id(), request.verb());
                store.upsert(entity.clone());
                session.set_state(MutationState::Succeeded);
                self.events.emit(UiEvent::success(format!("{} {} successfully", label, request.verb())));
                Ok(Persisted { entity, origin: Origin::Remote })
            }
            Err(failure) if failure.is_unauthorized() && self.fallback.uses_fixtures() => {
                let entity = match request {
                    SubmitRequest::Create(entity) => entity.with_id(store.next_local_id()),
                    SubmitRequest::Update(id, entity) => entity.with_id(id),
                };
                log::warn!("[MUTATION] {} {} applied locally after {}", label, entity.id(), failure);
                store.upsert(entity.clone());
                session.set_state(MutationState::Succeeded);
                self.events.emit(UiEvent::info(SESSION_EXPIRED_LOCAL));
                self.events.emit(UiEvent::RedirectToLogin);
                Ok(Persisted { entity, origin: Origin::Fallback })
            }
            Err(failure) => {
                session.set_state(MutationState::Failed);
                Err(self.report_failure(label, failure))
            }
        }
    }

    // ========================
    // Remove
    // ========================

    /// Gate check plus at-most-one in flight. A locked gate is silent.
    pub fn begin_remove(&self, dialog: &mut DeleteDialog) -> Result<EntityId, ControllerError> {
        let id = dialog.begin()?;
        log::debug!("[MUTATION] delete of {} confirmed", id);
        Ok(id)
    }

    pub fn finish_remove<E: Entity>(
        &self,
        dialog: &mut DeleteDialog,
        store: &mut CollectionStore<E>,
        result: GatewayResult<()>,
    ) -> Result<Origin, ControllerError> {
        let label = E::schema().label;
        let id = dialog.target();
        match result {
            Ok(()) => {
                store.remove(id);
                dialog.finish(true);
                log::info!("[MUTATION] {} {} deleted", label, id);
                self.events.emit(UiEvent::success(format!("{} deleted successfully", label)));
                Ok(Origin::Remote)
            }
            Err(failure) if failure.is_unauthorized() && self.fallback.uses_fixtures() => {
                store.remove(id);
                dialog.finish(true);
                log::warn!("[MUTATION] {} {} removed locally after {}", label, id, failure);
                self.events.emit(UiEvent::info(SESSION_EXPIRED_LOCAL));
                self.events.emit(UiEvent::RedirectToLogin);
                Ok(Origin::Fallback)
            }
            Err(failure) => {
                dialog.finish(false);
                Err(self.report_failure(label, failure))
            }
        }
    }

    // ========================
    // Loads
    // ========================

    /// Notifications for a finished collection load
    pub fn after_load<E: Entity>(&self, outcome: &LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded(_) | LoadOutcome::Stale => {}
            LoadOutcome::FellBack(_) => {
                self.events.emit(UiEvent::info(SESSION_EXPIRED_FIXTURES));
                self.events.emit(UiEvent::RedirectToLogin);
            }
            LoadOutcome::Failed(failure) if failure.is_unauthorized() => {
                self.events.emit(UiEvent::error(SESSION_EXPIRED));
                self.events.emit(UiEvent::RedirectToLogin);
            }
            LoadOutcome::Failed(failure) => {
                let message = failure
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("Failed to load {}", E::schema().resource));
                self.events.emit(UiEvent::error(message));
            }
        }
    }

    /// Notify and convert a failure that the fallback policy did not absorb
    fn report_failure(&self, label: &str, failure: Failure) -> ControllerError {
        log::error!("[MUTATION] {} mutation failed: {}", label, failure);
        if failure.is_unauthorized() {
            self.events.emit(UiEvent::error(SESSION_EXPIRED));
            self.events.emit(UiEvent::RedirectToLogin);
            return ControllerError::Authentication(failure.message);
        }
        let message = failure.message.unwrap_or_else(|| GENERIC_FAILURE.to_string());
        self.events.emit(UiEvent::error(message.clone()));
        ControllerError::Transport(message)
    }
}
