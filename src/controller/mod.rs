//! Resource Collection Controller
//!
//! One parametric controller per managed resource: owns the collection
//! store and filters, hands out form sessions and delete dialogs, and
//! drives the gateway for loads and mutations.
//!
//! Everything runs on one thread. State lives behind `RefCell`s and no
//! borrow is ever held across a gateway await, so overlapping operations
//! (a reload racing a submit, references arriving mid-edit) interleave
//! safely.


use std::cell::{Ref, RefCell};
use std::marker::PhantomData;
use std::rc::Rc;

use crate::config::{AdminConfig, AuthFallback};
use crate::confirm::{ConfirmationGate, DeleteDialog, DEFAULT_CONFIRM_LITERAL};
use crate::context::AuthContext;
use crate::error::ControllerError;
use crate::events::EventSink;
use crate::filter::{self, FilterSet};
use crate::form::{FormSession, ReferenceSet};
use crate::gateway::{Failure, FailureKind, Gateway, GatewayResult, ReferenceRecord, ReferenceSource};
use crate::mutation::{MutationCoordinator, Origin, Persisted, SubmitRequest};
use crate::schema::{Entity, EntityId};
use crate::store::{CollectionStore, LoadOutcome, LoadStatus};

pub type FormHandle<E> = Rc<RefCell<FormSession<E>>>;
pub type DialogHandle = Rc<RefCell<DeleteDialog>>;

type SourceList = Vec<(&'static str, Rc<dyn ReferenceSource>)>;

// ========================
// Options & Builder
// ========================

/// Policy knobs shared by every controller of one console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    pub fallback: AuthFallback,
    pub confirm_literal: String,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            fallback: AuthFallback::default(),
            confirm_literal: DEFAULT_CONFIRM_LITERAL.to_string(),
        }
    }
}

impl From<&AdminConfig> for ControllerOptions {
    fn from(config: &AdminConfig) -> Self {
        Self {
            fallback: config.auth_fallback,
            confirm_literal: config.confirm_literal.clone(),
        }
    }
}

pub struct ControllerBuilder<E, G> {
    gateway: G,
    auth: Rc<AuthContext>,
    events: Rc<dyn EventSink>,
    options: ControllerOptions,
    sources: SourceList,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, G: Gateway<E>> ControllerBuilder<E, G> {
    pub fn options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn fallback(mut self, fallback: AuthFallback) -> Self {
        self.options.fallback = fallback;
        self
    }

    pub fn confirm_literal(mut self, literal: impl Into<String>) -> Self {
        self.options.confirm_literal = literal.into();
        self
    }

    /// Register the reference collection named `source` by option rules
    pub fn reference(mut self, source: &'static str, loader: Rc<dyn ReferenceSource>) -> Self {
        self.sources.retain(|(name, _)| *name != source);
        self.sources.push((source, loader));
        self
    }

    pub fn build(self) -> ResourceController<E, G> {
        let schema = E::schema();
        let needed = schema.reference_sources();
        for source in &needed {
            if !self.sources.iter().any(|(name, _)| name == source) {
                log::warn!("[CONTROLLER] {} has no loader for reference '{}'; its options stay empty", schema.resource, source);
            }
        }
        let sources: SourceList = self
            .sources
            .into_iter()
            .filter(|(name, _)| needed.contains(name))
            .collect();

        ResourceController {
            inner: Rc::new(Inner {
                gateway: self.gateway,
                auth: self.auth,
                store: RefCell::new(CollectionStore::new()),
                filters: RefCell::new(FilterSet::for_entity::<E>()),
                references: Rc::new(RefCell::new(ReferenceSet::new())),
                sources,
                coordinator: MutationCoordinator::new(self.options.fallback, self.events),
                gate: ConfirmationGate::new(self.options.confirm_literal),
            }),
        }
    }
}

// ========================
// Controller
// ========================

struct Inner<E, G> {
    gateway: G,
    auth: Rc<AuthContext>,
    store: RefCell<CollectionStore<E>>,
    filters: RefCell<FilterSet>,
    references: Rc<RefCell<ReferenceSet>>,
    sources: SourceList,
    coordinator: MutationCoordinator,
    gate: ConfirmationGate,
}

/// Cheap to clone; clones share one store
pub struct ResourceController<E, G> {
    inner: Rc<Inner<E, G>>,
}

impl<E, G> Clone for ResourceController<E, G> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

/// A new form plus, while any reference collection is still unloaded,
/// the loads the caller should drive
pub struct FormStart<E> {
    pub form: FormHandle<E>,
    pub references: Option<ReferenceLoad>,
}

/// Sequential loader for a controller's reference collections
///
/// A source is claimed only when `run` reaches it. Dropping the loader
/// (or the `run` future mid-fetch) leaves the source unloaded, and the
/// next `start_form` hands out a fresh loader for it.
pub struct ReferenceLoad {
    references: Rc<RefCell<ReferenceSet>>,
    sources: SourceList,
}

impl ReferenceLoad {
    pub fn sources(&self) -> Vec<&'static str> {
        self.sources.iter().map(|(name, _)| *name).collect()
    }

    pub async fn run(self) {
        for (name, loader) in self.sources {
            if !self.references.borrow().needs_load(name) {
                log::debug!("[CONTROLLER] reference '{}' already claimed", name);
                continue;
            }
            self.references.borrow_mut().mark_pending(name);
            let claim = Claim { references: &self.references, name };
            let result = loader.list().await;
            claim.resolve(result);
        }
    }
}

/// In-flight reference fetch; released again if dropped unresolved
struct Claim<'a> {
    references: &'a RefCell<ReferenceSet>,
    name: &'static str,
}

impl Claim<'_> {
    fn resolve(self, result: GatewayResult<Vec<ReferenceRecord>>) {
        self.references.borrow_mut().resolve(self.name, result);
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if let Ok(mut references) = self.references.try_borrow_mut() {
            references.release(self.name);
        }
    }
}

impl<E: Entity, G: Gateway<E>> ResourceController<E, G> {
    pub fn builder(gateway: G, auth: Rc<AuthContext>, events: Rc<dyn EventSink>) -> ControllerBuilder<E, G> {
        ControllerBuilder {
            gateway,
            auth,
            events,
            options: ControllerOptions::default(),
            sources: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// Signed-out contexts fail as unauthorized without touching the backend
    fn session(&self) -> GatewayResult<()> {
        if self.inner.auth.is_authenticated() {
            Ok(())
        } else {
            Err(Failure::unauthorized(Some("Not signed in".to_string())))
        }
    }

    // ========================
    // Collection
    // ========================

    /// Fetch the full collection. Only the most recently issued load applies.
    pub async fn load(&self) -> LoadOutcome {
        let ticket = self.inner.store.borrow_mut().begin_load();
        log::info!("[CONTROLLER] loading {}", E::schema().resource);

        let result = match self.session() {
            Ok(()) => self.inner.gateway.list().await,
            Err(failure) => Err(failure),
        };

        let outcome = self
            .inner
            .store
            .borrow_mut()
            .finish_load(ticket, result, self.inner.coordinator.fallback());
        self.inner.coordinator.after_load::<E>(&outcome);
        outcome
    }

    pub fn store(&self) -> Ref<'_, CollectionStore<E>> {
        self.inner.store.borrow()
    }

    pub fn entities(&self) -> Vec<E> {
        self.inner.store.borrow().entities().to_vec()
    }

    pub fn get(&self, id: EntityId) -> Option<E> {
        self.inner.store.borrow().get(id).cloned()
    }

    pub fn status(&self) -> LoadStatus {
        self.inner.store.borrow().status()
    }

    pub fn last_error(&self) -> Option<FailureKind> {
        self.inner.store.borrow().last_error()
    }

    // ========================
    // Filters
    // ========================

    /// Entities passing the current filters, in collection order
    pub fn visible(&self) -> Vec<E> {
        let store = self.inner.store.borrow();
        let filters = self.inner.filters.borrow();
        filter::visible(store.entities(), &filters).into_iter().cloned().collect()
    }

    pub fn filters(&self) -> FilterSet {
        self.inner.filters.borrow().clone()
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.inner.filters.borrow_mut().set_query(query);
    }

    pub fn set_facet(&self, key: &str, value: impl Into<String>) -> bool {
        self.inner.filters.borrow_mut().set_facet(key, value)
    }

    pub fn clear_filters(&self) {
        self.inner.filters.borrow_mut().clear();
    }

    // ========================
    // Forms
    // ========================

    pub fn start_form(&self, initial: Option<&E>) -> FormStart<E> {
        let form = Rc::new(RefCell::new(FormSession::start(initial, Rc::clone(&self.inner.references))));
        FormStart { form, references: self.take_reference_load() }
    }

    /// Edit form seeded from the stored entity
    pub fn edit_form(&self, id: EntityId) -> Option<FormStart<E>> {
        let entity = self.get(id)?;
        Some(self.start_form(Some(&entity)))
    }

    /// Loader for every source not yet loaded or in flight
    fn take_reference_load(&self) -> Option<ReferenceLoad> {
        let sources: SourceList = {
            let references = self.inner.references.borrow();
            self.inner
                .sources
                .iter()
                .filter(|(name, _)| references.needs_load(name))
                .cloned()
                .collect()
        };
        if sources.is_empty() {
            return None;
        }
        let load = ReferenceLoad {
            references: Rc::clone(&self.inner.references),
            sources,
        };
        log::debug!("[CONTROLLER] {} reference loads issued: {:?}", E::schema().resource, load.sources());
        Some(load)
    }

    /// Validate, send, and fold the result into the store
    pub async fn submit(&self, form: &RefCell<FormSession<E>>) -> Result<Persisted<E>, ControllerError> {
        let request = self.inner.coordinator.begin_submit(&mut *form.borrow_mut())?;

        let result = match (self.session(), &request) {
            (Err(failure), _) => Err(failure),
            (Ok(()), SubmitRequest::Create(payload)) => self.inner.gateway.create(payload).await,
            (Ok(()), SubmitRequest::Update(id, payload)) => self.inner.gateway.update(*id, payload).await,
        };

        let mut store = self.inner.store.borrow_mut();
        self.inner
            .coordinator
            .finish_submit(&mut *form.borrow_mut(), &mut *store, request, result)
    }

    // ========================
    // Delete
    // ========================

    pub fn open_delete(&self, id: EntityId) -> DialogHandle {
        Rc::new(RefCell::new(DeleteDialog::open(id, self.inner.gate.clone())))
    }

    /// No gateway call unless the dialog's token unlocks the gate
    pub async fn delete(&self, dialog: &RefCell<DeleteDialog>) -> Result<Origin, ControllerError> {
        let id = self.inner.coordinator.begin_remove(&mut *dialog.borrow_mut())?;

        let result = match self.session() {
            Ok(()) => self.inner.gateway.delete(id).await,
            Err(failure) => Err(failure),
        };

        let mut store = self.inner.store.borrow_mut();
        self.inner
            .coordinator
            .finish_remove(&mut *dialog.borrow_mut(), &mut *store, result)
    }
}
