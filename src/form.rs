//! Form Session
//!
//! One create-or-edit draft with dependent-field cascading, option
//! resolution against side-loaded reference collections, and validation.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::draft::{Draft, FieldValue};
use crate::error::ControllerError;
use crate::gateway::{Failure, GatewayResult, ReferenceRecord};
use crate::mutation::MutationState;
use crate::schema::{Entity, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(EntityId),
}

/// One selectable value for a form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionItem {
    pub value: String,
    pub label: String,
}

// ========================
// Reference Collections
// ========================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceState {
    Pending,
    Ready(Vec<ReferenceRecord>),
    Failed(Failure),
}

/// Side-loaded reference collections, shared by every form of a screen
#[derive(Debug, Default)]
pub struct ReferenceSet {
    entries: BTreeMap<&'static str, ReferenceState>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, source: &str) -> Option<&ReferenceState> {
        self.entries.get(source)
    }

    pub fn mark_pending(&mut self, source: &'static str) {
        self.entries.insert(source, ReferenceState::Pending);
    }

    /// Never requested, abandoned, or failed
    pub fn needs_load(&self, source: &str) -> bool {
        matches!(self.entries.get(source), None | Some(ReferenceState::Failed(_)))
    }

    /// Forget a pending load that will never resolve
    pub fn release(&mut self, source: &str) {
        if matches!(self.entries.get(source), Some(ReferenceState::Pending)) {
            self.entries.remove(source);
        }
    }

    pub fn resolve(&mut self, source: &'static str, result: GatewayResult<Vec<ReferenceRecord>>) {
        let state = match result {
            Ok(records) => {
                log::debug!("[FORM] reference '{}' ready ({} records)", source, records.len());
                ReferenceState::Ready(records)
            }
            Err(failure) => {
                log::warn!("[FORM] reference '{}' failed: {}", source, failure);
                ReferenceState::Failed(failure)
            }
        };
        self.entries.insert(source, state);
    }

    /// Records of a loaded collection; `None` while unresolved
    pub fn records(&self, source: &str) -> Option<&[ReferenceRecord]> {
        match self.entries.get(source) {
            Some(ReferenceState::Ready(records)) => Some(records),
            _ => None,
        }
    }
}

// ========================
// Session
// ========================

#[derive(Debug)]
pub struct FormSession<E> {
    mode: FormMode,
    draft: Draft,
    references: Rc<RefCell<ReferenceSet>>,
    state: MutationState,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> FormSession<E> {
    /// Empty draft for `None`, deep copy of the entity otherwise
    pub fn start(initial: Option<&E>, references: Rc<RefCell<ReferenceSet>>) -> Self {
        let (mode, draft) = match initial {
            Some(entity) => (FormMode::Edit(entity.id()), entity.to_draft()),
            None => (FormMode::Create, Draft::empty(E::schema())),
        };
        log::debug!("[FORM] {} session started in {:?} mode", E::schema().resource, mode);
        Self {
            mode,
            draft,
            references,
            state: MutationState::Idle,
            _entity: PhantomData,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn state(&self) -> MutationState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == MutationState::Submitting
    }

    pub(crate) fn set_state(&mut self, state: MutationState) {
        self.state = state;
    }

    /// Apply one field change. Updating a cascade parent empties its
    /// dependents in the same step; the emptied field names are returned.
    pub fn update(
        &mut self,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<Vec<&'static str>, ControllerError> {
        let schema = E::schema();
        let spec = schema
            .field(field)
            .ok_or_else(|| ControllerError::UnknownField(field.to_string()))?;

        self.draft.set(spec.name, value.into());

        let dependents = schema.dependents_of(spec.name);
        for dependent in &dependents {
            if let Some(dependent_spec) = schema.field(dependent) {
                self.draft.set(dependent_spec.name, dependent_spec.kind.empty());
            }
        }
        if !dependents.is_empty() {
            log::debug!("[FORM] '{}' changed, reset {:?}", spec.name, dependents);
        }
        Ok(dependents)
    }

    /// Valid values for `field` given the current draft
    ///
    /// Empty while the backing reference collection is unresolved, when a
    /// constraining parent field is still blank, or when the field has no
    /// option rule.
    pub fn available_options(&self, field: &str) -> Vec<OptionItem> {
        let Some(rule) = E::schema().option_rule(field) else {
            return Vec::new();
        };
        let references = self.references.borrow();
        let Some(records) = references.records(rule.source) else {
            return Vec::new();
        };

        let mut wanted = Vec::with_capacity(rule.constraints.len());
        for (draft_field, attribute) in rule.constraints {
            let value = self.draft.text(draft_field);
            if value.is_empty() {
                return Vec::new();
            }
            wanted.push((*attribute, value));
        }

        records
            .iter()
            .filter(|record| wanted.iter().all(|(attribute, value)| record.get(attribute) == Some(*value)))
            .filter(|record| rule.flag.map_or(true, |flag| record.get(flag) == Some("true")))
            .filter_map(|record| {
                let value = record.get(rule.value_attribute)?;
                let label = record.get(rule.label_attribute).unwrap_or(value);
                Some(OptionItem { value: value.to_string(), label: label.to_string() })
            })
            .collect()
    }

    /// Violated field names, in schema order
    pub fn validate(&self) -> Vec<&'static str> {
        E::schema().validate(&self.draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseModule, Degree, Student};

    fn loaded_references() -> Rc<RefCell<ReferenceSet>> {
        let mut set = ReferenceSet::new();
        set.resolve("degrees", Ok(Degree::fixtures().iter().map(Entity::reference).collect()));
        set.resolve("modules", Ok(CourseModule::fixtures().iter().map(Entity::reference).collect()));
        Rc::new(RefCell::new(set))
    }

    fn values(options: Vec<OptionItem>) -> Vec<String> {
        options.into_iter().map(|option| option.value).collect()
    }

    #[test]
    fn test_start_modes() {
        let refs = Rc::new(RefCell::new(ReferenceSet::new()));
        let create: FormSession<Student> = FormSession::start(None, refs.clone());
        assert_eq!(create.mode(), FormMode::Create);
        assert_eq!(create.draft().text("name"), "");

        let student = Student::fixtures()[1].clone();
        let edit = FormSession::start(Some(&student), refs);
        assert_eq!(edit.mode(), FormMode::Edit(2));
        assert_eq!(edit.draft().text("name"), "Alan Turing");
        assert_eq!(edit.state(), MutationState::Idle);
    }

    #[test]
    fn test_parent_change_resets_dependents() {
        let mut form: FormSession<Student> = FormSession::start(None, loaded_references());
        form.update("degree_name", "BSC-CS").unwrap();
        form.update("optional_modules", vec!["m1", "m2"]).unwrap();

        let reset = form.update("degree_name", "MSC-DS").unwrap();

        assert_eq!(reset, vec!["optional_modules"]);
        assert_eq!(form.draft().get("optional_modules"), Some(&FieldValue::List(vec![])));
        assert_eq!(form.draft().text("degree_name"), "MSC-DS");
    }

    #[test]
    fn test_reset_happens_even_for_same_parent_value() {
        let mut form: FormSession<Student> = FormSession::start(Some(&Student::fixtures()[0]), loaded_references());
        form.update("level", "UG").unwrap();
        assert!(form.draft().list("optional_modules").is_empty());
    }

    #[test]
    fn test_non_parent_update_keeps_other_fields() {
        let mut form: FormSession<Student> = FormSession::start(Some(&Student::fixtures()[0]), loaded_references());
        let reset = form.update("email", "ada@lovelace.dev").unwrap();
        assert!(reset.is_empty());
        assert_eq!(form.draft().list("optional_modules"), vec!["CS210".to_string()]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut form: FormSession<Degree> = FormSession::start(None, loaded_references());
        assert_eq!(form.update("colour", "red"), Err(ControllerError::UnknownField("colour".to_string())));
    }

    #[test]
    fn test_optional_modules_narrowed_by_degree_level_and_flag() {
        let mut form: FormSession<Student> = FormSession::start(None, loaded_references());
        form.update("degree_name", "BSC-CS").unwrap();
        assert!(form.available_options("optional_modules").is_empty());

        form.update("level", "UG").unwrap();
        assert_eq!(values(form.available_options("optional_modules")), vec!["CS210", "CS220"]);

        form.update("level", "PG").unwrap();
        assert!(form.available_options("optional_modules").is_empty());

        form.update("degree_name", "MSC-DS").unwrap();
        let options = form.available_options("optional_modules");
        assert_eq!(values(options.clone()), vec!["DS520"]);
        assert_eq!(options[0].label, "Natural Language Processing");
    }

    #[test]
    fn test_unconstrained_parent_options() {
        let form: FormSession<Student> = FormSession::start(None, loaded_references());
        assert_eq!(values(form.available_options("degree_name")).len(), Degree::fixtures().len());
        assert!(form.available_options("email").is_empty());
    }

    #[test]
    fn test_unresolved_references_yield_no_options() {
        let refs = Rc::new(RefCell::new(ReferenceSet::new()));
        refs.borrow_mut().mark_pending("modules");
        let mut form: FormSession<Student> = FormSession::start(None, refs.clone());
        form.update("degree_name", "BSC-CS").unwrap();
        form.update("level", "UG").unwrap();
        assert!(form.available_options("optional_modules").is_empty());

        refs.borrow_mut().resolve("modules", Err(Failure::from_status(500, None)));
        assert!(form.available_options("optional_modules").is_empty());

        refs.borrow_mut().resolve("modules", Ok(CourseModule::fixtures().iter().map(Entity::reference).collect()));
        assert_eq!(form.available_options("optional_modules").len(), 2);
    }

    #[test]
    fn test_needs_load_until_ready() {
        let mut refs = ReferenceSet::new();
        assert!(refs.needs_load("degrees"));

        refs.mark_pending("degrees");
        assert!(!refs.needs_load("degrees"));
        refs.release("degrees");
        assert!(refs.needs_load("degrees"));

        refs.resolve("degrees", Err(Failure::from_status(500, None)));
        assert!(refs.needs_load("degrees"));
        refs.resolve("degrees", Ok(Vec::new()));
        refs.release("degrees");
        assert!(!refs.needs_load("degrees"));
    }

    #[test]
    fn test_validate_lists_blank_required_fields() {
        let mut form: FormSession<Student> = FormSession::start(None, loaded_references());
        form.update("name", "Grace Hopper").unwrap();
        form.update("email", "   ").unwrap();
        assert_eq!(form.validate(), vec!["email", "degree_name", "level"]);
    }

    #[test]
    fn test_module_department_narrows_degrees() {
        let mut form: FormSession<CourseModule> = FormSession::start(None, loaded_references());
        form.update("department", "Mathematics").unwrap();
        assert_eq!(values(form.available_options("degree_name")), vec!["BSC-MATH"]);

        form.update("degree_name", "BSC-MATH").unwrap();
        form.update("department", "Computer Science").unwrap();
        assert_eq!(form.draft().text("degree_name"), "");
    }
}
