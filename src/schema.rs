//! Entity Schema
//!
//! Field tables, typed field parsers and the core Entity trait.
//! Every managed resource (degrees, modules, students) describes itself
//! through a static `Schema` so one controller can drive all of them.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::draft::{Draft, FieldValue};
use crate::gateway::ReferenceRecord;

/// Server-assigned entity identifier
pub type EntityId = u32;

/// Placeholder id for entities the server has not persisted yet
pub const UNASSIGNED_ID: EntityId = 0;

/// Serde helper: omit unassigned ids from create payloads
pub fn is_unassigned(id: &EntityId) -> bool {
    *id == UNASSIGNED_ID
}

// ========================
// Field Kinds
// ========================

/// How a draft field is parsed and formatted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Non-negative whole number that fits in a `u32`
    Count,
    Flag,
    List,
}

/// A parsed draft value
#[derive(Debug, Clone, PartialEq)]
pub enum Typed {
    Empty,
    Text(String),
    Count(u32),
    Flag(bool),
    List(Vec<String>),
}

/// Raw draft value that does not parse as its field kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidValue;

impl FieldKind {
    /// Empty value for this kind (what a reset dependent field becomes)
    pub fn empty(self) -> FieldValue {
        match self {
            FieldKind::List => FieldValue::List(Vec::new()),
            _ => FieldValue::Text(String::new()),
        }
    }

    /// Parse a raw draft value. Blank input parses as `Typed::Empty`.
    pub fn parse(self, value: &FieldValue) -> Result<Typed, InvalidValue> {
        match (self, value) {
            (FieldKind::List, FieldValue::List(items)) => {
                let items: Vec<String> = items
                    .iter()
                    .map(|item| item.trim())
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect();
                if items.is_empty() {
                    Ok(Typed::Empty)
                } else {
                    Ok(Typed::List(items))
                }
            }
            (FieldKind::List, FieldValue::Text(_)) => Err(InvalidValue),
            (_, FieldValue::List(_)) => Err(InvalidValue),
            (kind, FieldValue::Text(raw)) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Ok(Typed::Empty);
                }
                match kind {
                    FieldKind::Text => Ok(Typed::Text(raw.to_string())),
                    FieldKind::Count => raw.parse().map(Typed::Count).map_err(|_| InvalidValue),
                    FieldKind::Flag => match raw {
                        "true" => Ok(Typed::Flag(true)),
                        "false" => Ok(Typed::Flag(false)),
                        _ => Err(InvalidValue),
                    },
                    FieldKind::List => Err(InvalidValue),
                }
            }
        }
    }

    /// Format a typed value back into its raw draft form
    pub fn format(self, typed: &Typed) -> FieldValue {
        match typed {
            Typed::Empty => self.empty(),
            Typed::Text(text) => FieldValue::Text(text.clone()),
            Typed::Count(n) => FieldValue::Text(n.to_string()),
            Typed::Flag(flag) => FieldValue::Text(flag.to_string()),
            Typed::List(items) => FieldValue::List(items.clone()),
        }
    }
}

// ========================
// Schema Tables
// ========================

/// One field of a resource form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: true }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false }
    }
}

/// Changing `parent` empties every field in `dependents`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cascade {
    pub parent: &'static str,
    pub dependents: &'static [&'static str],
}

/// Where the valid values of a form field come from
///
/// Options are records of the `source` reference collection whose
/// attributes match the draft for every `(draft field, attribute)` pair in
/// `constraints`, and whose `flag` attribute (if any) is `"true"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionRule {
    pub field: &'static str,
    pub source: &'static str,
    pub value_attribute: &'static str,
    pub label_attribute: &'static str,
    pub constraints: &'static [(&'static str, &'static str)],
    pub flag: Option<&'static str>,
}

/// Static description of one managed resource
#[derive(Debug)]
pub struct Schema {
    /// REST collection path, e.g. `degrees`
    pub resource: &'static str,
    /// Human label used in notifications, e.g. `Degree`
    pub label: &'static str,
    pub fields: &'static [FieldSpec],
    pub cascades: &'static [Cascade],
    pub options: &'static [OptionRule],
    /// Fields matched by the free-text search
    pub search: &'static [&'static str],
    /// Exact-match filter keys offered on the list screen
    pub facets: &'static [&'static str],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Names of violated fields, in schema order
    pub fn validate(&self, draft: &Draft) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|spec| {
                let empty = spec.kind.empty();
                let value = draft.get(spec.name).unwrap_or(&empty);
                match spec.kind.parse(value) {
                    Err(InvalidValue) => true,
                    Ok(Typed::Empty) => spec.required,
                    Ok(_) => false,
                }
            })
            .map(|spec| spec.name)
            .collect()
    }

    /// Every field reset when `parent` changes, following chained cascades
    pub fn dependents_of(&self, parent: &str) -> Vec<&'static str> {
        let mut resets: Vec<&'static str> = Vec::new();
        let mut frontier = vec![parent];
        while let Some(current) = frontier.pop() {
            for cascade in self.cascades.iter().filter(|c| c.parent == current) {
                for &dependent in cascade.dependents {
                    if dependent != parent && !resets.contains(&dependent) {
                        resets.push(dependent);
                        frontier.push(dependent);
                    }
                }
            }
        }
        resets
    }

    pub fn option_rule(&self, field: &str) -> Option<&'static OptionRule> {
        self.options.iter().find(|rule| rule.field == field)
    }

    /// Reference collections needed by this schema's option rules
    pub fn reference_sources(&self) -> Vec<&'static str> {
        let mut sources: Vec<&'static str> = Vec::new();
        for rule in self.options {
            if !sources.contains(&rule.source) {
                sources.push(rule.source);
            }
        }
        sources
    }
}

// ========================
// Entity Trait
// ========================

/// Core trait for all managed resources
pub trait Entity: Clone + Debug + PartialEq + Serialize + DeserializeOwned + 'static {
    fn schema() -> &'static Schema;

    /// Returns the entity's unique identifier
    fn id(&self) -> EntityId;

    /// Same entity carrying a different identifier
    fn with_id(self, id: EntityId) -> Self;

    /// Textual view of one field, used by filters and reference projection
    fn attribute(&self, name: &str) -> Option<Cow<'_, str>>;

    /// Deep copy into an editable draft
    fn to_draft(&self) -> Draft;

    /// Build an unassigned entity from a validated draft
    ///
    /// Fails with the offending field names when a value cannot be held.
    fn from_draft(draft: &Draft) -> Result<Self, Vec<&'static str>>;

    /// Local dataset shown when the backend rejects our credentials
    fn fixtures() -> Vec<Self>;

    /// Project into a reference record for dependent-field resolution
    fn reference(&self) -> ReferenceRecord {
        let attributes: BTreeMap<String, String> = Self::schema()
            .fields
            .iter()
            .filter_map(|spec| {
                self.attribute(spec.name)
                    .map(|value| (spec.name.to_string(), value.into_owned()))
            })
            .collect();
        ReferenceRecord { attributes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SAMPLE: Schema = Schema {
        resource: "samples",
        label: "Sample",
        fields: &[
            FieldSpec::required("name", FieldKind::Text),
            FieldSpec::optional("credits", FieldKind::Count),
            FieldSpec::required("tags", FieldKind::List),
            FieldSpec::optional("active", FieldKind::Flag),
        ],
        cascades: &[
            Cascade { parent: "faculty", dependents: &["department"] },
            Cascade { parent: "department", dependents: &["degree", "modules"] },
        ],
        options: &[],
        search: &["name"],
        facets: &[],
    };

    #[test]
    fn test_parse_count_and_flag() {
        assert_eq!(FieldKind::Count.parse(&" 42 ".into()), Ok(Typed::Count(42)));
        assert_eq!(FieldKind::Count.parse(&"four".into()), Err(InvalidValue));
        assert_eq!(FieldKind::Count.parse(&"-15".into()), Err(InvalidValue));
        assert_eq!(FieldKind::Count.parse(&"4294967296".into()), Err(InvalidValue));
        assert_eq!(FieldKind::Flag.parse(&"true".into()), Ok(Typed::Flag(true)));
        assert_eq!(FieldKind::Flag.parse(&"yes".into()), Err(InvalidValue));
        assert_eq!(FieldKind::Text.parse(&"   ".into()), Ok(Typed::Empty));
    }

    #[test]
    fn test_format_count() {
        assert_eq!(FieldKind::Count.format(&Typed::Count(7)), FieldValue::from("7"));
        assert_eq!(FieldKind::List.format(&Typed::Empty), FieldValue::List(vec![]));
    }

    #[test]
    fn test_list_ignores_blank_items() {
        let value = FieldValue::List(vec![" ".to_string(), "m1".to_string()]);
        assert_eq!(FieldKind::List.parse(&value), Ok(Typed::List(vec!["m1".to_string()])));
        assert_eq!(FieldKind::List.parse(&"m1".into()), Err(InvalidValue));
    }

    #[test]
    fn test_validate_reports_missing_and_unparsable() {
        let draft = Draft::empty(&SAMPLE)
            .with_text("name", "  ")
            .with_text("credits", "ten");
        assert_eq!(SAMPLE.validate(&draft), vec!["name", "credits", "tags"]);

        let draft = Draft::empty(&SAMPLE)
            .with_text("name", "Algebra")
            .with_text("credits", "-15")
            .with_list("tags", vec!["core".to_string()]);
        assert_eq!(SAMPLE.validate(&draft), vec!["credits"]);

        let draft = Draft::empty(&SAMPLE)
            .with_text("name", "Algebra")
            .with_list("tags", vec!["core".to_string()]);
        assert!(SAMPLE.validate(&draft).is_empty());
    }

    #[test]
    fn test_dependents_follow_chains() {
        assert_eq!(SAMPLE.dependents_of("faculty"), vec!["department", "degree", "modules"]);
        assert_eq!(SAMPLE.dependents_of("department"), vec!["degree", "modules"]);
        assert!(SAMPLE.dependents_of("name").is_empty());
    }
}
