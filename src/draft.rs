//! Draft
//!
//! Mutable, resource-shaped working copy edited by a form session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::{FieldKind, Schema, Typed};

/// Raw form input for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(value: Vec<&str>) -> Self {
        FieldValue::List(value.into_iter().map(str::to_string).collect())
    }
}

/// Working copy of an entity's fields, keyed by schema field name
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Draft {
    values: BTreeMap<&'static str, FieldValue>,
}

impl Draft {
    /// Every schema field present and empty (create mode)
    pub fn empty(schema: &Schema) -> Self {
        let values = schema
            .fields
            .iter()
            .map(|spec| (spec.name, spec.kind.empty()))
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: &'static str, value: FieldValue) {
        self.values.insert(name, value);
    }

    /// Trimmed text of a field, empty when absent or a list
    pub fn text(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(FieldValue::Text(text)) => text.trim(),
            _ => "",
        }
    }

    /// Trimmed text, `None` when blank
    pub fn optional_text(&self, name: &str) -> Option<String> {
        Some(self.text(name)).filter(|text| !text.is_empty()).map(str::to_string)
    }

    /// Non-blank list items of a field
    pub fn list(&self, name: &str) -> Vec<String> {
        match self.values.get(name).map(|value| FieldKind::List.parse(value)) {
            Some(Ok(Typed::List(items))) => items,
            _ => Vec::new(),
        }
    }

    pub fn count(&self, name: &str) -> Option<u32> {
        match self.values.get(name).map(|value| FieldKind::Count.parse(value)) {
            Some(Ok(Typed::Count(n))) => Some(n),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.values.get(name).map(|value| FieldKind::Flag.parse(value)) {
            Some(Ok(Typed::Flag(flag))) => Some(flag),
            _ => None,
        }
    }

    // ========================
    // Builders (entity -> draft)
    // ========================

    pub fn with_text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.set(name, FieldValue::Text(value.into()));
        self
    }

    pub fn with_optional_text(self, name: &'static str, value: Option<&str>) -> Self {
        self.with_text(name, value.unwrap_or_default())
    }

    pub fn with_count(mut self, name: &'static str, value: Option<u32>) -> Self {
        let typed = value.map_or(Typed::Empty, Typed::Count);
        self.set(name, FieldKind::Count.format(&typed));
        self
    }

    pub fn with_flag(mut self, name: &'static str, value: bool) -> Self {
        self.set(name, FieldKind::Flag.format(&Typed::Flag(value)));
        self
    }

    pub fn with_list(mut self, name: &'static str, items: Vec<String>) -> Self {
        self.set(name, FieldValue::List(items));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let draft = Draft::default()
            .with_text("name", "  Data Science ")
            .with_count("credits", Some(15))
            .with_flag("is_optional", true)
            .with_list("modules", vec!["m1".to_string(), " ".to_string()]);

        assert_eq!(draft.text("name"), "Data Science");
        assert_eq!(draft.count("credits"), Some(15));
        assert_eq!(draft.flag("is_optional"), Some(true));
        assert_eq!(draft.list("modules"), vec!["m1".to_string()]);
        assert_eq!(draft.optional_text("missing"), None);
    }
}
