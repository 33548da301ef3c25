//! Student Entity
//!
//! Students enrol on a degree at a level and pick optional modules offered
//! for exactly that degree and level.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::draft::Draft;
use crate::schema::{
    is_unassigned, Cascade, Entity, EntityId, FieldKind, FieldSpec, OptionRule, Schema, UNASSIGNED_ID,
};

static SCHEMA: Schema = Schema {
    resource: "students",
    label: "Student",
    fields: &[
        FieldSpec::required("name", FieldKind::Text),
        FieldSpec::required("email", FieldKind::Text),
        FieldSpec::required("degree_name", FieldKind::Text),
        FieldSpec::required("level", FieldKind::Text),
        FieldSpec::optional("status", FieldKind::Text),
        FieldSpec::optional("optional_modules", FieldKind::List),
    ],
    cascades: &[
        Cascade { parent: "degree_name", dependents: &["optional_modules"] },
        Cascade { parent: "level", dependents: &["optional_modules"] },
    ],
    options: &[
        OptionRule {
            field: "degree_name",
            source: "degrees",
            value_attribute: "code",
            label_attribute: "name",
            constraints: &[],
            flag: None,
        },
        OptionRule {
            field: "optional_modules",
            source: "modules",
            value_attribute: "code",
            label_attribute: "name",
            constraints: &[("degree_name", "degree_name"), ("level", "level")],
            flag: Some("is_optional"),
        },
    ],
    search: &["name"],
    facets: &["level", "status", "degree_name"],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default, skip_serializing_if = "is_unassigned")]
    pub id: EntityId,
    pub name: String,
    pub email: String,
    /// Code of the enrolled degree
    pub degree_name: String,
    pub level: String,
    /// `active`, `inactive` or `graduated`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub optional_modules: Vec<String>,
}

impl Student {
    fn fixture(id: EntityId, name: &str, email: &str, degree_name: &str, level: &str, modules: &[&str]) -> Self {
        Self {
            id,
            name: name.to_string(),
            email: email.to_string(),
            degree_name: degree_name.to_string(),
            level: level.to_string(),
            status: Some("active".to_string()),
            optional_modules: modules.iter().map(|code| code.to_string()).collect(),
        }
    }
}

impl Entity for Student {
    fn schema() -> &'static Schema {
        &SCHEMA
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn with_id(self, id: EntityId) -> Self {
        Self { id, ..self }
    }

    fn attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "name" => Some(Cow::Borrowed(&self.name)),
            "email" => Some(Cow::Borrowed(&self.email)),
            "degree_name" => Some(Cow::Borrowed(&self.degree_name)),
            "level" => Some(Cow::Borrowed(&self.level)),
            "status" => self.status.as_deref().map(Cow::Borrowed),
            "optional_modules" => Some(Cow::Owned(self.optional_modules.join(","))),
            _ => None,
        }
    }

    fn to_draft(&self) -> Draft {
        Draft::empty(&SCHEMA)
            .with_text("name", self.name.as_str())
            .with_text("email", self.email.as_str())
            .with_text("degree_name", self.degree_name.as_str())
            .with_text("level", self.level.as_str())
            .with_optional_text("status", self.status.as_deref())
            .with_list("optional_modules", self.optional_modules.clone())
    }

    fn from_draft(draft: &Draft) -> Result<Self, Vec<&'static str>> {
        Ok(Self {
            id: UNASSIGNED_ID,
            name: draft.text("name").to_string(),
            email: draft.text("email").to_string(),
            degree_name: draft.text("degree_name").to_string(),
            level: draft.text("level").to_string(),
            status: draft.optional_text("status"),
            optional_modules: draft.list("optional_modules"),
        })
    }

    fn fixtures() -> Vec<Self> {
        vec![
            Self::fixture(1, "Ada Lovelace", "ada@example.edu", "BSC-CS", "UG", &["CS210"]),
            Self::fixture(2, "Alan Turing", "alan@example.edu", "MSC-DS", "PG", &["DS520"]),
            Self::fixture(3, "Emmy Noether", "emmy@example.edu", "BSC-MATH", "UG", &[]),
        ]
    }
}
