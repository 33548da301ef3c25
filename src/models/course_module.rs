//! Course Module Entity
//!
//! A taught module belonging to one degree at one level. Optional modules
//! are the choices offered to students on that degree.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::draft::Draft;
use crate::schema::{
    is_unassigned, Cascade, Entity, EntityId, FieldKind, FieldSpec, OptionRule, Schema, UNASSIGNED_ID,
};

static SCHEMA: Schema = Schema {
    resource: "modules",
    label: "Module",
    fields: &[
        FieldSpec::required("name", FieldKind::Text),
        FieldSpec::required("code", FieldKind::Text),
        FieldSpec::required("department", FieldKind::Text),
        FieldSpec::required("degree_name", FieldKind::Text),
        FieldSpec::required("level", FieldKind::Text),
        FieldSpec::required("credits", FieldKind::Count),
        FieldSpec::optional("is_optional", FieldKind::Flag),
        FieldSpec::optional("description", FieldKind::Text),
    ],
    // A module's degree must belong to its department
    cascades: &[Cascade { parent: "department", dependents: &["degree_name"] }],
    options: &[OptionRule {
        field: "degree_name",
        source: "degrees",
        value_attribute: "code",
        label_attribute: "name",
        constraints: &[("department", "department")],
        flag: None,
    }],
    search: &["name", "code", "department", "description"],
    facets: &["level", "department", "degree_name"],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseModule {
    #[serde(default, skip_serializing_if = "is_unassigned")]
    pub id: EntityId,
    pub name: String,
    pub code: String,
    pub department: String,
    /// Code of the owning degree, e.g. `BSC-CS`
    pub degree_name: String,
    pub level: String,
    pub credits: u32,
    #[serde(default)]
    pub is_optional: bool,
    pub description: Option<String>,
}

impl CourseModule {
    #[allow(clippy::too_many_arguments)]
    fn fixture(
        id: EntityId,
        name: &str,
        code: &str,
        department: &str,
        degree_name: &str,
        level: &str,
        credits: u32,
        is_optional: bool,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            code: code.to_string(),
            department: department.to_string(),
            degree_name: degree_name.to_string(),
            level: level.to_string(),
            credits,
            is_optional,
            description: None,
        }
    }
}

impl Entity for CourseModule {
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
            "code" => Some(Cow::Borrowed(&self.code)),
            "department" => Some(Cow::Borrowed(&self.department)),
            "degree_name" => Some(Cow::Borrowed(&self.degree_name)),
            "level" => Some(Cow::Borrowed(&self.level)),
            "credits" => Some(Cow::Owned(self.credits.to_string())),
            "is_optional" => Some(Cow::Borrowed(if self.is_optional { "true" } else { "false" })),
            "description" => self.description.as_deref().map(Cow::Borrowed),
            _ => None,
        }
    }

    fn to_draft(&self) -> Draft {
        Draft::empty(&SCHEMA)
            .with_text("name", self.name.as_str())
            .with_text("code", self.code.as_str())
            .with_text("department", self.department.as_str())
            .with_text("degree_name", self.degree_name.as_str())
            .with_text("level", self.level.as_str())
            .with_count("credits", Some(self.credits))
            .with_flag("is_optional", self.is_optional)
            .with_optional_text("description", self.description.as_deref())
    }

    fn from_draft(draft: &Draft) -> Result<Self, Vec<&'static str>> {
        let credits = draft.count("credits").ok_or_else(|| vec!["credits"])?;
        Ok(Self {
            id: UNASSIGNED_ID,
            name: draft.text("name").to_string(),
            code: draft.text("code").to_string(),
            department: draft.text("department").to_string(),
            degree_name: draft.text("degree_name").to_string(),
            level: draft.text("level").to_string(),
            credits,
            is_optional: draft.flag("is_optional").unwrap_or(false),
            description: draft.optional_text("description"),
        })
    }

    fn fixtures() -> Vec<Self> {
        vec![
            Self::fixture(1, "Programming Fundamentals", "CS101", "Computer Science", "BSC-CS", "UG", 20, false),
            Self::fixture(2, "Computer Graphics", "CS210", "Computer Science", "BSC-CS", "UG", 15, true),
            Self::fixture(3, "Human-Computer Interaction", "CS220", "Computer Science", "BSC-CS", "UG", 15, true),
            Self::fixture(4, "Machine Learning", "DS501", "Computer Science", "MSC-DS", "PG", 15, false),
            Self::fixture(5, "Natural Language Processing", "DS520", "Computer Science", "MSC-DS", "PG", 15, true),
            Self::fixture(6, "Topology", "MA230", "Mathematics", "BSC-MATH", "UG", 15, true),
        ]
    }
}
