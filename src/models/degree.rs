//! Degree Entity

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::draft::Draft;
use crate::schema::{is_unassigned, Entity, EntityId, FieldKind, FieldSpec, Schema, UNASSIGNED_ID};

static SCHEMA: Schema = Schema {
    resource: "degrees",
    label: "Degree",
    fields: &[
        FieldSpec::required("name", FieldKind::Text),
        FieldSpec::required("code", FieldKind::Text),
        FieldSpec::required("level", FieldKind::Text),
        FieldSpec::required("department", FieldKind::Text),
        FieldSpec::optional("description", FieldKind::Text),
        FieldSpec::optional("duration_years", FieldKind::Count),
    ],
    cascades: &[],
    options: &[],
    // No department: a degree must not match on its department's name
    search: &["name", "code", "description"],
    facets: &["level", "department"],
};

/// A degree programme offered by a department
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Degree {
    #[serde(default, skip_serializing_if = "is_unassigned")]
    pub id: EntityId,
    pub name: String,
    pub code: String,
    /// `UG` or `PG`
    pub level: String,
    pub department: String,
    pub description: Option<String>,
    pub duration_years: Option<u32>,
}

impl Degree {
    pub fn new(name: &str, code: &str, level: &str, department: &str) -> Self {
        Self {
            id: UNASSIGNED_ID,
            name: name.to_string(),
            code: code.to_string(),
            level: level.to_string(),
            department: department.to_string(),
            description: None,
            duration_years: None,
        }
    }

    fn fixture(id: EntityId, name: &str, code: &str, level: &str, department: &str, years: u32) -> Self {
        Self {
            duration_years: Some(years),
            ..Self::new(name, code, level, department).with_id(id)
        }
    }
}

impl Entity for Degree {
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
            "level" => Some(Cow::Borrowed(&self.level)),
            "department" => Some(Cow::Borrowed(&self.department)),
            "description" => self.description.as_deref().map(Cow::Borrowed),
            "duration_years" => self.duration_years.map(|years| Cow::Owned(years.to_string())),
            _ => None,
        }
    }

    fn to_draft(&self) -> Draft {
        Draft::empty(&SCHEMA)
            .with_text("name", self.name.as_str())
            .with_text("code", self.code.as_str())
            .with_text("level", self.level.as_str())
            .with_text("department", self.department.as_str())
            .with_optional_text("description", self.description.as_deref())
            .with_count("duration_years", self.duration_years)
    }

    fn from_draft(draft: &Draft) -> Result<Self, Vec<&'static str>> {
        Ok(Self {
            id: UNASSIGNED_ID,
            name: draft.text("name").to_string(),
            code: draft.text("code").to_string(),
            level: draft.text("level").to_string(),
            department: draft.text("department").to_string(),
            description: draft.optional_text("description"),
            duration_years: draft.count("duration_years"),
        })
    }

    fn fixtures() -> Vec<Self> {
        vec![
            Self::fixture(1, "Computer Science", "BSC-CS", "UG", "Computer Science", 3),
            Self::fixture(2, "Data Science", "MSC-DS", "PG", "Computer Science", 1),
            Self::fixture(3, "Applied Mathematics", "BSC-MATH", "UG", "Mathematics", 3),
            Self::fixture(4, "Software Engineering", "MSC-SE", "PG", "Computer Science", 1),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_roundtrip_keeps_fields() {
        let degree = Degree {
            description: Some("Three-year programme".to_string()),
            ..Degree::fixtures()[0].clone()
        };
        let rebuilt = Degree::from_draft(&degree.to_draft()).unwrap().with_id(degree.id);
        assert_eq!(rebuilt, degree);
    }

    #[test]
    fn test_negative_duration_fails_validation() {
        let draft = Degree::fixtures()[0].to_draft().with_text("duration_years", "-2");
        assert_eq!(Degree::schema().validate(&draft), vec!["duration_years"]);

        let blank = Degree::fixtures()[0].to_draft().with_text("duration_years", "");
        assert!(Degree::schema().validate(&blank).is_empty());
        assert_eq!(Degree::from_draft(&blank).unwrap().duration_years, None);
    }

    #[test]
    fn test_absent_description_has_no_attribute() {
        let degree = Degree::new("Physics", "BSC-PHY", "UG", "Physics");
        assert_eq!(degree.attribute("description"), None);
        assert_eq!(degree.attribute("department").as_deref(), Some("Physics"));
    }
}
