//! Filter Pipeline
//!
//! Derives the visible subset of a collection from a free-text query and
//! exact-match facets. All predicates are conjunctive.

use std::collections::BTreeMap;

use crate::schema::{Entity, Schema};

/// User-selected filters for one list screen
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSet {
    query: String,
    facets: BTreeMap<&'static str, String>,
}

impl FilterSet {
    /// Every facet key of the schema, all unconstrained
    pub fn for_schema(schema: &Schema) -> Self {
        Self {
            query: String::new(),
            facets: schema.facets.iter().map(|key| (*key, String::new())).collect(),
        }
    }

    pub fn for_entity<E: Entity>() -> Self {
        Self::for_schema(E::schema())
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn facet(&self, key: &str) -> Option<&str> {
        self.facets.get(key).map(String::as_str)
    }

    /// Returns false (and changes nothing) for keys the schema doesn't offer
    pub fn set_facet(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.facets.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => {
                log::warn!("[FILTER] ignoring unknown facet '{}'", key);
                false
            }
        }
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.facets.values_mut().for_each(String::clear);
    }

    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty() && self.facets.values().all(String::is_empty)
    }

    pub fn matches<E: Entity>(&self, entity: &E) -> bool {
        self.matches_query(entity) && self.matches_facets(entity)
    }

    /// Case-insensitive substring on any of the schema's search fields
    fn matches_query<E: Entity>(&self, entity: &E) -> bool {
        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        E::schema().search.iter().any(|field| {
            entity
                .attribute(field)
                .is_some_and(|value| value.to_lowercase().contains(&needle))
        })
    }

    fn matches_facets<E: Entity>(&self, entity: &E) -> bool {
        self.facets
            .iter()
            .filter(|(_, wanted)| !wanted.is_empty())
            .all(|(key, wanted)| entity.attribute(key).as_deref() == Some(wanted.as_str()))
    }
}

/// Visible subset, in collection order
pub fn visible<'a, E: Entity>(collection: &'a [E], filters: &FilterSet) -> Vec<&'a E> {
    collection.iter().filter(|entity| filters.matches(*entity)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Degree, Student};
    use crate::schema::EntityId;

    fn degree(id: EntityId, name: &str, department: &str, level: &str) -> Degree {
        Degree::new(name, &format!("D{}", id), level, department).with_id(id)
    }

    fn ids(result: Vec<&Degree>) -> Vec<EntityId> {
        result.into_iter().map(|d| d.id).collect()
    }

    #[test]
    fn test_empty_filters_are_identity() {
        let collection = Degree::fixtures();
        let filters = FilterSet::for_entity::<Degree>();
        assert!(filters.is_empty());

        let result: Vec<Degree> = visible(&collection, &filters).into_iter().cloned().collect();
        assert_eq!(result, collection);
    }

    #[test]
    fn test_query_is_case_insensitive_substring() {
        let collection = vec![degree(1, "A", "CS", "UG"), degree(2, "B", "Math", "UG")];
        let mut filters = FilterSet::for_entity::<Degree>();
        filters.set_query("a");
        filters.set_facet("department", "");

        assert_eq!(ids(visible(&collection, &filters)), vec![1]);
    }

    #[test]
    fn test_degree_search_skips_department() {
        let collection = vec![degree(1, "Statistics", "Mathematics", "UG")];
        let mut filters = FilterSet::for_entity::<Degree>();
        filters.set_query("math");
        assert!(visible(&collection, &filters).is_empty());
    }

    #[test]
    fn test_query_searches_code_and_description() {
        let mut described = degree(1, "Physics", "Physics", "UG");
        described.description = Some("Quantum focus".to_string());
        let collection = vec![described, degree(2, "Biology", "Life Sciences", "UG")];
        let mut filters = FilterSet::for_entity::<Degree>();

        filters.set_query("QUANTUM");
        assert_eq!(ids(visible(&collection, &filters)), vec![1]);

        filters.set_query("d2");
        assert_eq!(ids(visible(&collection, &filters)), vec![2]);
    }

    #[test]
    fn test_missing_field_does_not_exclude_entity() {
        // No description, but name still matches
        let collection = vec![degree(1, "History", "Humanities", "UG")];
        let mut filters = FilterSet::for_entity::<Degree>();
        filters.set_query("hist");
        assert_eq!(ids(visible(&collection, &filters)), vec![1]);
    }

    #[test]
    fn test_facets_are_exact_and_conjunctive() {
        let collection = vec![
            degree(1, "A", "CS", "UG"),
            degree(2, "B", "CS", "PG"),
            degree(3, "C", "Math", "PG"),
            degree(4, "D", "cs", "PG"),
        ];
        let mut filters = FilterSet::for_entity::<Degree>();
        filters.set_facet("department", "CS");
        filters.set_facet("level", "PG");

        let result = visible(&collection, &filters);
        assert!(result.iter().all(|d| d.department == "CS" && d.level == "PG"));
        assert_eq!(ids(result), vec![2]);
    }

    #[test]
    fn test_order_is_preserved_regardless_of_filter_order() {
        let collection = vec![
            degree(3, "Alpha", "CS", "UG"),
            degree(1, "Beta", "CS", "UG"),
            degree(2, "Gamma", "CS", "UG"),
        ];
        let mut first = FilterSet::for_entity::<Degree>();
        first.set_query("a");
        first.set_facet("department", "CS");

        let mut second = FilterSet::for_entity::<Degree>();
        second.set_facet("department", "CS");
        second.set_query("a");

        assert_eq!(ids(visible(&collection, &first)), vec![3, 1, 2]);
        assert_eq!(visible(&collection, &first), visible(&collection, &second));
    }

    #[test]
    fn test_unknown_facet_is_rejected() {
        let mut filters = FilterSet::for_entity::<Degree>();
        assert!(!filters.set_facet("status", "active"));
        assert_eq!(filters.facet("status"), None);
        assert!(filters.is_empty());
    }

    #[test]
    fn test_student_status_facet() {
        let mut students = Student::fixtures();
        students[1].status = Some("graduated".to_string());
        let mut filters = FilterSet::for_entity::<Student>();
        filters.set_facet("status", "graduated");

        let result = visible(&students, &filters);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Alan Turing");
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut filters = FilterSet::for_entity::<Degree>();
        filters.set_query("x");
        filters.set_facet("level", "UG");
        filters.clear();
        assert!(filters.is_empty());
        assert_eq!(filters.facet("level"), Some(""));
    }
}
