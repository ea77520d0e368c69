//! Declarative admin configuration and the changelist it drives.
//!
//! Each registered model declares which fields the list view shows, which are
//! searched and filtered, and its default ordering. The changelist works on the
//! serialized JSON form of the records, so the same configuration applies to
//! any entity without per-model code.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::DateTime;
use serde::Serialize;
use serde_json::{Map, Value};

/// Query parameter carrying the search terms.
pub const SEARCH_PARAM: &str = "q";

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelAdmin {
    /// URL segment under `/admin/`.
    pub model: &'static str,
    pub verbose_name: &'static str,
    pub list_display: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    /// Field names, `-` prefix for descending.
    pub ordering: &'static [&'static str],
}

pub const CATEGORY_ADMIN: ModelAdmin = ModelAdmin {
    model: "categories",
    verbose_name: "category",
    list_display: &["name", "created_at"],
    search_fields: &["name"],
    list_filter: &[],
    ordering: &["name"],
};

pub const BLOG_ADMIN: ModelAdmin = ModelAdmin {
    model: "blogs",
    verbose_name: "blog",
    list_display: &["title", "author", "published_date", "is_published"],
    search_fields: &["title", "author"],
    list_filter: &["is_published", "category"],
    ordering: &["-published_date"],
};

pub const REGISTRY: &[ModelAdmin] = &[CATEGORY_ADMIN, BLOG_ADMIN];

#[derive(Debug, Serialize)]
pub struct ChangeList {
    pub model: &'static str,
    pub count: usize,
    pub results: Vec<Map<String, Value>>,
}

impl ModelAdmin {
    /// Searches, filters, orders and projects serialized records.
    /// Parameters that are neither the search term nor a declared filter are ignored.
    pub fn changelist(&self, records: Vec<Value>, params: &HashMap<String, String>) -> ChangeList {
        let terms: Vec<String> = params
            .get(SEARCH_PARAM)
            .map(|q| q.split_whitespace().map(str::to_lowercase).collect())
            .unwrap_or_default();
        let filters: Vec<(&str, &str)> = self
            .list_filter
            .iter()
            .filter_map(|field| params.get(*field).map(|v| (*field, v.as_str())))
            .collect();

        let mut records: Vec<Value> = records
            .into_iter()
            .filter(|record| self.matches_search(record, &terms))
            .filter(|record| {
                filters
                    .iter()
                    .all(|(field, expected)| filter_matches(&record[*field], expected))
            })
            .collect();
        records.sort_by(|a, b| self.compare(a, b));

        let results: Vec<Map<String, Value>> =
            records.iter().map(|record| self.project(record)).collect();
        ChangeList {
            model: self.model,
            count: results.len(),
            results,
        }
    }

    /// Every term has to appear, case-insensitively, in at least one search field.
    fn matches_search(&self, record: &Value, terms: &[String]) -> bool {
        terms.iter().all(|term| {
            self.search_fields.iter().any(|field| {
                record[*field]
                    .as_str()
                    .is_some_and(|text| text.to_lowercase().contains(term.as_str()))
            })
        })
    }

    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        self.ordering
            .iter()
            .map(|key| match key.strip_prefix('-') {
                Some(field) => compare_values(&b[field], &a[field]),
                None => compare_values(&a[*key], &b[*key]),
            })
            .chain(std::iter::once(compare_values(&b["id"], &a["id"])))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    fn project(&self, record: &Value) -> Map<String, Value> {
        std::iter::once("id")
            .chain(self.list_display.iter().copied())
            .map(|field| (field.to_string(), record[field].clone()))
            .collect()
    }
}

fn filter_matches(value: &Value, expected: &str) -> bool {
    match value {
        Value::Bool(b) => match expected.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => *b,
            "0" | "false" | "no" => !*b,
            _ => false,
        },
        Value::Number(n) => n.to_string() == expected.trim(),
        Value::String(s) => s == expected,
        _ => false,
    }
}

/// Orders timestamps chronologically rather than by their textual form.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn blogs() -> Vec<Value> {
        vec![
            json!({"id": 1, "title": "Intro to Rust", "author": "Ferris", "description": "x",
                   "published_date": "2024-03-01T09:00:00Z", "is_published": true, "category": 1}),
            json!({"id": 2, "title": "Async in depth", "author": "Tokio Team", "description": "y",
                   "published_date": "2024-05-01T09:00:00.5Z", "is_published": false, "category": 2}),
            json!({"id": 3, "title": "Rust traits", "author": "Ada", "description": "z",
                   "published_date": "2024-05-01T09:00:00Z", "is_published": true, "category": 2}),
        ]
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn ids(list: &ChangeList) -> Vec<i64> {
        list.results
            .iter()
            .map(|row| row["id"].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn blogs_default_to_newest_first() {
        let list = BLOG_ADMIN.changelist(blogs(), &HashMap::new());
        assert_eq!(ids(&list), [2, 3, 1]);
        assert_eq!(list.count, 3);
    }

    #[test]
    fn projection_keeps_id_and_list_display_only() {
        let list = BLOG_ADMIN.changelist(blogs(), &HashMap::new());
        let keys: Vec<&str> = list.results[0].keys().map(String::as_str).collect();
        assert_eq!(
            keys.len(),
            1 + BLOG_ADMIN.list_display.len(),
            "unexpected columns {keys:?}"
        );
        assert!(!list.results[0].contains_key("description"));
    }

    #[rstest]
    #[case("rust", vec![3, 1])]
    #[case("RUST traits", vec![3])]
    #[case("ferris", vec![1])]
    #[case("tokio async", vec![2])]
    #[case("nothing", vec![])]
    fn search_matches_title_or_author(#[case] q: &str, #[case] expected: Vec<i64>) {
        let list = BLOG_ADMIN.changelist(blogs(), &params(&[("q", q)]));
        assert_eq!(ids(&list), expected);
    }

    #[rstest]
    #[case(vec![("is_published", "true")], vec![3, 1])]
    #[case(vec![("is_published", "0")], vec![2])]
    #[case(vec![("category", "2")], vec![2, 3])]
    #[case(vec![("category", "2"), ("is_published", "1")], vec![3])]
    #[case(vec![("description", "x")], vec![2, 3, 1])]
    fn filters_only_apply_to_declared_fields(
        #[case] query: Vec<(&str, &str)>,
        #[case] expected: Vec<i64>,
    ) {
        let list = BLOG_ADMIN.changelist(blogs(), &params(&query));
        assert_eq!(ids(&list), expected);
    }

    #[test]
    fn categories_sort_by_name() {
        let records = vec![
            json!({"id": 1, "name": "web", "created_at": "2024-01-01T00:00:00Z"}),
            json!({"id": 2, "name": "async", "created_at": "2024-01-02T00:00:00Z"}),
            json!({"id": 3, "name": "systems", "created_at": "2024-01-03T00:00:00Z"}),
        ];
        let list = CATEGORY_ADMIN.changelist(records, &HashMap::new());
        assert_eq!(ids(&list), [2, 3, 1]);
    }
}
