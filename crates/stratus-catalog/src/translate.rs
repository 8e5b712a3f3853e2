//! JSON query → SQL translation.
//!
//! A query is a flat JSON object of equality predicates over catalog
//! columns, plus the reserved `"?"` key selecting name-prefix
//! autocompletion. Members translate in the object's sorted iteration
//! order. Values are interpolated verbatim; the catalog schema is trusted
//! and the database user is expected to be read-only.

use serde_json::{Map, Value};

/// The backing catalog table.
pub const CATALOG_TABLE: &str = "cmip5";
/// Reserved JSON key selecting autocompletion.
pub const AUTOCOMPLETE_KEY: &str = "?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedQuery {
    pub sql: String,
    pub autocomplete: bool,
}

/// Render a parsed query as a SQL SELECT over the catalog table. An empty
/// object forces the empty result set via `limit 0`.
pub fn json_to_sql(query: &Map<String, Value>) -> TranslatedQuery {
    let mut sql = format!("SELECT name FROM {CATALOG_TABLE}");
    let mut autocomplete = false;

    for (index, (key, value)) in query.iter().enumerate() {
        sql.push_str(if index == 0 { " WHERE" } else { " AND" });
        let text = value_text(value);
        if key == AUTOCOMPLETE_KEY {
            sql.push_str(&format!(" name REGEXP '^{text}'"));
            autocomplete = true;
        } else {
            sql.push_str(&format!(" {key}='{text}'"));
        }
    }

    if query.is_empty() {
        sql.push_str(" limit 0");
    }
    sql.push(';');

    TranslatedQuery { sql, autocomplete }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Map<String, Value> {
        match serde_json::from_str(raw).unwrap() {
            Value::Object(members) => members,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_single_predicate() {
        let translated = json_to_sql(&parse(r#"{"activity":"CMIP"}"#));
        assert_eq!(translated.sql, "SELECT name FROM cmip5 WHERE activity='CMIP';");
        assert!(!translated.autocomplete);
    }

    #[test]
    fn test_predicates_join_with_and_in_sorted_order() {
        let translated = json_to_sql(&parse(r#"{"project":"IPCC","activity":"CMIP"}"#));
        assert_eq!(
            translated.sql,
            "SELECT name FROM cmip5 WHERE activity='CMIP' AND project='IPCC';"
        );
    }

    #[test]
    fn test_autocomplete_becomes_regexp() {
        let translated = json_to_sql(&parse(r#"{"?":"ap"}"#));
        assert_eq!(
            translated.sql,
            "SELECT name FROM cmip5 WHERE name REGEXP '^ap';"
        );
        assert!(translated.autocomplete);
    }

    #[test]
    fn test_autocomplete_mixes_with_predicates() {
        let translated = json_to_sql(&parse(r#"{"activity":"CMIP","?":"ap"}"#));
        assert_eq!(
            translated.sql,
            "SELECT name FROM cmip5 WHERE name REGEXP '^ap' AND activity='CMIP';"
        );
        assert!(translated.autocomplete);
    }

    #[test]
    fn test_empty_object_selects_nothing() {
        let translated = json_to_sql(&parse("{}"));
        assert_eq!(translated.sql, "SELECT name FROM cmip5 limit 0;");
        assert!(!translated.autocomplete);
    }

    #[test]
    fn test_non_string_value_uses_json_text() {
        let translated = json_to_sql(&parse(r#"{"run":42}"#));
        assert_eq!(translated.sql, "SELECT name FROM cmip5 WHERE run='42';");
    }
}
